//! JSON endpoints for listing, creating, renaming and deleting categories.

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::Response,
};
use serde_json::json;
use time::OffsetDateTime;

use crate::{
    AppState, Error,
    category::{
        CategoryForm, CategoryId, CategoryName, create_category, delete_category,
        get_all_categories, get_category, update_category,
    },
    partition::PartitionStore,
    response::{JsonBody, success},
    user::UserID,
};

/// The state needed by the category endpoints.
#[derive(Debug, Clone)]
pub struct CategoryState {
    pub partitions: PartitionStore,
}

impl FromRef<AppState> for CategoryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            partitions: state.partitions.clone(),
        }
    }
}

/// List the user's categories, newest first.
pub async fn list_categories_endpoint(
    State(state): State<CategoryState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let connection = state.partitions.open(user_id)?;
    let categories = get_all_categories(&connection)?;

    Ok(success(StatusCode::OK, "Categories retrieved", categories))
}

/// Create a category.
pub async fn create_category_endpoint(
    State(state): State<CategoryState>,
    Extension(user_id): Extension<UserID>,
    JsonBody(form): JsonBody<CategoryForm>,
) -> Result<Response, Error> {
    let name = CategoryName::new(&form.name)?;

    let connection = state.partitions.open(user_id)?;
    let category = create_category(name, OffsetDateTime::now_utc(), &connection)?;

    Ok(success(StatusCode::CREATED, "Category created", category))
}

/// Rename a category.
pub async fn update_category_endpoint(
    State(state): State<CategoryState>,
    Extension(user_id): Extension<UserID>,
    Path(category_id): Path<CategoryId>,
    JsonBody(form): JsonBody<CategoryForm>,
) -> Result<Response, Error> {
    let name = CategoryName::new(&form.name)?;

    let connection = state.partitions.open(user_id)?;
    update_category(category_id, name, &connection)?;
    let category = get_category(category_id, &connection)?;

    Ok(success(StatusCode::OK, "Category updated", category))
}

/// Delete a category. Its transactions become uncategorized.
pub async fn delete_category_endpoint(
    State(state): State<CategoryState>,
    Extension(user_id): Extension<UserID>,
    Path(category_id): Path<CategoryId>,
) -> Result<Response, Error> {
    let connection = state.partitions.open(user_id)?;
    let uncategorized = delete_category(category_id, &connection)?;

    Ok(success(
        StatusCode::OK,
        "Category deleted",
        json!({ "uncategorized_transactions": uncategorized }),
    ))
}
