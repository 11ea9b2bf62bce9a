//! JSON endpoints for recording, listing, changing and deleting transactions.

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::Response,
};
use time::OffsetDateTime;

use crate::{
    AppState, Error,
    partition::PartitionStore,
    response::{JsonBody, success},
    transaction::{
        TransactionId,
        db::{delete_transaction, get_transaction, list_transactions},
        service::{NewTransactionRequest, TransactionUpdate, record_transaction, update_transaction},
    },
    user::UserID,
};

/// The state needed by the transaction endpoints.
#[derive(Debug, Clone)]
pub struct TransactionState {
    pub partitions: PartitionStore,
}

impl FromRef<AppState> for TransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            partitions: state.partitions.clone(),
        }
    }
}

/// List the user's transactions with their category names, newest first.
pub async fn list_transactions_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let connection = state.partitions.open(user_id)?;
    let transactions = list_transactions(&connection)?;

    Ok(success(StatusCode::OK, "Transactions retrieved", transactions))
}

/// Record a new income or expense.
pub async fn create_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    JsonBody(request): JsonBody<NewTransactionRequest>,
) -> Result<Response, Error> {
    let connection = state.partitions.open(user_id)?;
    let transaction = record_transaction(request, OffsetDateTime::now_utc(), &connection)?;

    Ok(success(
        StatusCode::CREATED,
        "Transaction recorded",
        transaction,
    ))
}

/// Get a single transaction.
pub async fn get_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    Path(transaction_id): Path<TransactionId>,
) -> Result<Response, Error> {
    let connection = state.partitions.open(user_id)?;
    let transaction = get_transaction(transaction_id, &connection)?;

    Ok(success(StatusCode::OK, "Transaction retrieved", transaction))
}

/// Change some of the fields of a transaction.
pub async fn update_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    Path(transaction_id): Path<TransactionId>,
    JsonBody(update): JsonBody<TransactionUpdate>,
) -> Result<Response, Error> {
    let connection = state.partitions.open(user_id)?;
    let transaction = update_transaction(transaction_id, update, &connection)?;

    Ok(success(StatusCode::OK, "Transaction updated", transaction))
}

/// Delete a transaction.
pub async fn delete_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    Path(transaction_id): Path<TransactionId>,
) -> Result<Response, Error> {
    let connection = state.partitions.open(user_id)?;
    delete_transaction(transaction_id, &connection)?;

    Ok(success(
        StatusCode::OK,
        "Transaction deleted",
        serde_json::json!({ "id": transaction_id }),
    ))
}
