//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Router, middleware,
    response::{IntoResponse, Response},
    routing::{get, post, put},
};

use crate::{
    AppState, Error,
    auth::{auth_guard, log_in_endpoint, log_out_endpoint, register_user_endpoint},
    category::{
        create_category_endpoint, delete_category_endpoint, list_categories_endpoint,
        update_category_endpoint,
    },
    endpoints,
    logging::logging_middleware,
    stats::{
        get_amount_ranges_endpoint, get_daily_stats_endpoint, get_monthly_stats_endpoint,
        get_summary_endpoint, get_weekly_stats_endpoint,
    },
    transaction::{
        create_transaction_endpoint, delete_transaction_endpoint, get_transaction_endpoint,
        list_transactions_endpoint, update_transaction_endpoint,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::REGISTER, post(register_user_endpoint))
        .route(endpoints::LOG_IN, post(log_in_endpoint))
        .route(endpoints::LOG_OUT, post(log_out_endpoint));

    let protected_routes = Router::new()
        .route(
            endpoints::CATEGORIES,
            get(list_categories_endpoint).post(create_category_endpoint),
        )
        .route(
            endpoints::CATEGORY,
            put(update_category_endpoint).delete(delete_category_endpoint),
        )
        .route(
            endpoints::TRANSACTIONS,
            get(list_transactions_endpoint).post(create_transaction_endpoint),
        )
        .route(
            endpoints::TRANSACTION,
            get(get_transaction_endpoint)
                .put(update_transaction_endpoint)
                .delete(delete_transaction_endpoint),
        )
        .route(endpoints::STATS_SUMMARY, get(get_summary_endpoint))
        .route(endpoints::STATS_DAILY, get(get_daily_stats_endpoint))
        .route(endpoints::STATS_WEEKLY, get(get_weekly_stats_endpoint))
        .route(endpoints::STATS_MONTHLY, get(get_monthly_stats_endpoint))
        .route(endpoints::STATS_RANGES, get(get_amount_ranges_endpoint))
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    protected_routes
        .merge(unprotected_routes)
        .fallback(get_404_not_found)
        .layer(middleware::from_fn(logging_middleware))
        .with_state(state)
}

async fn get_404_not_found() -> Response {
    Error::NotFound.into_response()
}
