//! JSON endpoints for the income and expenditure statistics.

use axum::{
    Extension,
    extract::{FromRef, State},
    http::StatusCode,
    response::Response,
};
use rusqlite::Connection;
use serde_json::json;
use time::OffsetDateTime;

use crate::{
    AppState, Error,
    partition::PartitionStore,
    response::success,
    stats::{
        aggregation::{Totals, get_amount_bands, get_summary, get_totals_between},
        window::{StatsWindow, window_range},
    },
    timezone::{get_timezone, offset_at},
    user::UserID,
};

/// The state needed by the statistics endpoints.
#[derive(Debug, Clone)]
pub struct StatsState {
    pub partitions: PartitionStore,
    /// The canonical name of the time zone that days, weeks and months are
    /// counted in, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for StatsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            partitions: state.partitions.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// Totals over all of the user's transactions.
pub async fn get_summary_endpoint(
    State(state): State<StatsState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let connection = state.partitions.open(user_id)?;
    let totals = get_summary(&connection)?;

    Ok(success(StatusCode::OK, "Summary retrieved", totals))
}

/// Totals for the current local day.
pub async fn get_daily_stats_endpoint(
    State(state): State<StatsState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    window_response(&state, user_id, StatsWindow::Day, OffsetDateTime::now_utc())
}

/// Totals for the current local week.
pub async fn get_weekly_stats_endpoint(
    State(state): State<StatsState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    window_response(&state, user_id, StatsWindow::Week, OffsetDateTime::now_utc())
}

/// Totals for the current local month.
pub async fn get_monthly_stats_endpoint(
    State(state): State<StatsState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    window_response(&state, user_id, StatsWindow::Month, OffsetDateTime::now_utc())
}

/// The count and sum of transactions per amount band.
pub async fn get_amount_ranges_endpoint(
    State(state): State<StatsState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let connection = state.partitions.open(user_id)?;
    let bands = get_amount_bands(&connection)?;

    Ok(success(
        StatusCode::OK,
        "Amount ranges retrieved",
        json!({ "amount_range_stats": bands }),
    ))
}

/// Totals for the transactions in `window` as seen from `now`.
pub fn get_window_totals(
    window: StatsWindow,
    now: OffsetDateTime,
    local_timezone: &str,
    connection: &Connection,
) -> Result<Totals, Error> {
    let timezone = get_timezone(local_timezone)?;
    let range = window_range(window, now, |at| offset_at(timezone, at));

    get_totals_between(range, connection)
}

fn window_response(
    state: &StatsState,
    user_id: UserID,
    window: StatsWindow,
    now: OffsetDateTime,
) -> Result<Response, Error> {
    let connection = state.partitions.open(user_id)?;
    let totals = get_window_totals(window, now, &state.local_timezone, &connection)?;

    Ok(success(
        StatusCode::OK,
        &format!("{} statistics retrieved", window.label()),
        totals,
    ))
}
