//! The API endpoint URIs.
//!
//! Some endpoints take a parameter, e.g. '/api/categories/{category_id}'.

/// The route for registering a new user.
pub const REGISTER: &str = "/api/register";
/// The route for logging in a user.
pub const LOG_IN: &str = "/api/log_in";
/// The route for the client to log out the current user.
pub const LOG_OUT: &str = "/api/log_out";

/// The route to list and create categories.
pub const CATEGORIES: &str = "/api/categories";
/// The route to rename and delete a single category.
pub const CATEGORY: &str = "/api/categories/{category_id}";

/// The route to list and record transactions.
pub const TRANSACTIONS: &str = "/api/transactions";
/// The route to get, change and delete a single transaction.
pub const TRANSACTION: &str = "/api/transactions/{transaction_id}";

/// The route for totals over all transactions.
pub const STATS_SUMMARY: &str = "/api/stats/summary";
/// The route for totals over the current day.
pub const STATS_DAILY: &str = "/api/stats/daily";
/// The route for totals over the current week.
pub const STATS_WEEKLY: &str = "/api/stats/weekly";
/// The route for totals over the current month.
pub const STATS_MONTHLY: &str = "/api/stats/monthly";
/// The route for transaction counts and totals per amount range.
pub const STATS_RANGES: &str = "/api/stats/ranges";

/// Replace the first parameter in `endpoint_path` with `id`.
///
/// A parameter is a name wrapped in braces, e.g. '{transaction_id}'.
/// If no parameter is found, `endpoint_path` is returned unchanged.
#[cfg(test)]
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let Some((prefix, rest)) = endpoint_path.split_once('{') else {
        return endpoint_path.to_owned();
    };

    let suffix = rest.split_once('}').map(|(_, suffix)| suffix).unwrap_or("");

    format!("{prefix}{id}{suffix}")
}
