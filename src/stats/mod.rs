//! Income and expenditure statistics over a user's transactions.

mod aggregation;
mod endpoints;
mod window;

pub use endpoints::{
    get_amount_ranges_endpoint, get_daily_stats_endpoint, get_monthly_stats_endpoint,
    get_summary_endpoint, get_weekly_stats_endpoint,
};
