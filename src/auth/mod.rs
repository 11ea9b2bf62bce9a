//! User registration, logging in and out, and the middleware that protects
//! routes behind a valid session.

mod cookie;
mod log_in;
mod middleware;
mod register;

pub use log_in::{log_in_endpoint, log_out_endpoint};
pub use middleware::auth_guard;
pub use register::register_user_endpoint;
