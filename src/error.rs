//! The application error type and how it is rendered for API clients.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The amount text was empty, or only a decimal point, after cleaning.
    #[error("the amount cannot be empty")]
    EmptyAmount,

    /// The amount text contained something other than digits and a single
    /// decimal point, or the number does not fit in 64 bits of cents.
    #[error("the amount is not a valid number")]
    InvalidAmount,

    /// An amount was given in an update without the transaction type, so the
    /// sign of the amount cannot be decided.
    #[error("the transaction type must be given when changing the amount")]
    MissingType,

    /// The amount rounds to zero cents.
    #[error("the amount cannot be zero")]
    ZeroAmount,

    /// The amount is more than a single transaction may hold.
    #[error("the amount cannot be more than 1000000000000.00")]
    AmountTooLarge,

    /// The transaction type was not one of "income" or "expense".
    #[error("\"{0}\" is not a valid transaction type, expected \"income\" or \"expense\"")]
    InvalidTransactionType(String),

    /// No user is registered with the given username.
    #[error("the user does not exist")]
    UserNotFound,

    /// A user with the given username already exists.
    #[error("the username is already taken")]
    UserAlreadyExists,

    /// The username or password was empty.
    #[error("the username and password cannot be empty")]
    EmptyCredentials,

    /// The password did not match the stored password hash.
    #[error("invalid password")]
    InvalidCredentials,

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// The request did not carry a session cookie.
    #[error("you are not logged in")]
    NotLoggedIn,

    /// The session cookie does not refer to a live session.
    #[error("the session is invalid or has expired, please log in again")]
    SessionInvalidOrExpired,

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// Tried to update a transaction that does not exist
    #[error("tried to update a transaction that is not in the database")]
    UpdateMissingTransaction,

    /// Tried to delete a transaction that does not exist
    #[error("tried to delete a transaction that is not in the database")]
    DeleteMissingTransaction,

    /// Tried to update a category that does not exist
    #[error("tried to update a category that is not in the database")]
    UpdateMissingCategory,

    /// Tried to delete a category that does not exist
    #[error("tried to delete a category that is not in the database")]
    DeleteMissingCategory,

    /// The category ID used for a transaction did not match a valid category.
    #[error("the category ID does not refer to a valid category")]
    InvalidCategory,

    /// An empty string was used to create a category name.
    #[error("category name cannot be empty")]
    EmptyCategoryName,

    /// A category with the same name already exists in the user's data.
    #[error("a category with that name already exists")]
    DuplicateCategoryName,

    /// The request body could not be read as the expected JSON document.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The user's data partition does not exist on disk.
    #[error("the data store for user {0} could not be found")]
    PartitionMissing(i64),

    /// A file system operation on a user's data partition failed.
    #[error("partition I/O failed: {0}")]
    PartitionIo(String),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezone(String),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    && desc.ends_with("categories.name") =>
            {
                Error::DuplicateCategoryName
            }
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    && desc.ends_with("users.username") =>
            {
                Error::UserAlreadyExists
            }
            rusqlite::Error::SqliteFailure(sql_error, _)
                if sql_error.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY =>
            {
                Error::InvalidCategory
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::InvalidRequest(rejection.body_text())
    }
}

impl Error {
    /// A stable identifier for the kind of error that clients can match on
    /// or use as a translation key.
    pub fn code(&self) -> &'static str {
        match self {
            Error::EmptyAmount => "empty_amount",
            Error::InvalidAmount => "invalid_amount",
            Error::MissingType => "missing_type",
            Error::ZeroAmount => "zero_amount",
            Error::AmountTooLarge => "amount_too_large",
            Error::InvalidTransactionType(_) => "invalid_transaction_type",
            Error::UserNotFound => "user_not_found",
            Error::UserAlreadyExists => "user_already_exists",
            Error::EmptyCredentials => "empty_credentials",
            Error::InvalidCredentials => "invalid_credentials",
            Error::TooWeak(_) => "weak_password",
            Error::NotLoggedIn => "not_logged_in",
            Error::SessionInvalidOrExpired => "session_invalid_or_expired",
            Error::NotFound
            | Error::UpdateMissingTransaction
            | Error::DeleteMissingTransaction
            | Error::UpdateMissingCategory
            | Error::DeleteMissingCategory => "record_not_found",
            Error::InvalidCategory => "invalid_category",
            Error::EmptyCategoryName => "empty_category_name",
            Error::DuplicateCategoryName => "duplicate_category_name",
            Error::InvalidRequest(_) => "invalid_request",
            Error::PartitionMissing(_)
            | Error::PartitionIo(_)
            | Error::SqlError(_)
            | Error::DatabaseLockError => "storage_failure",
            Error::HashingError(_) | Error::InvalidTimezone(_) => "internal_error",
        }
    }

    /// The HTTP status code that best describes the error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::EmptyAmount
            | Error::InvalidAmount
            | Error::MissingType
            | Error::ZeroAmount
            | Error::AmountTooLarge
            | Error::InvalidTransactionType(_)
            | Error::EmptyCredentials
            | Error::TooWeak(_)
            | Error::InvalidCategory
            | Error::EmptyCategoryName
            | Error::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Error::InvalidCredentials | Error::NotLoggedIn | Error::SessionInvalidOrExpired => {
                StatusCode::UNAUTHORIZED
            }
            Error::UserNotFound
            | Error::NotFound
            | Error::UpdateMissingTransaction
            | Error::DeleteMissingTransaction
            | Error::UpdateMissingCategory
            | Error::DeleteMissingCategory => StatusCode::NOT_FOUND,
            Error::UserAlreadyExists | Error::DuplicateCategoryName => StatusCode::CONFLICT,
            Error::PartitionMissing(_)
            | Error::PartitionIo(_)
            | Error::SqlError(_)
            | Error::DatabaseLockError
            | Error::HashingError(_)
            | Error::InvalidTimezone(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The message shown to the client.
    ///
    /// Technical errors get a generic message so that driver errors and file
    /// paths never leave the server.
    fn public_message(&self) -> String {
        match self {
            Error::PartitionMissing(_)
            | Error::PartitionIo(_)
            | Error::SqlError(_)
            | Error::DatabaseLockError => {
                "Could not access your data, check the server logs for more details.".to_owned()
            }
            Error::HashingError(_) | Error::InvalidTimezone(_) => {
                "An unexpected error occurred, check the server logs for more details.".to_owned()
            }
            error => error.to_string(),
        }
    }
}

/// The JSON body sent for failed requests.
#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    error: &'static str,
    message: String,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!("An unexpected error occurred: {}", self);
        }

        let body = ErrorBody {
            success: false,
            error: self.code(),
            message: self.public_message(),
        };

        (status, Json(body)).into_response()
    }
}
