//! Deciding the signed amount of a transaction from its type.
//!
//! Users always enter positive amounts. The sign stored in the database comes
//! from the transaction type, so these functions are the only place where an
//! amount and a type are combined.

use rusqlite::Connection;
use serde::Deserialize;
use time::OffsetDateTime;

use crate::{
    Error,
    amount::Amount,
    category::CategoryId,
    patch::Patch,
    transaction::{
        NewTransaction, Transaction, TransactionId, TransactionType,
        db::{TransactionChanges, create_transaction, get_transaction, update_transaction_columns},
    },
};

/// Request body for recording a transaction.
#[derive(Debug, Clone, Deserialize)]
pub struct NewTransactionRequest {
    /// "income" or "expense".
    #[serde(rename = "type")]
    pub transaction_type: String,
    /// The amount as entered by the user, e.g. "1,234.50".
    pub amount: String,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    #[serde(default)]
    pub note: String,
}

/// Request body for changing a transaction.
///
/// Fields that are missing from the request are left unchanged. An explicit
/// `null` category makes the transaction uncategorized.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionUpdate {
    #[serde(default, rename = "type")]
    pub transaction_type: Patch<String>,
    #[serde(default)]
    pub amount: Patch<String>,
    #[serde(default)]
    pub category_id: Patch<Option<CategoryId>>,
    #[serde(default)]
    pub note: Patch<String>,
}

/// The largest amount, in cents, that a single transaction may have.
///
/// Keeps the totals over a partition well inside the range of SQLite integers.
pub const MAX_AMOUNT_CENTS: i64 = 100_000_000_000_000;

/// Parse `amount_text` and give it the sign of `transaction_type`.
///
/// # Errors
///
/// Returns [Error::EmptyAmount] or [Error::InvalidAmount] if the text is not
/// an amount, [Error::ZeroAmount] if it rounds to zero cents and
/// [Error::AmountTooLarge] if it is more than [MAX_AMOUNT_CENTS].
pub fn resolve_signed_amount(
    transaction_type: TransactionType,
    amount_text: &str,
) -> Result<Amount, Error> {
    let amount = Amount::parse_unsigned(amount_text)?;

    if amount.is_zero() {
        return Err(Error::ZeroAmount);
    }

    if amount.cents() > MAX_AMOUNT_CENTS {
        return Err(Error::AmountTooLarge);
    }

    Ok(transaction_type.apply_sign(amount))
}

/// Record a new transaction created at `now`.
///
/// # Errors
///
/// Returns:
/// - [Error::InvalidTransactionType] if the type is not "income" or "expense".
/// - [Error::EmptyAmount], [Error::InvalidAmount], [Error::ZeroAmount] or
///   [Error::AmountTooLarge] for a bad amount.
/// - [Error::InvalidCategory] if the category does not exist.
pub fn record_transaction(
    request: NewTransactionRequest,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction_type: TransactionType = request.transaction_type.parse()?;
    let amount = resolve_signed_amount(transaction_type, &request.amount)?;

    create_transaction(
        NewTransaction {
            transaction_type,
            amount,
            category_id: request.category_id,
            note: request.note,
            created_at: now,
        },
        connection,
    )
}

/// Apply `update` to the transaction `id` and return the updated transaction.
///
/// A new amount needs the type in the same request. A new type on its own
/// flips the sign of the stored amount when needed.
///
/// # Errors
///
/// Returns:
/// - [Error::MissingType] if the amount is given without the type.
/// - [Error::InvalidTransactionType] if the type is not "income" or "expense".
/// - [Error::EmptyAmount], [Error::InvalidAmount], [Error::ZeroAmount] or
///   [Error::AmountTooLarge] for a bad amount.
/// - [Error::UpdateMissingTransaction] if the transaction doesn't exist.
/// - [Error::InvalidCategory] if the new category doesn't exist.
pub fn update_transaction(
    id: TransactionId,
    update: TransactionUpdate,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let (transaction_type, amount) = match (update.transaction_type, update.amount) {
        (Patch::Unchanged, Patch::Set(_)) => return Err(Error::MissingType),
        (Patch::Set(type_text), Patch::Set(amount_text)) => {
            let transaction_type: TransactionType = type_text.parse()?;
            let amount = resolve_signed_amount(transaction_type, &amount_text)?;

            (Patch::Set(transaction_type), Patch::Set(amount))
        }
        (Patch::Set(type_text), Patch::Unchanged) => {
            let transaction_type: TransactionType = type_text.parse()?;
            let existing = get_transaction(id, connection).map_err(|error| match error {
                Error::NotFound => Error::UpdateMissingTransaction,
                error => error,
            })?;
            let amount = transaction_type.apply_sign(existing.amount);

            (
                changed(transaction_type, existing.transaction_type),
                changed(amount, existing.amount),
            )
        }
        (Patch::Unchanged, Patch::Unchanged) => (Patch::Unchanged, Patch::Unchanged),
    };

    let changes = TransactionChanges {
        transaction_type,
        amount,
        category_id: update.category_id,
        note: update.note,
    };

    update_transaction_columns(id, &changes, connection)?;

    get_transaction(id, connection)
}

fn changed<T: PartialEq>(new: T, old: T) -> Patch<T> {
    if new == old {
        Patch::Unchanged
    } else {
        Patch::Set(new)
    }
}

#[cfg(test)]
mod record_transaction_tests {
    use rusqlite::Connection;
    use time::macros::datetime;

    use crate::{
        Error,
        amount::Amount,
        partition::initialize_partition,
        transaction::{TransactionType, get_transaction},
    };

    use super::{MAX_AMOUNT_CENTS, NewTransactionRequest, record_transaction};

    fn get_test_db_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        initialize_partition(&connection).expect("Could not create partition tables");
        connection
    }

    fn request(transaction_type: &str, amount: &str) -> NewTransactionRequest {
        NewTransactionRequest {
            transaction_type: transaction_type.to_owned(),
            amount: amount.to_owned(),
            category_id: None,
            note: String::new(),
        }
    }

    #[test]
    fn expense_is_stored_negative() {
        let connection = get_test_db_connection();

        let transaction = record_transaction(
            request("expense", "22.20"),
            datetime!(2025-04-01 12:00 UTC),
            &connection,
        )
        .expect("Could not record transaction");

        assert_eq!(transaction.amount.cents(), -2220);
        assert_eq!(transaction.transaction_type, TransactionType::Expense);
        let stored = get_transaction(transaction.id, &connection).unwrap();
        assert_eq!(stored.amount.cents(), -2220);
    }

    #[test]
    fn income_is_stored_positive_even_with_minus_sign() {
        let connection = get_test_db_connection();

        let transaction = record_transaction(
            request("income", "-1,500.005"),
            datetime!(2025-04-01 12:00 UTC),
            &connection,
        )
        .unwrap();

        assert_eq!(transaction.amount.cents(), 150001);
    }

    #[test]
    fn rejects_unknown_type() {
        let connection = get_test_db_connection();

        let result = record_transaction(
            request("refund", "10"),
            datetime!(2025-04-01 12:00 UTC),
            &connection,
        );

        assert_eq!(
            result,
            Err(Error::InvalidTransactionType("refund".to_owned()))
        );
    }

    #[test]
    fn rejects_bad_amounts() {
        let connection = get_test_db_connection();
        let now = datetime!(2025-04-01 12:00 UTC);

        let cases = [
            ("", Error::EmptyAmount),
            ("abc", Error::InvalidAmount),
            ("12.34.56", Error::InvalidAmount),
            ("0.00", Error::ZeroAmount),
            ("0.004", Error::ZeroAmount),
            ("1000000000000.01", Error::AmountTooLarge),
            ("92233720368547758.07", Error::AmountTooLarge),
        ];

        for (amount, want) in cases {
            let result = record_transaction(request("expense", amount), now, &connection);

            assert_eq!(result, Err(want), "recording {amount:?}");
        }
    }

    #[test]
    fn accepts_largest_amount() {
        let connection = get_test_db_connection();

        let transaction = record_transaction(
            request("income", "1,000,000,000,000.00"),
            datetime!(2025-04-01 12:00 UTC),
            &connection,
        )
        .unwrap();

        assert_eq!(transaction.amount, Amount::from_cents(MAX_AMOUNT_CENTS));
    }

    #[test]
    fn rejects_unknown_category() {
        let connection = get_test_db_connection();

        let result = record_transaction(
            NewTransactionRequest {
                category_id: Some(5),
                ..request("expense", "10")
            },
            datetime!(2025-04-01 12:00 UTC),
            &connection,
        );

        assert_eq!(result, Err(Error::InvalidCategory));
    }
}
