//! Database operations for transactions.

use rusqlite::{Connection, Row, ToSql, params_from_iter};

use crate::{
    Error,
    amount::Amount,
    category::{CategoryId, UNCATEGORIZED},
    db::get_timestamp,
    patch::Patch,
    transaction::{NewTransaction, Transaction, TransactionId, TransactionType, TransactionView},
};

/// The columns of a transaction to overwrite in an update.
///
/// The caller must keep the sign of `amount` consistent with the stored or
/// updated `transaction_type`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionChanges {
    pub transaction_type: Patch<TransactionType>,
    pub amount: Patch<Amount>,
    pub category_id: Patch<Option<CategoryId>>,
    pub note: Patch<String>,
}

/// Insert a transaction and return it with its generated ID.
///
/// # Errors
///
/// Returns [Error::InvalidCategory] if the category does not exist.
pub fn create_transaction(
    transaction: NewTransaction,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let created_at = transaction
        .created_at
        .replace_nanosecond(0)
        .unwrap_or(transaction.created_at);

    connection.execute(
        "INSERT INTO transactions (type, amount, category_id, note, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5)",
        (
            transaction.transaction_type,
            transaction.amount.cents(),
            transaction.category_id,
            &transaction.note,
            created_at.unix_timestamp(),
        ),
    )?;

    Ok(Transaction {
        id: connection.last_insert_rowid(),
        transaction_type: transaction.transaction_type,
        amount: transaction.amount,
        category_id: transaction.category_id,
        note: transaction.note,
        created_at,
    })
}

/// Retrieve a single transaction by ID.
pub fn get_transaction(id: TransactionId, connection: &Connection) -> Result<Transaction, Error> {
    connection
        .prepare(
            "SELECT id, type, amount, category_id, note, created_at
            FROM transactions WHERE id = :id",
        )?
        .query_row(&[(":id", &id)], map_transaction_row)
        .map_err(|error| error.into())
}

/// Retrieve all transactions with their category names, newest first.
pub fn list_transactions(connection: &Connection) -> Result<Vec<TransactionView>, Error> {
    connection
        .prepare(
            "SELECT t.id, t.type, t.amount, t.category_id, COALESCE(c.name, ?1), t.note, t.created_at
            FROM transactions t
            LEFT JOIN categories c ON t.category_id = c.id
            ORDER BY t.created_at DESC, t.id DESC",
        )?
        .query_map([UNCATEGORIZED], map_view_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(|error| error.into()))
        .collect()
}

/// Overwrite the columns set in `changes`.
///
/// Nothing is written when `changes` is empty, but the transaction must still
/// exist.
///
/// # Errors
///
/// Returns:
/// - [Error::UpdateMissingTransaction] if the transaction doesn't exist.
/// - [Error::InvalidCategory] if the new category doesn't exist.
pub fn update_transaction_columns(
    id: TransactionId,
    changes: &TransactionChanges,
    connection: &Connection,
) -> Result<(), Error> {
    let cents = match &changes.amount {
        Patch::Set(amount) => Some(amount.cents()),
        Patch::Unchanged => None,
    };

    let mut assignments = Vec::new();
    let mut params: Vec<&dyn ToSql> = Vec::new();

    if let Patch::Set(transaction_type) = &changes.transaction_type {
        assignments.push("type = ?");
        params.push(transaction_type);
    }

    if let Some(cents) = &cents {
        assignments.push("amount = ?");
        params.push(cents);
    }

    if let Patch::Set(category_id) = &changes.category_id {
        assignments.push("category_id = ?");
        params.push(category_id);
    }

    if let Patch::Set(note) = &changes.note {
        assignments.push("note = ?");
        params.push(note);
    }

    if assignments.is_empty() {
        return get_transaction(id, connection)
            .map(|_| ())
            .map_err(|error| match error {
                Error::NotFound => Error::UpdateMissingTransaction,
                error => error,
            });
    }

    params.push(&id);
    let query = format!(
        "UPDATE transactions SET {} WHERE id = ?",
        assignments.join(", ")
    );

    let rows_affected = connection.execute(&query, params_from_iter(params))?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingTransaction);
    }

    Ok(())
}

/// Delete a transaction by ID. Returns an error if the transaction doesn't exist.
pub fn delete_transaction(id: TransactionId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute("DELETE FROM transactions WHERE id = ?1", [id])?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingTransaction);
    }

    Ok(())
}

/// Initialize the transaction table and indexes.
///
/// The check constraint stops a row from ever holding an amount whose sign
/// disagrees with its type.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS transactions (
            id INTEGER PRIMARY KEY,
            type TEXT NOT NULL CHECK (type IN ('income', 'expense')),
            amount INTEGER NOT NULL,
            category_id INTEGER REFERENCES categories(id) ON DELETE SET NULL,
            note TEXT NOT NULL DEFAULT '',
            created_at INTEGER NOT NULL,
            CHECK ((type = 'income' AND amount >= 0) OR (type = 'expense' AND amount <= 0))
        );

        CREATE INDEX IF NOT EXISTS idx_transactions_created_at ON transactions(created_at);",
    )
}

fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    Ok(Transaction {
        id: row.get(0)?,
        transaction_type: row.get(1)?,
        amount: Amount::from_cents(row.get(2)?),
        category_id: row.get(3)?,
        note: row.get(4)?,
        created_at: get_timestamp(row, 5)?,
    })
}

fn map_view_row(row: &Row) -> Result<TransactionView, rusqlite::Error> {
    let cents = row.get(2)?;

    Ok(TransactionView {
        id: row.get(0)?,
        transaction_type: row.get(1)?,
        amount: Amount::from_cents(cents),
        amount_cents: cents,
        category_id: row.get(3)?,
        category_name: row.get(4)?,
        note: row.get(5)?,
        created_at: get_timestamp(row, 6)?,
    })
}
