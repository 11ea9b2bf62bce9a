//! Core transaction domain types.

use std::{fmt::Display, str::FromStr};

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{Error, amount::Amount, category::CategoryId};

/// Database identifier for a transaction.
pub type TransactionId = i64;

/// Whether money came in or went out.
///
/// The type decides the sign of the stored amount: income is never negative
/// and an expense is never positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money received.
    Income,
    /// Money spent.
    Expense,
}

impl TransactionType {
    /// The name used in requests and in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
        }
    }

    /// Give `amount` the sign this type requires, ignoring its current sign.
    pub fn apply_sign(&self, amount: Amount) -> Amount {
        match self {
            TransactionType::Income => amount.abs(),
            TransactionType::Expense => amount.abs().negate(),
        }
    }
}

impl FromStr for TransactionType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(TransactionType::Income),
            "expense" => Ok(TransactionType::Expense),
            other => Err(Error::InvalidTransactionType(other.to_owned())),
        }
    }
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ToSql for TransactionType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TransactionType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error| FromSqlError::Other(Box::new(error)))
    }
}

/// An income or expense recorded in a user's partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transaction {
    pub id: TransactionId,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    /// The signed amount, see [TransactionType::apply_sign].
    pub amount: Amount,
    pub category_id: Option<CategoryId>,
    pub note: String,
    #[serde(with = "time::serde::timestamp")]
    pub created_at: OffsetDateTime,
}

/// The fields needed to insert a transaction.
///
/// The caller is responsible for `amount` having the sign that
/// `transaction_type` requires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransaction {
    pub transaction_type: TransactionType,
    pub amount: Amount,
    pub category_id: Option<CategoryId>,
    pub note: String,
    pub created_at: OffsetDateTime,
}

/// A transaction joined with the name of its category for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionView {
    pub id: TransactionId,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub amount: Amount,
    pub amount_cents: i64,
    pub category_id: Option<CategoryId>,
    /// The category name, or [crate::category::UNCATEGORIZED].
    pub category_name: String,
    pub note: String,
    #[serde(with = "time::serde::timestamp")]
    pub created_at: OffsetDateTime,
}
