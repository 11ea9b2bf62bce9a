//! Income and expenditure totals computed in SQL over a user's partition.

use std::ops::Range;

use rusqlite::{Connection, Row};
use serde::Serialize;
use time::OffsetDateTime;

use crate::{Error, amount::Amount};

/// The amount in cents that separates small from large transactions.
pub const LARGE_AMOUNT_THRESHOLD: i64 = 10_000;

/// Income, expenditure and their difference over some set of transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Totals {
    /// The sum of all positive amounts.
    #[serde(rename = "total_income")]
    pub income: Amount,
    /// The sum of all negative amounts, so never positive.
    #[serde(rename = "total_expenditure")]
    pub expenditure: Amount,
    /// `income + expenditure`.
    #[serde(rename = "total_net_income")]
    pub net: Amount,
}

/// A band of transaction amounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AmountBand {
    /// Income of at least [LARGE_AMOUNT_THRESHOLD] cents.
    LargeIncome,
    /// Income below [LARGE_AMOUNT_THRESHOLD] cents.
    SmallIncome,
    /// Expenses below [LARGE_AMOUNT_THRESHOLD] cents.
    SmallExpense,
    /// Expenses of at least [LARGE_AMOUNT_THRESHOLD] cents.
    LargeExpense,
}

impl AmountBand {
    /// The display name for the band.
    pub fn label(self) -> &'static str {
        match self {
            AmountBand::LargeIncome => "Large income (>= 100.00)",
            AmountBand::SmallIncome => "Small income",
            AmountBand::SmallExpense => "Small expense",
            AmountBand::LargeExpense => "Large expense (>= 100.00)",
        }
    }

    fn from_key(key: &str) -> Option<Self> {
        match key {
            "large_income" => Some(AmountBand::LargeIncome),
            "small_income" => Some(AmountBand::SmallIncome),
            "small_expense" => Some(AmountBand::SmallExpense),
            "large_expense" => Some(AmountBand::LargeExpense),
            _ => None,
        }
    }
}

/// The number and sum of the transactions in one [AmountBand].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AmountBandTotal {
    pub band: AmountBand,
    pub label: &'static str,
    pub transaction_count: i64,
    pub total_amount: Amount,
    pub total_amount_cents: i64,
}

/// Totals over every transaction in the partition.
pub fn get_summary(connection: &Connection) -> Result<Totals, Error> {
    connection
        .prepare(
            "SELECT
                COALESCE(SUM(CASE WHEN amount > 0 THEN amount ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN amount < 0 THEN amount ELSE 0 END), 0)
            FROM transactions",
        )?
        .query_row([], map_totals_row)
        .map_err(Error::from)
}

/// Totals over the transactions created within `range`.
///
/// The range is half-open: a transaction created exactly at `range.end` is
/// not counted.
pub fn get_totals_between(
    range: Range<OffsetDateTime>,
    connection: &Connection,
) -> Result<Totals, Error> {
    connection
        .prepare(
            "SELECT
                COALESCE(SUM(CASE WHEN amount > 0 THEN amount ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN amount < 0 THEN amount ELSE 0 END), 0)
            FROM transactions
            WHERE created_at >= ?1 AND created_at < ?2",
        )?
        .query_row(
            (range.start.unix_timestamp(), range.end.unix_timestamp()),
            map_totals_row,
        )
        .map_err(Error::from)
}

/// The count and sum of transactions in each [AmountBand], largest sum first.
///
/// Bands without any transactions are left out.
pub fn get_amount_bands(connection: &Connection) -> Result<Vec<AmountBandTotal>, Error> {
    connection
        .prepare(
            "SELECT band, COUNT(*), SUM(amount)
            FROM (
                SELECT
                    CASE
                        WHEN amount >= ?1 THEN 'large_income'
                        WHEN amount > 0 THEN 'small_income'
                        WHEN amount > -?1 THEN 'small_expense'
                        ELSE 'large_expense'
                    END AS band,
                    amount
                FROM transactions
                WHERE amount != 0
            )
            GROUP BY band
            ORDER BY SUM(amount) DESC",
        )?
        .query_map([LARGE_AMOUNT_THRESHOLD], map_band_row)?
        .map(|maybe_band| maybe_band.map_err(Error::from))
        .collect()
}

fn map_totals_row(row: &Row) -> Result<Totals, rusqlite::Error> {
    let income: i64 = row.get(0)?;
    let expenditure: i64 = row.get(1)?;

    Ok(Totals {
        income: Amount::from_cents(income),
        expenditure: Amount::from_cents(expenditure),
        net: Amount::from_cents(income.saturating_add(expenditure)),
    })
}

fn map_band_row(row: &Row) -> Result<AmountBandTotal, rusqlite::Error> {
    let key: String = row.get(0)?;
    let band = AmountBand::from_key(&key).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            rusqlite::types::Type::Text,
            format!("unknown amount band {key:?}").into(),
        )
    })?;
    let total_amount_cents: i64 = row.get(2)?;

    Ok(AmountBandTotal {
        band,
        label: band.label(),
        transaction_count: row.get(1)?,
        total_amount: Amount::from_cents(total_amount_cents),
        total_amount_cents,
    })
}
