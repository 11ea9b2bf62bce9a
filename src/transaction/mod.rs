//! Transactions: the incomes and expenses recorded in a user's partition.
//!
//! This module contains:
//! - The `Transaction` model and its signed amount rules
//! - Database functions for storing and querying transactions
//! - The service that turns user input into correctly signed amounts
//! - The JSON endpoints

mod core;
mod db;
mod endpoints;
mod service;

pub use core::{NewTransaction, Transaction, TransactionId, TransactionType, TransactionView};
pub use db::create_transaction_table;
pub use endpoints::{
    create_transaction_endpoint, delete_transaction_endpoint, get_transaction_endpoint,
    list_transactions_endpoint, update_transaction_endpoint,
};

#[cfg(test)]
pub use db::{create_transaction, get_transaction};
