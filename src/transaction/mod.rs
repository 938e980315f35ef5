//! Transactions and their storage.
//!
//! This module contains:
//! - The `Transaction` model and `TransactionBuilder` for creating transactions
//! - The `TransactionStore` trait and its SQLite implementation
//! - Route handlers for listing and recording transactions

mod core;
mod handlers;
mod store;
#[cfg(test)]
pub(crate) mod test_utils;

pub use core::{
    DEFAULT_CURRENCY, MAX_AMOUNT_SCALE, MAX_AMOUNT_UNITS, Transaction, TransactionBuilder,
    TransactionId, TransactionType, validate_amount,
};
pub use handlers::{NewTransaction, TransactionList, create_transaction, get_transactions};
pub use store::{SQLiteTransactionStore, TransactionStore, create_transaction_table};
