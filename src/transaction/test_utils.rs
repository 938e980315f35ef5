//! Stand-in transaction stores for tests that should not touch SQLite.

use std::{
    ops::RangeInclusive,
    sync::{Arc, Mutex},
};

use time::PrimitiveDateTime;

use crate::{
    Error,
    auth::UserID,
    transaction::{Transaction, TransactionBuilder, TransactionStore},
};

/// Keeps transactions in a vector shared between clones.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTransactionStore {
    transactions: Arc<Mutex<Vec<Transaction>>>,
}

impl InMemoryTransactionStore {
    /// Create a store pre-populated with `builders`, assigning IDs in order starting from 1.
    pub fn with_transactions(builders: Vec<TransactionBuilder>) -> Self {
        let store = Self::default();
        for builder in builders {
            store.create(builder).unwrap();
        }
        store
    }
}

impl TransactionStore for InMemoryTransactionStore {
    fn create(&self, builder: TransactionBuilder) -> Result<Transaction, Error> {
        let mut transactions = self.transactions.lock().unwrap();
        let transaction = builder.finalise(transactions.len() as i64 + 1);
        transactions.push(transaction.clone());

        Ok(transaction)
    }

    fn find_by_user(&self, user_id: UserID) -> Result<Vec<Transaction>, Error> {
        let mut transactions: Vec<Transaction> = self
            .transactions
            .lock()
            .unwrap()
            .iter()
            .filter(|transaction| transaction.user_id == user_id)
            .cloned()
            .collect();
        transactions.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));

        Ok(transactions)
    }

    fn find_by_user_and_date_range(
        &self,
        user_id: UserID,
        date_range: RangeInclusive<PrimitiveDateTime>,
    ) -> Result<Vec<Transaction>, Error> {
        Ok(self
            .transactions
            .lock()
            .unwrap()
            .iter()
            .filter(|transaction| {
                transaction.user_id == user_id && date_range.contains(&transaction.date)
            })
            .cloned()
            .collect())
    }
}

/// A store whose reads and writes always fail, as if the database were unavailable.
#[derive(Debug, Clone, Default)]
pub struct FailingTransactionStore;

impl TransactionStore for FailingTransactionStore {
    fn create(&self, _builder: TransactionBuilder) -> Result<Transaction, Error> {
        Err(Error::DatabaseLockError)
    }

    fn find_by_user(&self, _user_id: UserID) -> Result<Vec<Transaction>, Error> {
        Err(Error::DatabaseLockError)
    }

    fn find_by_user_and_date_range(
        &self,
        _user_id: UserID,
        _date_range: RangeInclusive<PrimitiveDateTime>,
    ) -> Result<Vec<Transaction>, Error> {
        Err(Error::DatabaseLockError)
    }
}
