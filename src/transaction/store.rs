//! Defines the transaction store trait and a SQLite backed implementation.

use std::{
    ops::RangeInclusive,
    str::FromStr,
    sync::{Arc, Mutex, MutexGuard},
};

use rusqlite::{Connection, Row, types::Type};
use rust_decimal::Decimal;
use time::PrimitiveDateTime;

use crate::{
    Error,
    auth::UserID,
    transaction::core::{STORAGE_FORMAT, Transaction, TransactionBuilder, TransactionType},
};

/// Handles the creation and retrieval of transactions.
///
/// Every query is scoped to a single user so that one user's statistics can
/// never include another user's transactions.
pub trait TransactionStore: Clone + Send + Sync {
    /// Create a new transaction in the store.
    fn create(&self, builder: TransactionBuilder) -> Result<Transaction, Error>;

    /// Retrieve all of a user's transactions, most recent first.
    fn find_by_user(&self, user_id: UserID) -> Result<Vec<Transaction>, Error>;

    /// Retrieve a user's transactions whose date falls within `date_range` (inclusive).
    ///
    /// The transactions are returned in no particular order.
    fn find_by_user_and_date_range(
        &self,
        user_id: UserID,
        date_range: RangeInclusive<PrimitiveDateTime>,
    ) -> Result<Vec<Transaction>, Error>;
}

/// Create the transaction table.
///
/// # Errors
/// Returns an error if the table or its index could not be created.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL,
                amount TEXT NOT NULL,
                type TEXT NOT NULL CHECK (type IN ('EXPENSE', 'INCOME')),
                category TEXT NOT NULL,
                currency TEXT NOT NULL,
                date TEXT NOT NULL,
                note TEXT
                )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_user_date ON \"transaction\"(user_id, date)",
        (),
    )?;

    Ok(())
}

/// Stores transactions in a SQLite database.
///
/// Amounts are stored as decimal text so they round-trip exactly.
#[derive(Debug, Clone)]
pub struct SQLiteTransactionStore {
    connection: Arc<Mutex<Connection>>,
}

impl SQLiteTransactionStore {
    /// Create a new store for the SQLite `connection`.
    ///
    /// The transaction table must already exist, see [crate::initialize_db].
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, Error> {
        self.connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)
    }
}

const SELECT_COLUMNS: &str =
    "SELECT id, user_id, amount, type, category, currency, date, note FROM \"transaction\"";

impl TransactionStore for SQLiteTransactionStore {
    /// Create a new transaction in the database.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::InvalidDateFormat] if the date cannot be formatted for storage,
    /// - [Error::DatabaseLockError] if the database lock is poisoned,
    /// - or [Error::SqlError] if there is some other SQL error.
    fn create(&self, builder: TransactionBuilder) -> Result<Transaction, Error> {
        let date = format_date(builder.date)?;
        let connection = self.lock()?;

        let transaction = connection
            .prepare(
                "INSERT INTO \"transaction\" (user_id, amount, type, category, currency, date, note)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 RETURNING id, user_id, amount, type, category, currency, date, note",
            )?
            .query_row(
                (
                    builder.user_id.as_i64(),
                    builder.amount.to_string(),
                    builder.transaction_type.as_str(),
                    builder.category,
                    builder.currency,
                    date,
                    builder.note,
                ),
                map_transaction_row,
            )?;

        Ok(transaction)
    }

    /// Retrieve all of a user's transactions, most recent first.
    ///
    /// # Errors
    /// This function will return a [Error::SqlError] if there is a SQL error.
    fn find_by_user(&self, user_id: UserID) -> Result<Vec<Transaction>, Error> {
        let connection = self.lock()?;

        connection
            .prepare(&format!(
                "{SELECT_COLUMNS} WHERE user_id = ?1 ORDER BY date DESC, id DESC"
            ))?
            .query_map((user_id.as_i64(),), map_transaction_row)?
            .collect::<Result<Vec<Transaction>, rusqlite::Error>>()
            .map_err(|error| error.into())
    }

    /// Retrieve a user's transactions within `date_range` (inclusive).
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::InvalidDateFormat] if the range cannot be formatted for the query,
    /// - or [Error::SqlError] if there is a SQL error.
    fn find_by_user_and_date_range(
        &self,
        user_id: UserID,
        date_range: RangeInclusive<PrimitiveDateTime>,
    ) -> Result<Vec<Transaction>, Error> {
        let start = format_date(*date_range.start())?;
        let end = format_date(*date_range.end())?;
        let connection = self.lock()?;

        connection
            .prepare(&format!(
                "{SELECT_COLUMNS} WHERE user_id = ?1 AND date BETWEEN ?2 AND ?3"
            ))?
            .query_map((user_id.as_i64(), start, end), map_transaction_row)?
            .collect::<Result<Vec<Transaction>, rusqlite::Error>>()
            .map_err(|error| error.into())
    }
}

fn format_date(date: PrimitiveDateTime) -> Result<String, Error> {
    date.format(STORAGE_FORMAT)
        .map_err(|error| Error::InvalidDateFormat(format!("{date}: {error}")))
}

/// Map a database row to a [Transaction].
///
/// The row must contain the columns in the order of [SELECT_COLUMNS].
fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let raw_amount: String = row.get(2)?;
    let amount = Decimal::from_str(&raw_amount)
        .map_err(|error| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(error)))?;

    let raw_type: String = row.get(3)?;
    let transaction_type = TransactionType::from_str(&raw_type)
        .map_err(|error| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(error)))?;

    let raw_date: String = row.get(6)?;
    let date = PrimitiveDateTime::parse(&raw_date, STORAGE_FORMAT)
        .map_err(|error| rusqlite::Error::FromSqlConversionFailure(6, Type::Text, Box::new(error)))?;

    Ok(Transaction {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        amount,
        transaction_type,
        category: row.get(4)?,
        currency: row.get(5)?,
        date,
        note: row.get(7)?,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use rusqlite::Connection;
    use rust_decimal_macros::dec;
    use time::macros::datetime;

    use crate::{
        UserID,
        db::initialize,
        transaction::{
            core::{Transaction, TransactionType},
            store::{SQLiteTransactionStore, TransactionStore},
        },
    };

    fn get_store() -> SQLiteTransactionStore {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        SQLiteTransactionStore::new(Arc::new(Mutex::new(connection)))
    }

    #[test]
    fn create_returns_stored_transaction() {
        let store = get_store();
        let builder = Transaction::build(
            UserID::new(1),
            dec!(1200.00),
            TransactionType::Expense,
            "Rent",
            datetime!(2024-03-01 09:00:00),
        )
        .note(Some("March"));

        let transaction = store.create(builder.clone()).unwrap();

        assert_eq!(transaction, builder.finalise(transaction.id));
    }

    #[test]
    fn amounts_round_trip_exactly() {
        let store = get_store();
        let user_id = UserID::new(1);
        let amount = dec!(0.10);
        store
            .create(Transaction::build(
                user_id,
                amount,
                TransactionType::Expense,
                "Snacks",
                datetime!(2024-03-05 12:00:00),
            ))
            .unwrap();

        let transactions = store.find_by_user(user_id).unwrap();

        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0].amount, amount);
        assert_eq!(transactions[0].amount.to_string(), "0.10");
    }

    #[test]
    fn find_by_user_returns_newest_first() {
        let store = get_store();
        let user_id = UserID::new(1);
        for (category, date) in [
            ("Older", datetime!(2024-02-01 00:00:00)),
            ("Newest", datetime!(2024-03-20 00:00:00)),
            ("Middle", datetime!(2024-03-01 00:00:00)),
        ] {
            store
                .create(Transaction::build(
                    user_id,
                    dec!(1),
                    TransactionType::Expense,
                    category,
                    date,
                ))
                .unwrap();
        }

        let categories: Vec<String> = store
            .find_by_user(user_id)
            .unwrap()
            .into_iter()
            .map(|transaction| transaction.category)
            .collect();

        assert_eq!(categories, vec!["Newest", "Middle", "Older"]);
    }

    #[test]
    fn find_by_user_and_date_range_is_inclusive() {
        let store = get_store();
        let user_id = UserID::new(1);
        for date in [
            datetime!(2024-02-29 23:59:59),
            datetime!(2024-03-01 00:00:00),
            datetime!(2024-03-31 23:59:59),
            datetime!(2024-04-01 00:00:00),
        ] {
            store
                .create(Transaction::build(
                    user_id,
                    dec!(1),
                    TransactionType::Expense,
                    "Food",
                    date,
                ))
                .unwrap();
        }

        let transactions = store
            .find_by_user_and_date_range(
                user_id,
                datetime!(2024-03-01 00:00:00)..=datetime!(2024-03-31 23:59:59),
            )
            .unwrap();

        let mut dates: Vec<_> = transactions.iter().map(|t| t.date).collect();
        dates.sort();
        assert_eq!(
            dates,
            vec![
                datetime!(2024-03-01 00:00:00),
                datetime!(2024-03-31 23:59:59)
            ]
        );
    }

    #[test]
    fn find_by_user_and_date_range_excludes_other_users() {
        let store = get_store();
        let date = datetime!(2024-03-05 00:00:00);
        store
            .create(Transaction::build(
                UserID::new(1),
                dec!(50),
                TransactionType::Expense,
                "Mine",
                date,
            ))
            .unwrap();
        store
            .create(Transaction::build(
                UserID::new(2),
                dec!(75),
                TransactionType::Expense,
                "Theirs",
                date,
            ))
            .unwrap();

        let transactions = store
            .find_by_user_and_date_range(
                UserID::new(1),
                datetime!(2024-03-01 00:00:00)..=datetime!(2024-03-31 23:59:59),
            )
            .unwrap();

        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0].category, "Mine");
    }

    #[test]
    fn empty_store_returns_no_transactions() {
        let store = get_store();

        let transactions = store.find_by_user(UserID::new(1)).unwrap();

        assert!(transactions.is_empty());
    }

    /// Records a transaction from another thread using only the
    /// [TransactionStore] bound.
    fn create_on_another_thread<T>(store: &T, user_id: UserID) -> Transaction
    where
        T: TransactionStore + 'static,
    {
        let store = store.clone();

        std::thread::spawn(move || {
            store
                .create(Transaction::build(
                    user_id,
                    dec!(4.50),
                    TransactionType::Expense,
                    "Coffee",
                    datetime!(2024-03-02 08:00:00),
                ))
                .unwrap()
        })
        .join()
        .unwrap()
    }

    #[test]
    fn store_clones_share_transactions_across_threads() {
        let store = get_store();
        let user_id = UserID::new(3);

        let created = create_on_another_thread(&store, user_id);

        assert_eq!(store.find_by_user(user_id).unwrap(), vec![created]);
    }
}
