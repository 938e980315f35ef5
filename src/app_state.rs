//! Implements a struct that holds the state of the REST server.

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use rusqlite::Connection;

use crate::{
    Error,
    auth::JwtKeys,
    db::initialize,
    timezone::get_local_offset,
    transaction::{SQLiteTransactionStore, TransactionStore},
};

/// The state of the REST server.
#[derive(Debug, Clone)]
pub struct AppState<T>
where
    T: TransactionStore,
{
    /// The keys for verifying the bearer tokens issued by the user service.
    pub jwt_keys: JwtKeys,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    /// The three-letter currency code reported alongside statistics.
    pub currency: String,
    /// The store for managing user [transactions](crate::Transaction).
    pub transaction_store: T,
}

impl<T> AppState<T>
where
    T: TransactionStore,
{
    /// Create a new [AppState].
    ///
    /// `local_timezone` should be a valid, canonical timezone name, e.g. "Pacific/Auckland".
    pub fn new(jwt_secret: &str, local_timezone: &str, currency: &str, transaction_store: T) -> Self {
        Self {
            jwt_keys: JwtKeys::new(jwt_secret),
            local_timezone: local_timezone.to_owned(),
            currency: currency.to_owned(),
            transaction_store,
        }
    }
}

// this impl tells the `Claims` extractor how to access the keys from our state
impl<T> FromRef<AppState<T>> for JwtKeys
where
    T: TransactionStore,
{
    fn from_ref(state: &AppState<T>) -> Self {
        state.jwt_keys.clone()
    }
}

/// An alias for an [AppState] that uses SQLite for the backend.
pub type SQLAppState = AppState<SQLiteTransactionStore>;

/// Creates an [AppState] instance that uses SQLite for the backend.
///
/// This function will modify the database by adding the tables for the domain
/// models to the database.
///
/// # Errors
/// Returns an error if the database cannot be initialized or if
/// `local_timezone` is not a canonical timezone name.
pub fn create_app_state(
    db_connection: Connection,
    jwt_secret: &str,
    local_timezone: &str,
    currency: &str,
) -> Result<SQLAppState, Error> {
    if get_local_offset(local_timezone).is_none() {
        return Err(Error::InvalidTimezoneError(local_timezone.to_owned()));
    }

    initialize(&db_connection)?;

    let connection = Arc::new(Mutex::new(db_connection));
    let transaction_store = SQLiteTransactionStore::new(connection);

    Ok(AppState::new(
        jwt_secret,
        local_timezone,
        currency,
        transaction_store,
    ))
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use crate::{Error, app_state::create_app_state};

    #[test]
    fn create_app_state_rejects_unknown_timezone() {
        let connection = Connection::open_in_memory().unwrap();

        let result = create_app_state(connection, "secret", "Not/AZone", "CAD");

        assert_eq!(
            result.map(|_| ()),
            Err(Error::InvalidTimezoneError("Not/AZone".to_owned()))
        );
    }

    #[test]
    fn create_app_state_keeps_configuration() {
        let connection = Connection::open_in_memory().unwrap();

        let state = create_app_state(connection, "secret", "Pacific/Auckland", "NZD").unwrap();

        assert_eq!(state.local_timezone, "Pacific/Auckland");
        assert_eq!(state.currency, "NZD");
    }
}
