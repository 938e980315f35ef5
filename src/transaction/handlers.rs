//! Route handlers for listing and recording transactions.

use axum::{
    Json,
    extract::{FromRef, State},
    http::StatusCode,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    auth::Claims,
    timezone::{get_local_now, local_offset},
    transaction::{
        core::{Transaction, TransactionType, date_time_format, validate_amount},
        store::TransactionStore,
    },
};

/// The state needed to list or create transactions.
#[derive(Debug, Clone)]
pub struct TransactionState<T>
where
    T: TransactionStore,
{
    /// The store for managing transactions.
    pub transaction_store: T,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl<T> FromRef<AppState<T>> for TransactionState<T>
where
    T: TransactionStore,
{
    fn from_ref(state: &AppState<T>) -> Self {
        Self {
            transaction_store: state.transaction_store.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// The response body listing a user's transactions.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct TransactionList {
    /// Always "success".
    pub status: String,
    /// The number of transactions in `data`.
    pub count: usize,
    /// The transactions, most recent first.
    pub data: Vec<Transaction>,
}

/// The request body for recording a transaction.
#[derive(Debug, Serialize, Deserialize)]
pub struct NewTransaction {
    /// The amount spent or earned. Must not be negative, have more than
    /// [MAX_AMOUNT_SCALE](crate::MAX_AMOUNT_SCALE) decimal places or exceed
    /// [MAX_AMOUNT_UNITS](crate::MAX_AMOUNT_UNITS).
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub amount: Decimal,
    /// The category label, e.g. "Groceries".
    pub category: String,
    /// Either "EXPENSE" or "INCOME".
    #[serde(rename = "type")]
    pub transaction_type: String,
    /// An optional note.
    #[serde(default)]
    pub note: Option<String>,
    /// The currency code, defaults to [DEFAULT_CURRENCY](crate::DEFAULT_CURRENCY).
    #[serde(default)]
    pub currency: Option<String>,
    /// When the transaction happened, e.g. "2024-03-05", "2024-03-05T13:45:00"
    /// or "2024-03-05T13:45:00.000Z". Instants with an offset are converted to
    /// local time. Defaults to the current local time.
    #[serde(default)]
    pub date: Option<String>,
}

/// A route handler listing all of the caller's transactions, most recent first.
pub async fn get_transactions<T>(
    State(state): State<TransactionState<T>>,
    claims: Claims,
) -> Result<Json<TransactionList>, Error>
where
    T: TransactionStore,
{
    let transactions = state
        .transaction_store
        .find_by_user(claims.user_id)
        .inspect_err(|error| tracing::error!("Could not load transactions: {error}"))?;

    Ok(Json(TransactionList {
        status: "success".to_owned(),
        count: transactions.len(),
        data: transactions,
    }))
}

/// A route handler for recording a transaction for the caller.
///
/// Responds with `201 Created` and the stored transaction.
pub async fn create_transaction<T>(
    State(state): State<TransactionState<T>>,
    claims: Claims,
    Json(new_transaction): Json<NewTransaction>,
) -> Result<(StatusCode, Json<Transaction>), Error>
where
    T: TransactionStore,
{
    let amount = validate_amount(new_transaction.amount)?;
    let transaction_type: TransactionType = new_transaction.transaction_type.parse()?;

    let date = match new_transaction.date.as_deref() {
        Some(text) => {
            let offset = local_offset(&state.local_timezone)?;
            date_time_format::parse_local(text, offset)
                .ok_or_else(|| Error::InvalidDateFormat(text.to_owned()))?
        }
        None => {
            let now = get_local_now(&state.local_timezone)?;
            // Stored dates have a resolution of one second.
            now.replace_nanosecond(0).unwrap_or(now)
        }
    };

    let mut builder = Transaction::build(
        claims.user_id,
        amount,
        transaction_type,
        &new_transaction.category,
        date,
    )
    .note(new_transaction.note.as_deref());

    if let Some(currency) = new_transaction.currency.as_deref() {
        builder = builder.currency(currency);
    }

    let transaction = state.transaction_store.create(builder)?;
    tracing::debug!(
        "Created transaction {} for user {}",
        transaction.id,
        transaction.user_id
    );

    Ok((StatusCode::CREATED, Json(transaction)))
}
