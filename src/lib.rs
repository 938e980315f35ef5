//! The transactions service of the expense tracker.
//!
//! This library provides a JSON REST API for recording a user's expenses and
//! income, and for summarising them by month and category.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use rust_decimal::Decimal;
use serde_json::json;
use tokio::signal;

mod app_state;
mod auth;
mod db;
mod endpoints;
mod logging;
mod routing;
mod stats;
mod timezone;
mod transaction;

pub use app_state::{AppState, SQLAppState, create_app_state};
pub use auth::{AuthError, Claims, JwtKeys, UserID, issue_token};
pub use db::initialize as initialize_db;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use routing::{build_router, cors_layer};
pub use stats::{
    CategoryBreakdown, CategoryComparison, MAX_YEAR, MIN_YEAR, MonthlySummary, Period,
    PeriodQuery, TotalComparison, category_comparison, compare_categories, compare_totals,
    monthly_summary, summarize_month, total_comparison,
};
pub use transaction::{
    DEFAULT_CURRENCY, MAX_AMOUNT_SCALE, MAX_AMOUNT_UNITS, NewTransaction, SQLiteTransactionStore,
    Transaction, TransactionBuilder, TransactionId, TransactionList, TransactionStore,
    TransactionType, validate_amount,
};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// A month or year outside the supported range was used to create a
    /// [Period].
    #[error("{0} is not a valid month and year")]
    InvalidPeriod(String),

    /// A transaction was submitted with an amount below zero.
    ///
    /// Whether money was spent or earned is recorded by the transaction type,
    /// so amounts are always non-negative.
    #[error("{0} is a negative amount, which is not allowed")]
    NegativeAmount(Decimal),

    /// A transaction amount had more decimal places than a currency needs or
    /// was too large to record.
    #[error("{0} is not a valid amount")]
    InvalidAmount(Decimal),

    /// A sum or percentage of transaction amounts did not fit in a decimal.
    #[error("the amounts are too large to aggregate")]
    AmountOverflow,

    /// A transaction type other than `EXPENSE` or `INCOME` was given.
    #[error("\"{0}\" is not a valid transaction type")]
    InvalidTransactionType(String),

    /// A date or date-time could not be parsed or formatted.
    #[error("invalid date \"{0}\"")]
    InvalidDateFormat(String),

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// The transactions needed to compute a statistic could not be loaded.
    ///
    /// The string holds the underlying store error for logging. Clients
    /// only ever see a generic message.
    #[error("aggregation unavailable: {0}")]
    AggregationUnavailable(String),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Error::InvalidPeriod(_)
            | Error::NegativeAmount(_)
            | Error::InvalidAmount(_)
            | Error::InvalidTransactionType(_)
            | Error::InvalidDateFormat(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            Error::NotFound => (StatusCode::NOT_FOUND, self.to_string()),
            Error::AmountOverflow => {
                tracing::error!("Could not compute statistics: {self}");
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
            Error::AggregationUnavailable(error) => {
                tracing::error!("Could not compute statistics: {error}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "aggregation unavailable".to_owned(),
                )
            }
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "an unexpected error occurred, check the server logs for more details"
                        .to_owned(),
                )
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod error_tests {
    use axum::{http::StatusCode, response::IntoResponse};
    use rust_decimal_macros::dec;

    use crate::Error;

    #[test]
    fn no_rows_maps_to_not_found() {
        let error: Error = rusqlite::Error::QueryReturnedNoRows.into();

        assert_eq!(error, Error::NotFound);
    }

    #[test]
    fn client_errors_are_bad_requests() {
        let errors = [
            Error::InvalidPeriod("13/2024".to_owned()),
            Error::NegativeAmount(dec!(-1)),
            Error::InvalidAmount(dec!(0.00001)),
            Error::InvalidTransactionType("TRANSFER".to_owned()),
            Error::InvalidDateFormat("yesterday".to_owned()),
        ];

        for error in errors {
            assert_eq!(error.into_response().status(), StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn aggregation_unavailable_is_server_error() {
        let response = Error::AggregationUnavailable("disk on fire".to_owned()).into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn amount_overflow_is_server_error() {
        let response = Error::AmountOverflow.into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
