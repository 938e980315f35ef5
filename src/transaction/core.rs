//! Defines the core data model for transactions.

use std::{fmt::Display, str::FromStr};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::{PrimitiveDateTime, format_description::BorrowedFormatItem, macros::format_description};

use crate::{Error, auth::UserID};

/// Alias for the integer type used for transaction IDs.
pub type TransactionId = i64;

/// The currency recorded for a transaction when the client does not specify one.
pub const DEFAULT_CURRENCY: &str = "CAD";

/// The most decimal places an amount may have.
pub const MAX_AMOUNT_SCALE: u32 = 4;

/// The largest amount, in whole currency units, that may be recorded.
pub const MAX_AMOUNT_UNITS: i64 = 1_000_000_000_000;

/// Check that `amount` can be recorded as a transaction.
///
/// Bounding the size and precision of each amount keeps monthly sums and
/// percentages well inside the range of [Decimal].
///
/// # Errors
/// Returns [Error::NegativeAmount] if `amount` is below zero, or
/// [Error::InvalidAmount] if it has more than [MAX_AMOUNT_SCALE] decimal
/// places or exceeds [MAX_AMOUNT_UNITS].
pub fn validate_amount(amount: Decimal) -> Result<Decimal, Error> {
    if amount < Decimal::ZERO {
        return Err(Error::NegativeAmount(amount));
    }

    let too_precise = amount.normalize().scale() > MAX_AMOUNT_SCALE;
    if too_precise || amount > Decimal::from(MAX_AMOUNT_UNITS) {
        return Err(Error::InvalidAmount(amount));
    }

    Ok(amount)
}

/// Whether money was spent or earned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionType {
    /// Money was spent.
    Expense,
    /// Money was earned.
    Income,
}

impl TransactionType {
    /// The upper case name used in the database and in JSON.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Expense => "EXPENSE",
            TransactionType::Income => "INCOME",
        }
    }
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "EXPENSE" => Ok(TransactionType::Expense),
            "INCOME" => Ok(TransactionType::Income),
            other => Err(Error::InvalidTransactionType(other.to_owned())),
        }
    }
}

/// An expense or income, i.e. an event where money was either spent or earned.
///
/// Transactions are never modified once stored. To create a new
/// `Transaction`, use [Transaction::build].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The user that recorded the transaction.
    pub user_id: UserID,
    /// The amount of money spent or earned, never negative.
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub amount: Decimal,
    /// Whether the amount was spent or earned.
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    /// A free-text label such as "Groceries" or "Rent".
    pub category: String,
    /// The three-letter currency code of `amount`.
    pub currency: String,
    /// When the transaction happened, in the user's local time.
    #[serde(with = "date_time_format")]
    pub date: PrimitiveDateTime,
    /// An optional note from the user.
    pub note: Option<String>,
}

impl Transaction {
    /// Start building a new transaction.
    ///
    /// Shortcut for [TransactionBuilder] for discoverability.
    pub fn build(
        user_id: UserID,
        amount: Decimal,
        transaction_type: TransactionType,
        category: &str,
        date: PrimitiveDateTime,
    ) -> TransactionBuilder {
        TransactionBuilder {
            user_id,
            amount,
            transaction_type,
            category: category.to_owned(),
            currency: DEFAULT_CURRENCY.to_owned(),
            date,
            note: None,
        }
    }
}

/// A builder for creating [Transaction] instances.
///
/// Pass the builder to [TransactionStore::create](crate::TransactionStore::create)
/// to store the transaction and get it back with its ID.
#[derive(Debug, PartialEq, Clone)]
pub struct TransactionBuilder {
    /// The user that owns the transaction.
    pub user_id: UserID,
    /// The amount of money spent or earned.
    pub amount: Decimal,
    /// Whether the amount was spent or earned.
    pub transaction_type: TransactionType,
    /// The category label, e.g. "Groceries", "Transport", "Rent".
    pub category: String,
    /// The three-letter currency code. Defaults to [DEFAULT_CURRENCY].
    pub currency: String,
    /// When the transaction happened.
    pub date: PrimitiveDateTime,
    /// An optional note.
    pub note: Option<String>,
}

impl TransactionBuilder {
    /// Set the currency code for the transaction.
    pub fn currency(mut self, currency: &str) -> Self {
        self.currency = currency.to_owned();
        self
    }

    /// Set the note for the transaction.
    pub fn note(mut self, note: Option<&str>) -> Self {
        self.note = note.map(str::to_owned);
        self
    }

    /// Create the transaction with the ID `id`.
    pub fn finalise(self, id: TransactionId) -> Transaction {
        Transaction {
            id,
            user_id: self.user_id,
            amount: self.amount,
            transaction_type: self.transaction_type,
            category: self.category,
            currency: self.currency,
            date: self.date,
            note: self.note,
        }
    }
}

/// Date-time format used to store transaction dates, e.g. "2024-03-05 13:45:00".
///
/// Dates in this format sort lexicographically in chronological order, which
/// lets the database filter date ranges with plain text comparisons.
pub(crate) const STORAGE_FORMAT: &[BorrowedFormatItem] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

pub(crate) mod date_time_format {
    //! Serializes transaction dates as ISO 8601 local date-times without
    //! subseconds, e.g. "2024-03-05T13:45:00".
    //!
    //! Deserialization also accepts a bare date, e.g. "2024-03-05", which is
    //! read as midnight on that day.
    use serde::{Deserialize, Deserializer, Serializer};
    use time::{
        Date, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset,
        format_description::{BorrowedFormatItem, well_known::Rfc3339},
        macros::format_description,
    };

    const DATE_TIME_FORMAT: &[BorrowedFormatItem] =
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");
    const DATE_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");

    pub fn parse(text: &str) -> Result<PrimitiveDateTime, time::error::Parse> {
        PrimitiveDateTime::parse(text, DATE_TIME_FORMAT).or_else(|error| {
            Date::parse(text, DATE_FORMAT)
                .map(|date| PrimitiveDateTime::new(date, Time::MIDNIGHT))
                .map_err(|_| error)
        })
    }

    /// Parse a date-time sent by a client as a local date-time.
    ///
    /// Besides the forms [parse] accepts, RFC 3339 instants such as
    /// "2024-03-05T12:00:00.000Z" or "2024-03-05T08:00:00-04:00" are
    /// converted to `local_offset` and truncated to whole seconds.
    pub fn parse_local(text: &str, local_offset: UtcOffset) -> Option<PrimitiveDateTime> {
        match OffsetDateTime::parse(text, &Rfc3339) {
            Ok(instant) => {
                let local = instant.checked_to_offset(local_offset)?;
                let time = local.time().replace_nanosecond(0).ok()?;

                Some(PrimitiveDateTime::new(local.date(), time))
            }
            Err(_) => parse(text).ok(),
        }
    }

    pub fn serialize<S>(dt: &PrimitiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let formatted = dt
            .format(DATE_TIME_FORMAT)
            .map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&formatted)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<PrimitiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse(&s).map_err(serde::de::Error::custom)
    }
}
