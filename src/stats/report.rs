//! Loads the transactions a statistic needs from the store and aggregates them.

use time::PrimitiveDateTime;

use crate::{
    Error,
    auth::UserID,
    stats::{
        aggregation::{
            CategoryComparison, MonthlySummary, TotalComparison, compare_categories,
            compare_totals, summarize_month,
        },
        period::Period,
    },
    transaction::TransactionStore,
};

fn aggregation_unavailable(error: Error) -> Error {
    tracing::error!("Could not load transactions for aggregation: {error}");
    Error::AggregationUnavailable(error.to_string())
}

/// Summarise `user_id`'s transactions in `period`.
///
/// # Errors
/// Returns [Error::AggregationUnavailable] if the transactions could not be
/// read, or [Error::AmountOverflow] if their totals do not fit in a decimal.
pub fn monthly_summary<T>(
    store: &T,
    user_id: UserID,
    period: Period,
    currency: &str,
) -> Result<MonthlySummary, Error>
where
    T: TransactionStore,
{
    let transactions = store
        .find_by_user_and_date_range(user_id, period.date_time_range())
        .map_err(aggregation_unavailable)?;

    summarize_month(&transactions, user_id, period, currency)
}

/// Compare `user_id`'s expenses per category in `period` and the month before.
///
/// Both months are read with a single query.
///
/// # Errors
/// Returns [Error::AggregationUnavailable] if the transactions could not be
/// read, or [Error::AmountOverflow] if their totals do not fit in a decimal.
pub fn category_comparison<T>(
    store: &T,
    user_id: UserID,
    period: Period,
) -> Result<Vec<CategoryComparison>, Error>
where
    T: TransactionStore,
{
    let start = *period.previous().date_time_range().start();
    let end = *period.date_time_range().end();

    let transactions = store
        .find_by_user_and_date_range(user_id, start..=end)
        .map_err(aggregation_unavailable)?;

    compare_categories(&transactions, user_id, period)
}

/// Compare `user_id`'s expenses this month up to `now` with all of last month.
///
/// # Errors
/// Returns [Error::AggregationUnavailable] if the transactions could not be
/// read, or [Error::AmountOverflow] if their totals do not fit in a decimal.
pub fn total_comparison<T>(
    store: &T,
    user_id: UserID,
    now: PrimitiveDateTime,
    currency: &str,
) -> Result<TotalComparison, Error>
where
    T: TransactionStore,
{
    let start = *Period::containing(now.date())
        .previous()
        .date_time_range()
        .start();

    let transactions = store
        .find_by_user_and_date_range(user_id, start..=now)
        .map_err(aggregation_unavailable)?;

    compare_totals(&transactions, user_id, now, currency)
}
