//! Route handlers for the monthly statistics.

use axum::{
    Json,
    extract::{FromRef, Query, State},
};

use crate::{
    AppState, Error,
    auth::Claims,
    stats::{
        aggregation::{CategoryComparison, MonthlySummary, TotalComparison},
        period::{Period, PeriodQuery},
        report::{category_comparison, monthly_summary, total_comparison},
    },
    timezone::get_local_now,
    transaction::TransactionStore,
};

/// The state needed to compute statistics.
#[derive(Debug, Clone)]
pub struct StatsState<T>
where
    T: TransactionStore,
{
    /// The store the statistics are computed from.
    pub transaction_store: T,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    /// The currency code reported with the statistics.
    pub currency: String,
}

impl<T> FromRef<AppState<T>> for StatsState<T>
where
    T: TransactionStore,
{
    fn from_ref(state: &AppState<T>) -> Self {
        Self {
            transaction_store: state.transaction_store.clone(),
            local_timezone: state.local_timezone.clone(),
            currency: state.currency.clone(),
        }
    }
}

/// A route handler for the caller's totals and category breakdown for a month.
///
/// The month and year default to the current local month and year.
pub async fn get_monthly_summary<T>(
    State(state): State<StatsState<T>>,
    claims: Claims,
    Query(query): Query<PeriodQuery>,
) -> Result<Json<MonthlySummary>, Error>
where
    T: TransactionStore,
{
    let today = get_local_now(&state.local_timezone)?.date();
    let period = Period::from_query(&query, today);

    monthly_summary(
        &state.transaction_store,
        claims.user_id,
        period,
        &state.currency,
    )
    .map(Json)
}

/// A route handler comparing the caller's spending per category in a month
/// with the month before.
pub async fn get_category_comparison<T>(
    State(state): State<StatsState<T>>,
    claims: Claims,
    Query(query): Query<PeriodQuery>,
) -> Result<Json<Vec<CategoryComparison>>, Error>
where
    T: TransactionStore,
{
    let today = get_local_now(&state.local_timezone)?.date();
    let period = Period::from_query(&query, today);

    category_comparison(&state.transaction_store, claims.user_id, period).map(Json)
}

/// A route handler comparing the caller's spending so far this month with
/// all of last month.
pub async fn get_total_comparison<T>(
    State(state): State<StatsState<T>>,
    claims: Claims,
) -> Result<Json<TotalComparison>, Error>
where
    T: TransactionStore,
{
    let now = get_local_now(&state.local_timezone)?;

    total_comparison(
        &state.transaction_store,
        claims.user_id,
        now,
        &state.currency,
    )
    .map(Json)
}
