//! Monthly statistics over a user's transactions.
//!
//! [aggregation] holds the pure calculations, [report] loads what they need
//! from a [TransactionStore](crate::TransactionStore), and [handlers] exposes
//! them as routes.

mod aggregation;
mod handlers;
mod period;
mod report;

pub use aggregation::{
    CategoryBreakdown, CategoryComparison, MonthlySummary, TotalComparison, compare_categories,
    compare_totals, summarize_month,
};
pub use handlers::{get_category_comparison, get_monthly_summary, get_total_comparison};
pub use period::{MAX_YEAR, MIN_YEAR, Period, PeriodQuery};
pub use report::{category_comparison, monthly_summary, total_comparison};
