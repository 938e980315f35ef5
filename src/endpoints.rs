//! The API endpoints URIs.

/// The route for listing and recording the caller's transactions.
pub const ROOT: &str = "/";
/// The route for a month's totals and category breakdown.
pub const STATS_SUMMARY: &str = "/stats/summary";
/// The route comparing a month's spending per category with the month before.
pub const STATS_CATEGORY_COMPARISON: &str = "/stats/category-comparison";
/// The route comparing this month's spending so far with last month.
pub const STATS_COMPARISON: &str = "/stats/comparison";
/// The liveness check used by the gateway.
pub const HEALTH: &str = "/health";
