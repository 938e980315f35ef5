//! Application router configuration.

use axum::{
    Router,
    http::{
        HeaderValue, Method, StatusCode,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    routing::get,
};
use tower_http::cors::{Any, CorsLayer};

use crate::{
    AppState, endpoints,
    stats::{get_category_comparison, get_monthly_summary, get_total_comparison},
    transaction::{TransactionStore, create_transaction, get_transactions},
};

/// Return a router with all the app's routes.
///
/// Every route except [endpoints::HEALTH] requires a bearer token, which is
/// checked by the [Claims](crate::Claims) extractor in each handler.
pub fn build_router<T>(state: AppState<T>) -> Router
where
    T: TransactionStore + 'static,
{
    Router::new()
        .route(
            endpoints::ROOT,
            get(get_transactions::<T>).post(create_transaction::<T>),
        )
        .route(endpoints::STATS_SUMMARY, get(get_monthly_summary::<T>))
        .route(
            endpoints::STATS_CATEGORY_COMPARISON,
            get(get_category_comparison::<T>),
        )
        .route(endpoints::STATS_COMPARISON, get(get_total_comparison::<T>))
        .route(endpoints::HEALTH, get(get_health))
        .with_state(state)
}

/// Build the CORS layer for the API.
///
/// Requests from any origin are allowed unless `allowed_origin` is given.
pub fn cors_layer(allowed_origin: Option<HeaderValue>) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION]);

    match allowed_origin {
        Some(origin) => cors.allow_origin(origin),
        None => cors.allow_origin(Any),
    }
}

async fn get_health() -> StatusCode {
    StatusCode::OK
}
