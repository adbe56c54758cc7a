use crate::handlers;
use crate::state::AppState;
use axum::{Router, routing::get};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/:survey/map", get(handlers::get_map))
        .route("/api/:survey/summary", get(handlers::get_summary))
        .route("/api/:survey/compare", get(handlers::get_comparison))
        .route("/api/:survey/dates", get(handlers::get_dates))
        .route("/api/:survey/options/:kind", get(handlers::get_options))
        .route("/query/reduce", get(handlers::reduce_dashboard_query))
        .route("/query/compare/reduce", get(handlers::reduce_comparison_query))
        .with_state(state)
}
