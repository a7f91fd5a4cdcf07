use crate::handlers;
use crate::state::AppState;
use axum::routing::get;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/generate-quiz/:count", get(handlers::generate_quiz))
        .route("/api/v1/topics", get(handlers::list_topics))
        .route("/api/v1/allocation/:count", get(handlers::preview_allocation))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
