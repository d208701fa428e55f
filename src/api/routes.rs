use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use super::handlers;
use super::AppState;
use crate::middleware::{make_span_with_request_id, request_id_middleware};

/// Creates the main API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        // Books
        .route("/book/list", get(handlers::list_books))
        .route("/book", get(handlers::filter_books))
        // Reviews
        .route("/review/add", post(handlers::add_review))
        .route("/review/update", post(handlers::update_review))
        .route("/review/delete", post(handlers::delete_review))
        // Suggestions
        .route("/suggest", get(handlers::suggest_books))
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id)),
        )
        .with_state(state)
}
