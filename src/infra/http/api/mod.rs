pub mod error;
pub mod handlers;
pub mod models;
pub mod state;

pub use state::ApiState;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};

use crate::infra::http::middleware::{log_responses, set_request_context};

pub fn build_api_router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/books",
            get(handlers::list_books).post(handlers::create_book),
        )
        .route(
            "/books/{id}",
            get(handlers::get_book)
                .put(handlers::update_book)
                .delete(handlers::delete_book),
        )
        .route("/books/{id}/rate", post(handlers::rate_book))
        .route("/books/{id}/favorite", post(handlers::toggle_favorite))
        .route("/books/{id}/cart", post(handlers::toggle_cart))
        .route("/users/{user_id}/cart", get(handlers::user_cart))
        .route(
            "/recommendations/weekly",
            get(handlers::weekly_recommendations),
        )
        .route(
            "/recommendations/refresh",
            post(handlers::refresh_recommendations),
        )
        .with_state(state)
        .layer(axum_middleware::from_fn(log_responses))
        .layer(axum_middleware::from_fn(set_request_context))
}
