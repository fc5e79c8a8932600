pub mod api;
mod middleware;

pub use api::{ApiState, build_api_router as build_router};
pub use middleware::RequestContext;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::application::books::BookError;
use crate::application::error::ErrorReport;

fn db_health_response(result: Result<(), BookError>) -> Response {
    match result {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            let mut response = StatusCode::SERVICE_UNAVAILABLE.into_response();
            ErrorReport::from_error(
                "infra::http::db_health",
                StatusCode::SERVICE_UNAVAILABLE,
                &err,
            )
            .attach(&mut response);
            response
        }
    }
}
