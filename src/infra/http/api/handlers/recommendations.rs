//! Weekly recommendations handlers

use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;

use super::recommendation_to_api;
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::models::{refresh_response, weekly_response};
use crate::infra::http::api::state::ApiState;

pub async fn weekly_recommendations(
    State(state): State<ApiState>,
) -> Result<impl IntoResponse, ApiError> {
    let weekly = state
        .recommendations
        .weekly()
        .await
        .map_err(recommendation_to_api)?;
    Ok(Json(weekly_response(weekly)))
}

/// Trigger the guarded refresh on demand. A second call on the same day is skipped.
pub async fn refresh_recommendations(
    State(state): State<ApiState>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = state
        .recommendations
        .refresh()
        .await
        .map_err(recommendation_to_api)?;
    Ok(Json(refresh_response(outcome)))
}
