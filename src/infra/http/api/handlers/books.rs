//! Book catalog handlers

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use super::book_to_api;
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::models::*;
use crate::infra::http::api::state::ApiState;

pub async fn list_books(State(state): State<ApiState>) -> Result<impl IntoResponse, ApiError> {
    let books = state.books.list_books().await.map_err(book_to_api)?;
    let body: Vec<BookResponse> = books.into_iter().map(book_response).collect();
    Ok(Json(body))
}

pub async fn get_book(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let book = state.books.get_book(id).await.map_err(book_to_api)?;
    Ok(Json(book_response(book)))
}

pub async fn create_book(
    State(state): State<ApiState>,
    Json(payload): Json<BookWriteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let book = state
        .books
        .create_book(payload.into())
        .await
        .map_err(book_to_api)?;
    Ok((StatusCode::CREATED, Json(book_response(book))))
}

pub async fn update_book(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
    Json(payload): Json<BookWriteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let book = state
        .books
        .update_book(id, payload.into())
        .await
        .map_err(book_to_api)?;
    Ok(Json(book_response(book)))
}

pub async fn delete_book(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.books.delete_book(id).await.map_err(book_to_api)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn rate_book(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
    Json(payload): Json<RateBookRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let book = state
        .books
        .rate_book(id, &payload.user_id, payload.rating)
        .await
        .map_err(book_to_api)?;
    Ok(Json(book_response(book)))
}

pub async fn toggle_favorite(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
    Json(payload): Json<UserActionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let book = state
        .books
        .toggle_favorite(id, &payload.user_id)
        .await
        .map_err(book_to_api)?;
    Ok(Json(book_response(book)))
}

pub async fn toggle_cart(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
    Json(payload): Json<UserActionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let book = state
        .books
        .toggle_cart(id, &payload.user_id)
        .await
        .map_err(book_to_api)?;
    Ok(Json(book_response(book)))
}

pub async fn user_cart(
    State(state): State<ApiState>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let books = state
        .books
        .cart_for_user(&user_id)
        .await
        .map_err(book_to_api)?;
    let body: Vec<BookResponse> = books.into_iter().map(book_response).collect();
    Ok(Json(body))
}
