use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{
    auth::AuthUser,
    error::AppResult,
    models::{Book, RatedBook},
    services::{self, DeleteReviewPayload, ReviewPayload, Suggestion},
};

use super::AppState;

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct GenreQuery {
    pub genre: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BooksResponse {
    pub books: Vec<RatedBook>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    fn new(message: &str) -> Json<Self> {
        Json(Self {
            message: message.to_string(),
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum SuggestResponse {
    Books {
        genre: String,
        average_rating: f64,
        suggested_books: Vec<Book>,
    },
    InsufficientData {
        message: String,
    },
}

impl From<Suggestion> for SuggestResponse {
    fn from(suggestion: Suggestion) -> Self {
        match suggestion {
            Suggestion::Genre {
                genre,
                average_rating,
                books,
            } => SuggestResponse::Books {
                genre,
                average_rating,
                suggested_books: books,
            },
            Suggestion::InsufficientData => SuggestResponse::InsufficientData {
                message: "There is not enough data about you".to_string(),
            },
        }
    }
}

// Handlers

/// Health check endpoint, reporting database reachability
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    match state.store.ping().await {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "healthy" }))),
        Err(e) => {
            tracing::warn!(error = %e, "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "unavailable" })),
            )
        }
    }
}

/// All books with the caller's ratings
pub async fn list_books(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<BooksResponse>> {
    let books = services::books::list_books(state.store.as_ref(), user_id).await?;
    Ok(Json(BooksResponse { books }))
}

/// Books of one genre with the caller's ratings
pub async fn filter_books(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(params): Query<GenreQuery>,
) -> AppResult<Json<BooksResponse>> {
    let books = services::books::filter_books(state.store.as_ref(), user_id, params.genre).await?;
    Ok(Json(BooksResponse { books }))
}

pub async fn add_review(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    payload: Result<Json<ReviewPayload>, JsonRejection>,
) -> AppResult<(StatusCode, Json<MessageResponse>)> {
    let Json(payload) = payload?;
    services::reviews::add_review(state.store.as_ref(), user_id, &payload).await?;
    Ok((
        StatusCode::CREATED,
        MessageResponse::new("Review added successfully"),
    ))
}

pub async fn update_review(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    payload: Result<Json<ReviewPayload>, JsonRejection>,
) -> AppResult<Json<MessageResponse>> {
    let Json(payload) = payload?;
    services::reviews::update_review(state.store.as_ref(), user_id, &payload).await?;
    Ok(MessageResponse::new("Review updated successfully"))
}

/// Deletes the caller's review; an unreadable body deletes nothing
pub async fn delete_review(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    payload: Result<Json<DeleteReviewPayload>, JsonRejection>,
) -> AppResult<Json<MessageResponse>> {
    let payload = payload.map(|Json(p)| p).unwrap_or_default();
    services::reviews::delete_review(state.store.as_ref(), user_id, &payload).await?;
    Ok(MessageResponse::new("Review deleted successfully"))
}

/// Books from the caller's highest rated genre
pub async fn suggest_books(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<SuggestResponse>> {
    let suggestion = services::suggestions::suggest_books(state.store.as_ref(), user_id).await?;
    Ok(Json(suggestion.into()))
}
