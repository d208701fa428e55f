use serde::Deserialize;
use serde_json::Value;

use crate::{
    db::LibraryStore,
    error::{AppError, AppResult},
    models::{BookId, Rating, Review, UserId},
};

/// Body of add and update review requests
///
/// Fields are kept as raw JSON so that numeric strings such as `"4"` are
/// accepted and so that each kind of bad input gets its own message.
#[derive(Debug, Default, Deserialize)]
pub struct ReviewPayload {
    #[serde(default)]
    pub book_id: Option<Value>,
    #[serde(default)]
    pub rating: Option<Value>,
}

/// Body of delete review requests
#[derive(Debug, Default, Deserialize)]
pub struct DeleteReviewPayload {
    #[serde(default)]
    pub book_id: Option<Value>,
}

/// A validated add or update request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReviewCommand {
    pub book_id: BookId,
    pub rating: Rating,
}

impl ReviewPayload {
    /// Validates the payload, checking presence, then the rating, then the book id.
    pub fn validate(&self) -> AppResult<ReviewCommand> {
        let (Some(book_id), Some(rating)) = (&self.book_id, &self.rating) else {
            return Err(AppError::InvalidInput("Wrong parameters".to_string()));
        };

        let rating = coerce_integer(rating)
            .ok_or_else(|| AppError::InvalidInput("Rating should be integer".to_string()))?;
        let rating = Rating::new(rating)?;
        let book_id = parse_book_id(book_id)?;

        Ok(ReviewCommand { book_id, rating })
    }
}

/// Reads an integer out of a JSON number or numeric string.
///
/// Integral floats such as `4.0` count as integers; `4.5` does not.
fn coerce_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.fract() == 0.0)
                .filter(|f| *f >= i64::MIN as f64 && *f <= i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

fn parse_book_id(value: &Value) -> AppResult<BookId> {
    let id = coerce_integer(value)
        .ok_or_else(|| AppError::InvalidInput("Wrong book_id".to_string()))?;
    // Ids beyond the column's range cannot reference any book
    i32::try_from(id)
        .map(BookId)
        .map_err(|_| AppError::NotFound("Wrong book_id".to_string()))
}

/// Records a first rating of a book by the caller
pub async fn add_review(
    store: &dyn LibraryStore,
    user_id: UserId,
    payload: &ReviewPayload,
) -> AppResult<Review> {
    let command = payload.validate()?;
    let review = store
        .add_review(user_id, command.book_id, command.rating)
        .await?;

    tracing::info!(
        user_id = %user_id,
        book_id = %command.book_id,
        rating = command.rating.get(),
        "Review added"
    );

    Ok(review)
}

/// Changes the rating of a review the caller already wrote
pub async fn update_review(
    store: &dyn LibraryStore,
    user_id: UserId,
    payload: &ReviewPayload,
) -> AppResult<Review> {
    let command = payload.validate()?;
    let review = store
        .update_review(user_id, command.book_id, command.rating)
        .await?;

    tracing::info!(
        user_id = %user_id,
        book_id = %command.book_id,
        rating = command.rating.get(),
        "Review updated"
    );

    Ok(review)
}

/// Removes the caller's review of a book
///
/// Succeeds whether or not a review existed. A missing or unusable book id
/// simply matches no review.
pub async fn delete_review(
    store: &dyn LibraryStore,
    user_id: UserId,
    payload: &DeleteReviewPayload,
) -> AppResult<u64> {
    let Some(book_id) = payload.book_id.as_ref().and_then(|v| parse_book_id(v).ok()) else {
        tracing::debug!(user_id = %user_id, "Delete request without a usable book_id");
        return Ok(0);
    };

    let removed = store.delete_review(user_id, book_id).await?;

    tracing::info!(user_id = %user_id, book_id = %book_id, removed, "Review deleted");

    Ok(removed)
}
