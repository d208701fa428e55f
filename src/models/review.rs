use serde::Serialize;
use sqlx::FromRow;

use super::{BookId, ReviewId, UserId};
use crate::error::{AppError, AppResult};

/// A row from the `reviews` table.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Review {
    pub id: ReviewId,
    pub book_id: BookId,
    pub user_id: UserId,
    pub rating: i32,
}

/// A star rating, always within `Rating::MIN..=Rating::MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Rating(i32);

impl Rating {
    pub const MIN: i32 = 1;
    pub const MAX: i32 = 5;

    pub fn new(value: i64) -> AppResult<Self> {
        if value < i64::from(Self::MIN) || value > i64::from(Self::MAX) {
            return Err(AppError::InvalidInput(
                "Rating should be between 1 and 5".to_string(),
            ));
        }
        // Bounds checked above
        Ok(Self(value as i32))
    }

    pub fn get(self) -> i32 {
        self.0
    }
}
