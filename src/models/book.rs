use serde::Serialize;
use sqlx::FromRow;
use std::cmp::Ordering;

use super::BookId;

/// A row from the `books` table.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub author: String,
    pub genre: String,
}

/// A book annotated with the requesting user's rating, if they gave one.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct RatedBook {
    pub id: BookId,
    pub title: String,
    pub author: String,
    pub genre: String,
    pub rating: Option<i32>,
}

/// Aggregate of one user's ratings within a single genre.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct GenreRating {
    pub genre: String,
    pub rating_sum: i64,
    pub review_count: i64,
}

impl GenreRating {
    pub fn average(&self) -> f64 {
        if self.review_count == 0 {
            return 0.0;
        }
        self.rating_sum as f64 / self.review_count as f64
    }

    /// Orders genres from most to least preferred.
    ///
    /// Averages are compared as exact fractions; equal averages fall back to
    /// the genre name in ascending order.
    pub fn preference_order(&self, other: &Self) -> Ordering {
        let lhs = i128::from(self.rating_sum) * i128::from(other.review_count);
        let rhs = i128::from(other.rating_sum) * i128::from(self.review_count);
        rhs.cmp(&lhs).then_with(|| self.genre.cmp(&other.genre))
    }
}
