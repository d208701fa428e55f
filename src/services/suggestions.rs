use crate::{
    db::LibraryStore,
    error::AppResult,
    models::{Book, GenreRating, UserId},
};

/// Outcome of a suggestion request
#[derive(Debug, Clone, PartialEq)]
pub enum Suggestion {
    /// Every book in the genre the user rates highest on average
    Genre {
        genre: String,
        average_rating: f64,
        books: Vec<Book>,
    },
    /// The user has not reviewed anything yet
    InsufficientData,
}

/// Picks the genre with the highest average rating.
///
/// Equal averages resolve to the alphabetically first genre.
pub fn top_genre(ratings: Vec<GenreRating>) -> Option<GenreRating> {
    ratings
        .into_iter()
        .filter(|r| r.review_count > 0)
        .min_by(|a, b| a.preference_order(b))
}

/// Suggests books from the genre the user has historically rated highest
pub async fn suggest_books(store: &dyn LibraryStore, user_id: UserId) -> AppResult<Suggestion> {
    let ratings = store.genre_ratings(user_id).await?;

    let Some(top) = top_genre(ratings) else {
        tracing::debug!(user_id = %user_id, "No reviews to base suggestions on");
        return Ok(Suggestion::InsufficientData);
    };

    let books = store.books_in_genre(&top.genre).await?;

    tracing::info!(
        user_id = %user_id,
        genre = %top.genre,
        average_rating = top.average(),
        count = books.len(),
        "Suggested books"
    );

    Ok(Suggestion::Genre {
        average_rating: top.average(),
        genre: top.genre,
        books,
    })
}
