use crate::{
    db::LibraryStore,
    error::AppResult,
    models::{RatedBook, UserId},
};

/// Lists the whole catalog with the caller's own ratings attached
pub async fn list_books(store: &dyn LibraryStore, user_id: UserId) -> AppResult<Vec<RatedBook>> {
    store.list_books(user_id).await
}

/// Lists books of exactly one genre with the caller's own ratings attached
///
/// Matching is exact and case-sensitive. Without a genre the result is empty
/// rather than the whole catalog.
pub async fn filter_books(
    store: &dyn LibraryStore,
    user_id: UserId,
    genre: Option<String>,
) -> AppResult<Vec<RatedBook>> {
    store.books_by_genre(user_id, genre).await
}
