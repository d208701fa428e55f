//! `PgLibraryStore` against a real database.
//!
//! Needs `DATABASE_URL` pointing at a Postgres server the tests may create
//! databases on. Run with `cargo test -- --ignored`.

use std::sync::Arc;

use sqlx::PgPool;

use bookshelf_api::{
    db::{LibraryStore, PgLibraryStore},
    error::AppError,
    models::{BookId, Rating, UserId},
    services::suggestions::top_genre,
};

async fn seed_user(pool: &PgPool, username: &str) -> UserId {
    sqlx::query_scalar::<_, UserId>(
        "INSERT INTO users (username, password) VALUES ($1, 'secret') RETURNING id",
    )
    .bind(username)
    .fetch_one(pool)
    .await
    .unwrap()
}

async fn seed_book(pool: &PgPool, title: &str, genre: &str) -> BookId {
    sqlx::query_scalar::<_, BookId>(
        "INSERT INTO books (title, author, genre) VALUES ($1, 'Author', $2) RETURNING id",
    )
    .bind(title)
    .bind(genre)
    .fetch_one(pool)
    .await
    .unwrap()
}

fn rating(value: i64) -> Rating {
    Rating::new(value).unwrap()
}

async fn review_count(pool: &PgPool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM reviews")
        .fetch_one(pool)
        .await
        .unwrap()
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn test_concurrent_adds_store_one_review(pool: PgPool) {
    let user = seed_user(&pool, "alice").await;
    let book = seed_book(&pool, "Dune", "sci-fi").await;
    let store = Arc::new(PgLibraryStore::new(pool.clone()));

    let tasks: Vec<_> = (0..20)
        .map(|_| {
            let store = store.clone();
            tokio::spawn(async move { store.add_review(user, book, rating(5)).await })
        })
        .collect();

    let mut created = 0;
    let mut conflicts = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => created += 1,
            Err(AppError::Conflict(_)) => conflicts += 1,
            Err(e) => panic!("unexpected error: {}", e),
        }
    }

    assert_eq!(created, 1);
    assert_eq!(conflicts, 19);
    assert_eq!(review_count(&pool).await, 1);
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn test_list_books_annotates_only_callers_ratings(pool: PgPool) {
    let alice = seed_user(&pool, "alice").await;
    let bob = seed_user(&pool, "bob").await;
    let dune = seed_book(&pool, "Dune", "sci-fi").await;
    let stoner = seed_book(&pool, "Stoner", "drama").await;
    let store = PgLibraryStore::new(pool);

    store.add_review(alice, dune, rating(4)).await.unwrap();
    store.add_review(bob, stoner, rating(2)).await.unwrap();

    let books = store.list_books(alice).await.unwrap();
    let ratings: Vec<_> = books.iter().map(|b| (b.id, b.rating)).collect();
    assert_eq!(ratings, vec![(dune, Some(4)), (stoner, None)]);
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn test_books_by_genre(pool: PgPool) {
    let alice = seed_user(&pool, "alice").await;
    let dune = seed_book(&pool, "Dune", "sci-fi").await;
    seed_book(&pool, "Stoner", "drama").await;
    let store = PgLibraryStore::new(pool);

    let books = store
        .books_by_genre(alice, Some("sci-fi".to_string()))
        .await
        .unwrap();
    assert_eq!(books.len(), 1);
    assert_eq!(books[0].id, dune);

    assert!(store.books_by_genre(alice, None).await.unwrap().is_empty());
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn test_add_review_unknown_book_is_not_found(pool: PgPool) {
    let alice = seed_user(&pool, "alice").await;
    let store = PgLibraryStore::new(pool.clone());

    let err = store
        .add_review(alice, BookId(9999), rating(3))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    assert_eq!(review_count(&pool).await, 0);
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn test_update_and_delete_review(pool: PgPool) {
    let alice = seed_user(&pool, "alice").await;
    let dune = seed_book(&pool, "Dune", "sci-fi").await;
    let store = PgLibraryStore::new(pool.clone());

    let err = store
        .update_review(alice, dune, rating(2))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let added = store.add_review(alice, dune, rating(2)).await.unwrap();
    let updated = store.update_review(alice, dune, rating(5)).await.unwrap();
    assert_eq!(updated.id, added.id);
    assert_eq!(updated.book_id, added.book_id);
    assert_eq!(updated.user_id, added.user_id);
    assert_eq!(updated.rating, 5);

    assert_eq!(store.delete_review(alice, dune).await.unwrap(), 1);
    assert_eq!(store.delete_review(alice, dune).await.unwrap(), 0);
    assert_eq!(review_count(&pool).await, 0);
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn test_genre_ratings_tie_resolves_by_name(pool: PgPool) {
    let alice = seed_user(&pool, "alice").await;
    let dune = seed_book(&pool, "Dune", "sci-fi").await;
    let hyperion = seed_book(&pool, "Hyperion", "sci-fi").await;
    let stoner = seed_book(&pool, "Stoner", "drama").await;
    let store = PgLibraryStore::new(pool);

    store.add_review(alice, dune, rating(5)).await.unwrap();
    store.add_review(alice, hyperion, rating(3)).await.unwrap();
    store.add_review(alice, stoner, rating(4)).await.unwrap();

    let ratings = store.genre_ratings(alice).await.unwrap();
    assert_eq!(ratings.len(), 2);
    assert_eq!(top_genre(ratings).unwrap().genre, "drama");

    let drama = store.books_in_genre("drama").await.unwrap();
    assert_eq!(drama.len(), 1);
    assert_eq!(drama[0].id, stoner);
}
