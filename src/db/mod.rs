pub mod postgres;
pub mod store;

pub use postgres::{create_pool, run_migrations};
pub use store::{LibraryStore, PgLibraryStore};
