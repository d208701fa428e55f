use std::sync::Arc;

use axum::extract::FromRef;
use sqlx::PgPool;

use crate::{
    auth::{IdentityResolver, PgTokenResolver},
    db::{LibraryStore, PgLibraryStore},
};

/// Shared application state
///
/// Holds handles only; each request checks out its own database connection
/// through the store.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn LibraryStore>,
    pub identity: Arc<dyn IdentityResolver>,
}

impl AppState {
    pub fn new(store: Arc<dyn LibraryStore>, identity: Arc<dyn IdentityResolver>) -> Self {
        Self { store, identity }
    }

    /// State backed by a PostgreSQL pool for both reviews and tokens
    pub fn postgres(pool: PgPool) -> Self {
        Self::new(
            Arc::new(PgLibraryStore::new(pool.clone())),
            Arc::new(PgTokenResolver::new(pool)),
        )
    }
}

impl FromRef<AppState> for Arc<dyn IdentityResolver> {
    fn from_ref(state: &AppState) -> Self {
        state.identity.clone()
    }
}
