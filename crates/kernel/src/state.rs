use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use folio_db::memory::MemoryDb;
use folio_db::{BookStore, ReviewStore, UserStore};

use crate::settings::Settings;

/// Resolves request credentials to an authenticated caller id.
///
/// The domain modules trust the returned id without re-validating
/// credentials; rejection of unauthenticated requests happens at the HTTP
/// boundary before any handler logic runs.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn resolve(&self, credentials: &str) -> Option<Uuid>;
}

/// Handles to the persistence ports, injected at startup.
#[derive(Clone)]
pub struct Stores {
    pub books: Arc<dyn BookStore>,
    pub reviews: Arc<dyn ReviewStore>,
    pub users: Arc<dyn UserStore>,
}

impl Stores {
    /// Wire all three ports to a single in-memory backend.
    pub fn memory(db: Arc<MemoryDb>) -> Self {
        Self {
            books: db.clone(),
            reviews: db.clone(),
            users: db,
        }
    }
}

/// Shared application state threaded through every route handler.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub stores: Stores,
    pub identity: Arc<dyn IdentityResolver>,
}
