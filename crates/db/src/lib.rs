//! Persistence ports and record types for the FOLIO catalog.
//!
//! The domain modules talk to storage exclusively through the traits in this
//! crate. The bundled [`memory::MemoryDb`] backend is the current
//! implementation; a remote document store can be slotted in later behind the
//! same ports.

pub mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

pub type StoreResult<T> = Result<T, StoreError>;

/// Failures surfaced by a store backend.
///
/// `UniqueViolation` is the storage-level enforcement of declared unique
/// indexes; callers translate it into their own domain error. Everything else
/// is a generic availability failure, fatal to the request but not the
/// process.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("unique index '{constraint}' violated")]
    UniqueViolation { constraint: &'static str },

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Generate a fresh record identifier (UUIDv7, time-ordered).
pub fn new_record_id() -> Uuid {
    Uuid::new_v7(uuid::Timestamp::now(uuid::NoContext))
}

/// A catalog book as stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookRecord {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub genre: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Fields required to create a book; id and timestamp are assigned on insert.
#[derive(Debug, Clone)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub genre: String,
}

/// A user review as stored. At most one exists per `(user, book)` pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub id: Uuid,
    pub book: Uuid,
    pub user: Uuid,
    pub rating: u8,
    pub comment: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Fields required to create a review.
#[derive(Debug, Clone)]
pub struct NewReview {
    pub book: Uuid,
    pub user: Uuid,
    pub rating: u8,
    pub comment: String,
}

/// Writable review fields for an in-place merge. Identity fields (`id`,
/// `user`, `book`, `created_at`) are never patchable.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewPatch {
    pub rating: Option<u8>,
    pub comment: Option<String>,
}

/// A known account, kept only for display-name enrichment of reviews.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: Uuid,
    pub name: String,
}

/// Optional case-insensitive substring filters for book listings.
#[derive(Debug, Clone, Default)]
pub struct BookFilter {
    pub author: Option<String>,
    pub genre: Option<String>,
}

/// A skip/limit window over an ordered result set.
#[derive(Debug, Clone, Copy)]
pub struct Page {
    pub skip: usize,
    pub limit: usize,
}

/// Port for book persistence.
#[async_trait]
pub trait BookStore: Send + Sync {
    async fn insert(&self, book: NewBook) -> StoreResult<BookRecord>;
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<BookRecord>>;
    async fn list(&self, filter: &BookFilter, page: Page) -> StoreResult<Vec<BookRecord>>;
    async fn count(&self, filter: &BookFilter) -> StoreResult<usize>;
    /// Case-insensitive substring match over title or author.
    async fn search(&self, query: &str) -> StoreResult<Vec<BookRecord>>;
}

/// Port for review persistence.
///
/// Ownership-scoped operations take the caller's user id as part of the
/// lookup key: a non-owner sees the same "no match" result as a caller
/// targeting a review that never existed.
#[async_trait]
pub trait ReviewStore: Send + Sync {
    /// Insert a review, enforcing the `(user, book)` unique index.
    async fn insert(&self, review: NewReview) -> StoreResult<ReviewRecord>;
    async fn find_by_user_and_book(
        &self,
        user: Uuid,
        book: Uuid,
    ) -> StoreResult<Option<ReviewRecord>>;
    /// Merge writable fields into the review matching `(id, user)`.
    async fn update_owned(
        &self,
        id: Uuid,
        user: Uuid,
        patch: ReviewPatch,
    ) -> StoreResult<Option<ReviewRecord>>;
    /// Atomically find and delete the review matching `(id, user)`.
    /// Returns whether anything was deleted.
    async fn delete_owned(&self, id: Uuid, user: Uuid) -> StoreResult<bool>;
    /// Full review set for a book, in insertion order.
    async fn find_for_book(&self, book: Uuid) -> StoreResult<Vec<ReviewRecord>>;
    /// A page of the same set, in insertion order.
    async fn find_for_book_page(&self, book: Uuid, page: Page) -> StoreResult<Vec<ReviewRecord>>;
}

/// Port for user lookup.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn upsert(&self, user: UserRecord) -> StoreResult<()>;
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<UserRecord>>;
}
