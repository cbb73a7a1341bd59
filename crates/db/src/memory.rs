//! In-memory store backend.
//!
//! Backs all three persistence ports with a single `RwLock`-guarded state.
//! Unique indexes declared by module migrations are enforced here inside the
//! write lock, so check-then-insert sequences in callers cannot race past
//! the `(user, book)` constraint.

use std::collections::{BTreeSet, HashMap};
use std::sync::RwLock;

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    new_record_id, BookFilter, BookRecord, BookStore, NewBook, NewReview, Page, ReviewPatch,
    ReviewRecord, ReviewStore, StoreError, StoreResult, UserRecord, UserStore,
};

const REVIEW_USER_BOOK_UNIQUE: &str = "review_user_book_unique";

#[derive(Default)]
struct Inner {
    books: Vec<BookRecord>,
    reviews: Vec<ReviewRecord>,
    users: HashMap<Uuid, UserRecord>,
    applied_migrations: BTreeSet<String>,
}

/// Process-local document store. Cheap to clone behind an `Arc`; all state
/// lives in the store, never in the request handlers.
#[derive(Default)]
pub struct MemoryDb {
    inner: RwLock<Inner>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a migration as applied. Returns false when the ledger already
    /// contains it. The in-memory backend has no DDL to execute; the ledger
    /// keeps startup idempotent and mirrors what a remote backend would do.
    pub fn record_migration(&self, module: &str, id: &str) -> StoreResult<bool> {
        let mut inner = self.write()?;
        let applied = inner.applied_migrations.insert(format!("{module}/{id}"));
        if !applied {
            tracing::debug!(module, id, "migration already recorded");
        }
        Ok(applied)
    }

    fn read(&self) -> StoreResult<std::sync::RwLockReadGuard<'_, Inner>> {
        self.inner
            .read()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".to_string()))
    }

    fn write(&self) -> StoreResult<std::sync::RwLockWriteGuard<'_, Inner>> {
        self.inner
            .write()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".to_string()))
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn matches_filter(book: &BookRecord, filter: &BookFilter) -> bool {
    if let Some(author) = &filter.author {
        if !contains_ci(&book.author, author) {
            return false;
        }
    }
    if let Some(genre) = &filter.genre {
        if !contains_ci(&book.genre, genre) {
            return false;
        }
    }
    true
}

fn page_of<T>(items: impl Iterator<Item = T>, page: Page) -> Vec<T> {
    items.skip(page.skip).take(page.limit).collect()
}

#[async_trait]
impl BookStore for MemoryDb {
    async fn insert(&self, book: NewBook) -> StoreResult<BookRecord> {
        let record = BookRecord {
            id: new_record_id(),
            title: book.title,
            author: book.author,
            genre: book.genre,
            created_at: OffsetDateTime::now_utc(),
        };
        let mut inner = self.write()?;
        inner.books.push(record.clone());
        Ok(record)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<BookRecord>> {
        let inner = self.read()?;
        Ok(inner.books.iter().find(|b| b.id == id).cloned())
    }

    async fn list(&self, filter: &BookFilter, page: Page) -> StoreResult<Vec<BookRecord>> {
        let inner = self.read()?;
        Ok(page_of(
            inner.books.iter().filter(|b| matches_filter(b, filter)).cloned(),
            page,
        ))
    }

    async fn count(&self, filter: &BookFilter) -> StoreResult<usize> {
        let inner = self.read()?;
        Ok(inner.books.iter().filter(|b| matches_filter(b, filter)).count())
    }

    async fn search(&self, query: &str) -> StoreResult<Vec<BookRecord>> {
        let inner = self.read()?;
        Ok(inner
            .books
            .iter()
            .filter(|b| contains_ci(&b.title, query) || contains_ci(&b.author, query))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ReviewStore for MemoryDb {
    async fn insert(&self, review: NewReview) -> StoreResult<ReviewRecord> {
        // Uniqueness check and insert share the write lock, so two
        // concurrent inserts for the same (user, book) cannot both commit.
        let mut inner = self.write()?;
        if inner
            .reviews
            .iter()
            .any(|r| r.user == review.user && r.book == review.book)
        {
            return Err(StoreError::UniqueViolation {
                constraint: REVIEW_USER_BOOK_UNIQUE,
            });
        }
        let record = ReviewRecord {
            id: new_record_id(),
            book: review.book,
            user: review.user,
            rating: review.rating,
            comment: review.comment,
            created_at: OffsetDateTime::now_utc(),
        };
        inner.reviews.push(record.clone());
        Ok(record)
    }

    async fn find_by_user_and_book(
        &self,
        user: Uuid,
        book: Uuid,
    ) -> StoreResult<Option<ReviewRecord>> {
        let inner = self.read()?;
        Ok(inner
            .reviews
            .iter()
            .find(|r| r.user == user && r.book == book)
            .cloned())
    }

    async fn update_owned(
        &self,
        id: Uuid,
        user: Uuid,
        patch: ReviewPatch,
    ) -> StoreResult<Option<ReviewRecord>> {
        let mut inner = self.write()?;
        let Some(record) = inner.reviews.iter_mut().find(|r| r.id == id && r.user == user) else {
            return Ok(None);
        };
        if let Some(rating) = patch.rating {
            record.rating = rating;
        }
        if let Some(comment) = patch.comment {
            record.comment = comment;
        }
        Ok(Some(record.clone()))
    }

    async fn delete_owned(&self, id: Uuid, user: Uuid) -> StoreResult<bool> {
        let mut inner = self.write()?;
        let before = inner.reviews.len();
        inner.reviews.retain(|r| !(r.id == id && r.user == user));
        Ok(inner.reviews.len() < before)
    }

    async fn find_for_book(&self, book: Uuid) -> StoreResult<Vec<ReviewRecord>> {
        let inner = self.read()?;
        Ok(inner.reviews.iter().filter(|r| r.book == book).cloned().collect())
    }

    async fn find_for_book_page(&self, book: Uuid, page: Page) -> StoreResult<Vec<ReviewRecord>> {
        let inner = self.read()?;
        Ok(page_of(
            inner.reviews.iter().filter(|r| r.book == book).cloned(),
            page,
        ))
    }
}

#[async_trait]
impl UserStore for MemoryDb {
    async fn upsert(&self, user: UserRecord) -> StoreResult<()> {
        let mut inner = self.write()?;
        inner.users.insert(user.id, user);
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<UserRecord>> {
        let inner = self.read()?;
        Ok(inner.users.get(&id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(n: u128) -> Uuid {
        Uuid::from_u128(n)
    }

    fn review_for(user_id: Uuid, book_id: Uuid, rating: u8) -> NewReview {
        NewReview {
            book: book_id,
            user: user_id,
            rating,
            comment: "fine".to_string(),
        }
    }

    #[tokio::test]
    async fn second_review_for_same_user_and_book_is_rejected() {
        let db = MemoryDb::new();
        let book = user(99);
        ReviewStore::insert(&db, review_for(user(1), book, 4))
            .await
            .unwrap();

        let err = ReviewStore::insert(&db, review_for(user(1), book, 2))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation { .. }));

        let all = db.find_for_book(book).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].rating, 4);
    }

    #[tokio::test]
    async fn same_user_may_review_different_books() {
        let db = MemoryDb::new();
        ReviewStore::insert(&db, review_for(user(1), user(10), 5))
            .await
            .unwrap();
        ReviewStore::insert(&db, review_for(user(1), user(11), 3))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn delete_owned_ignores_other_users_reviews() {
        let db = MemoryDb::new();
        let book = user(99);
        let stored = ReviewStore::insert(&db, review_for(user(1), book, 4))
            .await
            .unwrap();

        assert!(!db.delete_owned(stored.id, user(2)).await.unwrap());
        assert_eq!(db.find_for_book(book).await.unwrap().len(), 1);

        assert!(db.delete_owned(stored.id, user(1)).await.unwrap());
        assert!(db.find_for_book(book).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_owned_merges_only_provided_fields() {
        let db = MemoryDb::new();
        let stored = ReviewStore::insert(&db, review_for(user(1), user(99), 4))
            .await
            .unwrap();

        let updated = db
            .update_owned(
                stored.id,
                user(1),
                ReviewPatch {
                    rating: Some(2),
                    comment: None,
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.rating, 2);
        assert_eq!(updated.comment, "fine");
        assert_eq!(updated.user, user(1));
        assert_eq!(updated.created_at, stored.created_at);

        assert!(db
            .update_owned(stored.id, user(2), ReviewPatch::default())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn review_pages_follow_insertion_order() {
        let db = MemoryDb::new();
        let book = user(99);
        for n in 0..12 {
            ReviewStore::insert(&db, review_for(user(100 + n), book, 3))
                .await
                .unwrap();
        }

        let page = db
            .find_for_book_page(book, Page { skip: 5, limit: 5 })
            .await
            .unwrap();
        assert_eq!(page.len(), 5);
        assert_eq!(page[0].user, user(105));
        assert_eq!(page[4].user, user(109));
    }

    #[tokio::test]
    async fn book_filters_match_substrings_case_insensitively() {
        let db = MemoryDb::new();
        for (title, author, genre) in [
            ("Dune", "Frank Herbert", "Science Fiction"),
            ("Emma", "Jane Austen", "Romance"),
            ("Persuasion", "Jane Austen", "Romance"),
        ] {
            BookStore::insert(
                &db,
                NewBook {
                    title: title.to_string(),
                    author: author.to_string(),
                    genre: genre.to_string(),
                },
            )
            .await
            .unwrap();
        }

        let filter = BookFilter {
            author: Some("austen".to_string()),
            genre: None,
        };
        assert_eq!(db.count(&filter).await.unwrap(), 2);

        let page = db.list(&filter, Page { skip: 1, limit: 10 }).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].title, "Persuasion");

        let hits = db.search("DUNE").await.unwrap();
        assert_eq!(hits.len(), 1);
        let hits = db.search("jane").await.unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn migration_ledger_is_idempotent() {
        let db = MemoryDb::new();
        assert!(db.record_migration("reviews", "001_init").unwrap());
        assert!(!db.record_migration("reviews", "001_init").unwrap());
    }
}
