//! Review authorization and rating aggregation.
//!
//! Every rule about who may touch a review lives here: one review per
//! `(user, book)` pair, and mutation only by the authoring user. Ownership is
//! part of the store lookup key, so a caller probing another user's review
//! gets the same answer as one probing a review that never existed.

use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use folio_db::{
    NewReview, Page, ReviewPatch, ReviewRecord, ReviewStore, StoreError, UserStore,
};
use folio_http::error::AppError;
use folio_kernel::Stores;

use super::models::ReviewWithAuthor;

/// Domain failures of the review engine.
#[derive(Error, Debug)]
pub enum ReviewError {
    #[error("you already reviewed this book")]
    Duplicate,

    /// Covers both a missing review and a review owned by someone else.
    /// The caller cannot tell which, and that is deliberate.
    #[error("review not found or unauthorized")]
    NotFoundOrUnauthorized,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<ReviewError> for AppError {
    fn from(err: ReviewError) -> Self {
        match err {
            ReviewError::Duplicate => AppError::bad_request("you already reviewed this book"),
            ReviewError::NotFoundOrUnauthorized => {
                AppError::not_found("review not found or unauthorized")
            }
            ReviewError::Store(err) => crate::utils::store_failure(err),
        }
    }
}

/// Aggregate view of a book's reviews: the mean over the full set plus one
/// page of review bodies.
#[derive(Debug)]
pub struct BookReviews {
    pub average_rating: Option<String>,
    pub reviews: Vec<ReviewWithAuthor>,
}

/// Review engine over the injected persistence ports.
pub struct ReviewEngine {
    reviews: Arc<dyn ReviewStore>,
    users: Arc<dyn UserStore>,
}

impl ReviewEngine {
    pub fn new(stores: &Stores) -> Self {
        Self {
            reviews: stores.reviews.clone(),
            users: stores.users.clone(),
        }
    }

    /// Create a review for `(caller, book)` unless one already exists.
    pub async fn create(
        &self,
        caller: Uuid,
        book: Uuid,
        rating: u8,
        comment: String,
    ) -> Result<ReviewRecord, ReviewError> {
        if self
            .reviews
            .find_by_user_and_book(caller, book)
            .await?
            .is_some()
        {
            return Err(ReviewError::Duplicate);
        }

        match self
            .reviews
            .insert(NewReview {
                book,
                user: caller,
                rating,
                comment,
            })
            .await
        {
            Ok(record) => Ok(record),
            // The precondition check and the insert are separate store
            // calls; the store's unique index closes the window between
            // them.
            Err(StoreError::UniqueViolation { .. }) => Err(ReviewError::Duplicate),
            Err(err) => Err(err.into()),
        }
    }

    /// Merge writable fields into the caller's own review.
    pub async fn update(
        &self,
        caller: Uuid,
        review_id: Uuid,
        patch: ReviewPatch,
    ) -> Result<ReviewRecord, ReviewError> {
        self.reviews
            .update_owned(review_id, caller, patch)
            .await?
            .ok_or(ReviewError::NotFoundOrUnauthorized)
    }

    /// Delete the caller's own review.
    pub async fn delete(&self, caller: Uuid, review_id: Uuid) -> Result<(), ReviewError> {
        if self.reviews.delete_owned(review_id, caller).await? {
            Ok(())
        } else {
            Err(ReviewError::NotFoundOrUnauthorized)
        }
    }

    /// Compute the aggregate for a book: mean rating over the full review
    /// set, plus the requested page of review bodies enriched with display
    /// names. The two fetches are independent reads of the same set.
    pub async fn book_aggregate(
        &self,
        book: Uuid,
        page: Page,
    ) -> Result<BookReviews, ReviewError> {
        let all = self.reviews.find_for_book(book).await?;
        let average_rating = average_rating(&all);

        let page_records = self.reviews.find_for_book_page(book, page).await?;
        let mut reviews = Vec::with_capacity(page_records.len());
        for record in page_records {
            let reviewer = self.users.find_by_id(record.user).await?.map(|u| u.name);
            reviews.push(ReviewWithAuthor {
                review: record,
                reviewer,
            });
        }

        Ok(BookReviews {
            average_rating,
            reviews,
        })
    }
}

/// Arithmetic mean of ratings to one decimal place. An empty set yields
/// `None`: absence of a rating, not a zero rating.
fn average_rating(reviews: &[ReviewRecord]) -> Option<String> {
    if reviews.is_empty() {
        return None;
    }
    let sum: u32 = reviews.iter().map(|r| u32::from(r.rating)).sum();
    let mean = f64::from(sum) / reviews.len() as f64;
    Some(format!("{mean:.1}"))
}
