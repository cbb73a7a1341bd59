use serde::{Deserialize, Serialize};

use folio_db::BookRecord;

use crate::modules::reviews::models::ReviewWithAuthor;

/// Request model for creating a new book.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateBook {
    /// Title of the book
    pub title: String,
    /// Author of the book
    pub author: String,
    /// Genre label used for filtering
    #[serde(default)]
    pub genre: String,
}

/// Query parameters for the paginated book listing.
#[derive(Debug, Clone, Deserialize)]
pub struct ListQuery {
    pub page: Option<usize>,
    pub limit: Option<usize>,
    pub author: Option<String>,
    pub genre: Option<String>,
}

/// Query parameters for title/author search.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchQuery {
    pub query: Option<String>,
}

/// Query parameters for the review slice on a book detail.
#[derive(Debug, Clone, Deserialize)]
pub struct DetailQuery {
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

/// Paginated book listing.
#[derive(Debug, Serialize)]
pub struct BookList {
    pub total: usize,
    pub page: usize,
    pub limit: usize,
    pub books: Vec<BookRecord>,
}

/// A book with its aggregate rating and one page of reviews.
#[derive(Debug, Serialize)]
pub struct BookDetail {
    #[serde(flatten)]
    pub book: BookRecord,
    /// Mean rating over all of the book's reviews, to one decimal place;
    /// absent when the book has no reviews.
    pub average_rating: Option<String>,
    pub reviews: Vec<ReviewWithAuthor>,
}
