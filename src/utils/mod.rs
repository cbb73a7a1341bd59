//! Shared helpers for the FOLIO modules.

use folio_db::{Page, StoreError};
use folio_http::error::AppError;

/// Default page size for book listings.
pub const DEFAULT_LIST_LIMIT: usize = 10;
/// Default page size for the review slice on a book detail.
pub const DEFAULT_REVIEW_LIMIT: usize = 5;

/// Translate 1-based `page`/`limit` query parameters into a skip/limit
/// window. Returns the effective page number alongside the window.
pub fn page_window(
    page: Option<usize>,
    limit: Option<usize>,
    default_limit: usize,
) -> (usize, Page) {
    let page_no = page.unwrap_or(1).max(1);
    let limit = limit.unwrap_or(default_limit).max(1);
    (
        page_no,
        Page {
            // Page numbers come straight off the query string; saturate
            // instead of overflowing on absurd values.
            skip: page_no.saturating_sub(1).saturating_mul(limit),
            limit,
        },
    )
}

/// Map a store failure to the generic server error. The raw failure is
/// logged here at the boundary; the response body stays generic.
pub fn store_failure(err: StoreError) -> AppError {
    tracing::error!(%err, "store operation failed");
    AppError::Internal(anyhow::Error::new(err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_window_defaults_to_first_page() {
        let (page_no, window) = page_window(None, None, DEFAULT_LIST_LIMIT);
        assert_eq!(page_no, 1);
        assert_eq!(window.skip, 0);
        assert_eq!(window.limit, 10);
    }

    #[test]
    fn page_window_skips_previous_pages() {
        let (page_no, window) = page_window(Some(2), Some(5), DEFAULT_LIST_LIMIT);
        assert_eq!(page_no, 2);
        assert_eq!(window.skip, 5);
        assert_eq!(window.limit, 5);
    }

    #[test]
    fn page_window_clamps_degenerate_input() {
        let (page_no, window) = page_window(Some(0), Some(0), DEFAULT_REVIEW_LIMIT);
        assert_eq!(page_no, 1);
        assert_eq!(window.skip, 0);
        assert_eq!(window.limit, 1);
    }

    #[test]
    fn page_window_saturates_on_huge_page_numbers() {
        let (page_no, window) = page_window(Some(usize::MAX), None, DEFAULT_LIST_LIMIT);
        assert_eq!(page_no, usize::MAX);
        assert_eq!(window.skip, usize::MAX);
        assert_eq!(window.limit, 10);
    }
}
