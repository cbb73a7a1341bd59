use serde::{Deserialize, Serialize};

use folio_db::ReviewRecord;

/// Request model for creating a review.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateReview {
    /// Star rating, 1 through 5
    pub rating: u8,
    /// Free-text comment
    #[serde(default)]
    pub comment: String,
}

/// A stored review enriched with the author's display name, when known.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewWithAuthor {
    #[serde(flatten)]
    pub review: ReviewRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewer: Option<String>,
}
