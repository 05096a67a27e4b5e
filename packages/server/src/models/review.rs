use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::review;

/// Body of `POST /listings/{id}/reviews`. The author is taken from the token.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CreateReviewRequest {
    /// 1 to 5 inclusive.
    #[schema(example = 4, minimum = 1, maximum = 5)]
    pub rating: i32,
    #[schema(example = "Worked great")]
    pub comment: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewResponse {
    #[schema(example = 1)]
    pub id: i32,
    pub listing_id: String,
    #[schema(example = "u2")]
    pub user_id: String,
    #[schema(example = 4)]
    pub rating: i32,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

impl From<review::Model> for ReviewResponse {
    fn from(m: review::Model) -> Self {
        Self {
            id: m.id,
            listing_id: m.listing_id,
            user_id: m.user_id,
            rating: m.rating,
            comment: m.comment,
            created_at: m.created_at,
        }
    }
}
