use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::entity::listing_photo;

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PhotoResponse {
    /// Opaque photo reference (UUIDv7).
    #[schema(example = "01936f0e-1234-7abc-8000-000000000001")]
    pub photo_id: String,
    pub listing_id: String,
    /// Stored name, `listing_{id}_{original filename}`.
    pub filename: String,
    #[schema(example = "image/jpeg")]
    pub content_type: String,
    #[schema(example = 142857)]
    pub size: i64,
    /// SHA-256 of the bytes, also served as the download ETag.
    pub content_hash: String,
    pub created_at: DateTime<Utc>,
}

impl From<listing_photo::Model> for PhotoResponse {
    fn from(m: listing_photo::Model) -> Self {
        Self {
            photo_id: m.id.to_string(),
            listing_id: m.listing_id,
            filename: m.filename,
            content_type: m.content_type,
            size: m.size,
            content_hash: m.content_hash,
            created_at: m.created_at,
        }
    }
}
