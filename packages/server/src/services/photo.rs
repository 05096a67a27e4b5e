use chrono::Utc;
use common::storage::{BlobStore, BoxReader, ContentHash};
use sea_orm::{ActiveModelTrait, ConnectionTrait, DatabaseTransaction, EntityTrait, Set, TransactionTrait};
use tracing::{info, warn};
use uuid::Uuid;

use super::error::{ServiceError, ServiceResult};
use super::listing::{find_for_update, next_timestamp};
use crate::entity::{listing, listing_photo};
use crate::utils::filename::validate_flat_filename;

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// A photo as received from the caller.
pub struct PhotoUpload {
    pub filename: String,
    /// Content type declared by the client, used when the extension says nothing.
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

/// Photo metadata plus an open reader over its bytes.
pub struct PhotoDownload {
    pub photo: listing_photo::Model,
    pub reader: BoxReader,
}

/// Correlates listings with photo bytes held in the blob store.
///
/// Bytes are content-addressed, so storing the same upload twice is harmless.
/// Linking is a separate relational transaction; if it fails after the bytes
/// were written the blob is left unreferenced and the caller may simply retry.
pub struct BlobBridge<'a, C> {
    conn: &'a C,
    blobs: &'a dyn BlobStore,
}

impl<'a, C> BlobBridge<'a, C>
where
    C: ConnectionTrait + TransactionTrait<Transaction = DatabaseTransaction>,
{
    pub fn new(conn: &'a C, blobs: &'a dyn BlobStore) -> Self {
        Self { conn, blobs }
    }

    /// Store `upload` and make it the listing's current photo, replacing any previous one.
    pub async fn upload(
        &self,
        listing_id: &str,
        upload: PhotoUpload,
    ) -> ServiceResult<listing_photo::Model> {
        let original = validate_flat_filename(&upload.filename)
            .map_err(|e| ServiceError::Validation(e.message().into()))?
            .to_string();
        if upload.data.is_empty() {
            return Err(ServiceError::Validation("Photo is empty".into()));
        }

        // Nothing is written for a listing that does not exist.
        listing::Entity::find_by_id(listing_id.to_string())
            .one(self.conn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Listing {listing_id} not found")))?;

        let hash = self.blobs.put(&upload.data).await?;
        let photo = listing_photo::ActiveModel {
            id: Set(Uuid::now_v7()),
            listing_id: Set(listing_id.to_string()),
            filename: Set(format!("listing_{listing_id}_{original}")),
            content_type: Set(resolve_content_type(&original, upload.content_type.as_deref())),
            size: Set(upload.data.len() as i64),
            content_hash: Set(hash.to_hex()),
            created_at: Set(Utc::now()),
        };

        match self.link(listing_id, photo).await {
            Ok(photo) => {
                info!(listing_id, photo_id = %photo.id, %hash, "Photo linked");
                Ok(photo)
            }
            Err(e) => {
                warn!(listing_id, %hash, "Photo stored but not linked: {e}");
                Err(e)
            }
        }
    }

    async fn link(
        &self,
        listing_id: &str,
        photo: listing_photo::ActiveModel,
    ) -> ServiceResult<listing_photo::Model> {
        let txn = self.conn.begin().await?;
        let existing = find_for_update(&txn, listing_id).await?;
        let previous = existing.photo_ref;
        let updated_at = next_timestamp(existing.updated_at);

        let photo = photo.insert(&txn).await?;

        let mut active: listing::ActiveModel = existing.into();
        active.photo_ref = Set(Some(photo.id));
        active.updated_at = Set(updated_at);
        active.update(&txn).await?;

        if let Some(previous) = previous {
            listing_photo::Entity::delete_by_id(previous)
                .exec(&txn)
                .await?;
        }

        txn.commit().await?;
        Ok(photo)
    }

    /// Open the listing's current photo.
    pub async fn download(&self, listing_id: &str) -> ServiceResult<PhotoDownload> {
        let listing = listing::Entity::find_by_id(listing_id.to_string())
            .one(self.conn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Listing {listing_id} not found")))?;

        let photo_ref = listing
            .photo_ref
            .ok_or_else(|| ServiceError::NotFound(format!("Listing {listing_id} has no photo")))?;

        let photo = listing_photo::Entity::find_by_id(photo_ref)
            .one(self.conn)
            .await?
            .ok_or_else(|| {
                ServiceError::Dependency(format!(
                    "listing {listing_id} references missing photo {photo_ref}"
                ))
            })?;

        let hash = ContentHash::from_hex(&photo.content_hash)?;
        let reader = self.blobs.get_stream(&hash).await?;

        Ok(PhotoDownload { photo, reader })
    }
}

fn resolve_content_type(filename: &str, declared: Option<&str>) -> String {
    mime_guess::from_path(filename)
        .first()
        .map(|m| m.to_string())
        .or_else(|| {
            declared
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string)
        })
        .unwrap_or_else(|| FALLBACK_CONTENT_TYPE.to_string())
}
