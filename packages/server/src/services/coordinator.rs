use common::storage::BlobStore;
use sea_orm::DatabaseConnection;
use tracing::instrument;

use super::error::ServiceResult;
use super::identity::{Credential, IdentityValidator, validate_references};
use super::listing::{ListingDraft, ListingFilter, ListingStore, Page};
use super::photo::{BlobBridge, PhotoDownload, PhotoUpload};
use super::review::ReviewAggregator;
use crate::entity::{listing, listing_photo, review};

/// Entry point for request handlers.
///
/// Sequences the identity checks, the listing store, the review aggregator and
/// the blob bridge. Remote identity checks always finish before anything is
/// written, so a rejected or failed check never needs compensation.
pub struct Coordinator<'a> {
    db: &'a DatabaseConnection,
    identity: &'a dyn IdentityValidator,
    blobs: &'a dyn BlobStore,
}

impl<'a> Coordinator<'a> {
    pub fn new(
        db: &'a DatabaseConnection,
        identity: &'a dyn IdentityValidator,
        blobs: &'a dyn BlobStore,
    ) -> Self {
        Self {
            db,
            identity,
            blobs,
        }
    }

    fn listings(&self) -> ListingStore<'a, DatabaseConnection> {
        ListingStore::new(self.db)
    }

    #[instrument(skip_all, fields(owner_id = %draft.owner_id, device_id = %draft.device_id))]
    pub async fn create_listing(
        &self,
        draft: ListingDraft,
        credential: &Credential,
    ) -> ServiceResult<listing::Model> {
        draft.validate()?;
        validate_references(self.identity, &draft.owner_id, &draft.device_id, credential).await?;
        self.listings().create(draft).await
    }

    /// Missing listings are reported before the draft is validated or any
    /// remote check runs.
    #[instrument(skip(self, draft, credential))]
    pub async fn update_listing(
        &self,
        id: &str,
        draft: ListingDraft,
        credential: &Credential,
    ) -> ServiceResult<listing::Model> {
        self.listings().find(id).await?;
        draft.validate()?;
        validate_references(self.identity, &draft.owner_id, &draft.device_id, credential).await?;
        self.listings().update(id, draft).await
    }

    pub async fn get_listing(&self, id: &str) -> ServiceResult<listing::Model> {
        self.listings().find(id).await
    }

    pub async fn delete_listing(&self, id: &str) -> ServiceResult<listing::Model> {
        self.listings().delete(id).await
    }

    pub async fn approve_listing(&self, id: &str) -> ServiceResult<listing::Model> {
        self.listings().approve(id).await
    }

    pub async fn reject_listing(&self, id: &str) -> ServiceResult<listing::Model> {
        self.listings().reject(id).await
    }

    pub async fn list_approved(
        &self,
        filter: &ListingFilter,
        page: Page,
    ) -> ServiceResult<Vec<listing::Model>> {
        self.listings().list_approved(filter, page).await
    }

    pub async fn list_pending(&self, page: Page) -> ServiceResult<Vec<listing::Model>> {
        self.listings().list_pending(page).await
    }

    pub async fn add_review(
        &self,
        listing_id: &str,
        user_id: &str,
        rating: i32,
        comment: &str,
    ) -> ServiceResult<review::Model> {
        ReviewAggregator::new(self.db)
            .insert(listing_id, user_id, rating, comment)
            .await
    }

    pub async fn list_reviews(&self, listing_id: &str) -> ServiceResult<Vec<review::Model>> {
        ReviewAggregator::new(self.db).list(listing_id).await
    }

    pub async fn upload_photo(
        &self,
        listing_id: &str,
        upload: PhotoUpload,
    ) -> ServiceResult<listing_photo::Model> {
        BlobBridge::new(self.db, self.blobs)
            .upload(listing_id, upload)
            .await
    }

    pub async fn download_photo(&self, listing_id: &str) -> ServiceResult<PhotoDownload> {
        BlobBridge::new(self.db, self.blobs)
            .download(listing_id)
            .await
    }
}
