use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "listing_photo")]
pub struct Model {
    /// UUIDv7; this is the opaque reference stored in `listings.photo_ref`.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub listing_id: String,
    #[sea_orm(belongs_to, from = "listing_id", to = "id")]
    pub listing: HasOne<super::listing::Entity>,

    /// `listing_{listing_id}_{original filename}`
    pub filename: String,
    pub content_type: String,
    pub size: i64,

    /// SHA-256 address of the bytes in the blob store.
    pub content_hash: String,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
