use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "listings")]
pub struct Model {
    /// Random UUIDv4 in canonical string form.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Owner directory id. Checked at write time only.
    pub owner_id: String,
    /// Device registry id. Checked at write time only.
    pub device_id: String,

    pub title: String,
    pub description: String,
    pub price: f64,
    pub category: String,
    pub city: String,
    pub region: String,
    pub image_url: String,

    /// One of: pending, approved, rejected
    pub status: String,
    /// One of: rent, sale, search
    #[sea_orm(column_name = "type")]
    pub listing_type: String,

    /// Mean review rating rounded to two decimals. Written only by the review aggregator.
    pub average_rating: f64,

    /// `listing_photo.id` of the current photo, if one was uploaded.
    pub photo_ref: Option<Uuid>,

    #[sea_orm(has_many)]
    pub reviews: HasMany<super::review::Entity>,

    #[sea_orm(has_many)]
    pub photos: HasMany<super::listing_photo::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
