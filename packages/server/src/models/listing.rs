use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::shared::{non_blank, parse_price};
use crate::entity::listing;
use crate::services::listing::{ListingDraft, ListingFilter, ListingType, Page};

/// Body of `POST /listings` and `PUT /listings/{id}`.
///
/// A `status` or `averageRating` sent by the client is ignored.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListingRequest {
    #[schema(example = "u1")]
    pub owner_id: String,
    #[schema(example = "d1")]
    pub device_id: String,
    #[schema(example = "Cordless drill")]
    pub title: String,
    pub description: String,
    /// Non-negative.
    #[schema(example = 100.0)]
    pub price: f64,
    #[schema(example = "tools")]
    pub category: String,
    #[schema(example = "Berlin")]
    pub city: String,
    #[schema(example = "BE")]
    pub region: String,
    pub image_url: String,
    #[serde(rename = "type")]
    pub listing_type: ListingType,
}

impl From<ListingRequest> for ListingDraft {
    fn from(req: ListingRequest) -> Self {
        Self {
            owner_id: req.owner_id,
            device_id: req.device_id,
            title: req.title,
            description: req.description,
            price: req.price,
            category: req.category,
            city: req.city,
            region: req.region,
            image_url: req.image_url,
            listing_type: req.listing_type,
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListingResponse {
    #[schema(example = "5f0c1b7e-8a0e-4d0c-9a57-3c2f0f4f1e11")]
    pub id: String,
    pub owner_id: String,
    pub device_id: String,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub category: String,
    pub city: String,
    pub region: String,
    pub image_url: String,
    /// One of `pending`, `approved`, `rejected`.
    #[schema(example = "pending")]
    pub status: String,
    /// One of `rent`, `sale`, `search`.
    #[serde(rename = "type")]
    #[schema(example = "rent")]
    pub listing_type: String,
    /// Mean review rating, two decimals.
    #[schema(example = 3.67)]
    pub average_rating: f64,
    /// Download URL of the current photo, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<listing::Model> for ListingResponse {
    fn from(m: listing::Model) -> Self {
        let photo_url = m
            .photo_ref
            .map(|_| format!("/api/v1/listings/{}/photo", m.id));
        Self {
            id: m.id,
            owner_id: m.owner_id,
            device_id: m.device_id,
            title: m.title,
            description: m.description,
            price: m.price,
            category: m.category,
            city: m.city,
            region: m.region,
            image_url: m.image_url,
            status: m.status,
            listing_type: m.listing_type,
            average_rating: m.average_rating,
            photo_url,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

/// Query of the public feed. Every value is optional and parsed leniently.
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListingListQuery {
    #[param(example = "tools")]
    pub category: Option<String>,
    #[param(example = "Berlin")]
    pub city: Option<String>,
    /// Inclusive lower price bound.
    #[serde(alias = "minPrice")]
    #[param(example = "50")]
    pub min_price: Option<String>,
    /// Inclusive upper price bound.
    #[serde(alias = "maxPrice")]
    #[param(example = "150")]
    pub max_price: Option<String>,
    /// Page size, default 10, capped at 100.
    pub limit: Option<String>,
    /// Number of items to skip, default 0.
    pub offset: Option<String>,
}

impl ListingListQuery {
    pub fn filter(&self) -> ListingFilter {
        ListingFilter {
            category: non_blank(self.category.as_deref()),
            city: non_blank(self.city.as_deref()),
            min_price: parse_price(self.min_price.as_deref()),
            max_price: parse_price(self.max_price.as_deref()),
        }
    }

    pub fn page(&self) -> Page {
        Page::parse(self.limit.as_deref(), self.offset.as_deref())
    }
}
