use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseTransaction, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::error::{ServiceError, ServiceResult};
use crate::entity::{listing, listing_photo, review};

pub const DEFAULT_LIMIT: u64 = 10;
pub const MAX_LIMIT: u64 = 100;
const MAX_TITLE_CHARS: usize = 256;

/// Moderation state. `pending` is the only state with outgoing transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ListingStatus {
    Pending,
    Approved,
    Rejected,
}

impl ListingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for ListingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ListingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            other => Err(format!("unknown listing status '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ListingType {
    Rent,
    Sale,
    Search,
}

impl ListingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rent => "rent",
            Self::Sale => "sale",
            Self::Search => "search",
        }
    }
}

/// Caller-editable listing fields, shared by create and update.
///
/// There is deliberately no status or rating here: status only moves through
/// moderation and the rating belongs to the review aggregator.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingDraft {
    pub owner_id: String,
    pub device_id: String,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub category: String,
    pub city: String,
    pub region: String,
    pub image_url: String,
    pub listing_type: ListingType,
}

impl ListingDraft {
    pub fn validate(&self) -> ServiceResult<()> {
        let required = [
            ("ownerId", &self.owner_id),
            ("deviceId", &self.device_id),
            ("title", &self.title),
            ("description", &self.description),
            ("category", &self.category),
            ("city", &self.city),
            ("region", &self.region),
            ("imageUrl", &self.image_url),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(ServiceError::Validation(format!("{name} is required")));
            }
        }
        if self.title.trim().chars().count() > MAX_TITLE_CHARS {
            return Err(ServiceError::Validation(format!(
                "title must be at most {MAX_TITLE_CHARS} characters"
            )));
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(ServiceError::Validation(
                "price must be a non-negative number".into(),
            ));
        }
        Ok(())
    }
}

/// Optional filters for the public feed. Absent filters are not applied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingFilter {
    pub category: Option<String>,
    pub city: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

/// limit/offset window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: u64,
    pub offset: u64,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

impl Page {
    /// Lenient parse of raw query values.
    ///
    /// Missing, unparsable or non-positive limits fall back to the default and
    /// large ones are capped; a bad or negative offset becomes zero.
    pub fn parse(limit: Option<&str>, offset: Option<&str>) -> Self {
        let limit = limit
            .and_then(|v| v.trim().parse::<i64>().ok())
            .filter(|&v| v > 0)
            .map(|v| (v as u64).min(MAX_LIMIT))
            .unwrap_or(DEFAULT_LIMIT);
        let offset = offset
            .and_then(|v| v.trim().parse::<i64>().ok())
            .filter(|&v| v >= 0)
            .map(|v| v as u64)
            .unwrap_or(0);
        Self { limit, offset }
    }
}

/// Relational persistence for listings and their moderation state machine.
pub struct ListingStore<'a, C> {
    conn: &'a C,
}

impl<'a, C> ListingStore<'a, C>
where
    C: ConnectionTrait + TransactionTrait<Transaction = DatabaseTransaction>,
{
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    /// Insert a new listing. Status always starts as `pending`.
    pub async fn create(&self, draft: ListingDraft) -> ServiceResult<listing::Model> {
        draft.validate()?;

        let now = Utc::now();
        let model = listing::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            owner_id: Set(draft.owner_id.trim().to_string()),
            device_id: Set(draft.device_id.trim().to_string()),
            title: Set(draft.title.trim().to_string()),
            description: Set(draft.description),
            price: Set(draft.price),
            category: Set(draft.category.trim().to_string()),
            city: Set(draft.city.trim().to_string()),
            region: Set(draft.region.trim().to_string()),
            image_url: Set(draft.image_url.trim().to_string()),
            status: Set(ListingStatus::Pending.as_str().to_string()),
            listing_type: Set(draft.listing_type.as_str().to_string()),
            average_rating: Set(0.0),
            photo_ref: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(self.conn)
        .await?;

        info!(listing_id = %model.id, "Listing created");
        Ok(model)
    }

    pub async fn find(&self, id: &str) -> ServiceResult<listing::Model> {
        listing::Entity::find_by_id(id.to_string())
            .one(self.conn)
            .await?
            .ok_or_else(|| not_found(id))
    }

    /// Overwrite the editable fields of an existing listing.
    ///
    /// An unknown id is reported before the draft is validated.
    pub async fn update(&self, id: &str, draft: ListingDraft) -> ServiceResult<listing::Model> {
        let txn = self.conn.begin().await?;
        let existing = find_for_update(&txn, id).await?;
        draft.validate()?;
        let updated_at = next_timestamp(existing.updated_at);

        let mut active: listing::ActiveModel = existing.into();
        active.owner_id = Set(draft.owner_id.trim().to_string());
        active.device_id = Set(draft.device_id.trim().to_string());
        active.title = Set(draft.title.trim().to_string());
        active.description = Set(draft.description);
        active.price = Set(draft.price);
        active.category = Set(draft.category.trim().to_string());
        active.city = Set(draft.city.trim().to_string());
        active.region = Set(draft.region.trim().to_string());
        active.image_url = Set(draft.image_url.trim().to_string());
        active.listing_type = Set(draft.listing_type.as_str().to_string());
        active.updated_at = Set(updated_at);

        let model = active.update(&txn).await?;
        txn.commit().await?;

        info!(listing_id = %model.id, "Listing updated");
        Ok(model)
    }

    pub async fn approve(&self, id: &str) -> ServiceResult<listing::Model> {
        self.moderate(id, ListingStatus::Approved).await
    }

    pub async fn reject(&self, id: &str) -> ServiceResult<listing::Model> {
        self.moderate(id, ListingStatus::Rejected).await
    }

    /// Move a pending listing to `target`.
    ///
    /// Repeating the decision already taken is a no-op; reversing it is a conflict.
    async fn moderate(&self, id: &str, target: ListingStatus) -> ServiceResult<listing::Model> {
        let txn = self.conn.begin().await?;
        let existing = find_for_update(&txn, id).await?;
        let current = status_of(&existing)?;

        if current == target {
            txn.commit().await?;
            return Ok(existing);
        }
        if current != ListingStatus::Pending {
            return Err(ServiceError::Conflict(format!(
                "Listing is already {current}"
            )));
        }

        let updated_at = next_timestamp(existing.updated_at);
        let mut active: listing::ActiveModel = existing.into();
        active.status = Set(target.as_str().to_string());
        active.updated_at = Set(updated_at);

        let model = active.update(&txn).await?;
        txn.commit().await?;

        info!(listing_id = %model.id, from = %current, to = %target, "Listing moderated");
        Ok(model)
    }

    /// Remove the listing together with its reviews and photo records.
    ///
    /// Photo bytes stay in the blob store.
    pub async fn delete(&self, id: &str) -> ServiceResult<listing::Model> {
        let txn = self.conn.begin().await?;
        let existing = find_for_update(&txn, id).await?;

        review::Entity::delete_many()
            .filter(review::Column::ListingId.eq(id))
            .exec(&txn)
            .await?;
        listing_photo::Entity::delete_many()
            .filter(listing_photo::Column::ListingId.eq(id))
            .exec(&txn)
            .await?;
        listing::Entity::delete_by_id(id.to_string())
            .exec(&txn)
            .await?;

        txn.commit().await?;

        info!(listing_id = %id, "Listing deleted");
        Ok(existing)
    }

    /// Approved listings, newest first, all filters ANDed.
    pub async fn list_approved(
        &self,
        filter: &ListingFilter,
        page: Page,
    ) -> ServiceResult<Vec<listing::Model>> {
        let mut select = listing::Entity::find()
            .filter(listing::Column::Status.eq(ListingStatus::Approved.as_str()));

        if let Some(category) = &filter.category {
            select = select.filter(listing::Column::Category.eq(category.as_str()));
        }
        if let Some(city) = &filter.city {
            select = select.filter(listing::Column::City.eq(city.as_str()));
        }
        if let Some(min) = filter.min_price {
            select = select.filter(listing::Column::Price.gte(min));
        }
        if let Some(max) = filter.max_price {
            select = select.filter(listing::Column::Price.lte(max));
        }

        Ok(select
            .order_by_desc(listing::Column::CreatedAt)
            .order_by_desc(listing::Column::Id)
            .offset(Some(page.offset))
            .limit(Some(page.limit))
            .all(self.conn)
            .await?)
    }

    /// The moderation queue, newest first.
    pub async fn list_pending(&self, page: Page) -> ServiceResult<Vec<listing::Model>> {
        Ok(listing::Entity::find()
            .filter(listing::Column::Status.eq(ListingStatus::Pending.as_str()))
            .order_by_desc(listing::Column::CreatedAt)
            .order_by_desc(listing::Column::Id)
            .offset(Some(page.offset))
            .limit(Some(page.limit))
            .all(self.conn)
            .await?)
    }
}

/// Load a listing and hold its row lock until `txn` ends.
///
/// Every write to a listing row goes through here first, which serialises
/// writers per listing across all server instances.
pub(crate) async fn find_for_update(
    txn: &DatabaseTransaction,
    id: &str,
) -> ServiceResult<listing::Model> {
    listing::Entity::find_by_id(id.to_string())
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or_else(|| not_found(id))
}

/// `updated_at` for a mutation; never earlier than the previous value.
pub(crate) fn next_timestamp(previous: DateTime<Utc>) -> DateTime<Utc> {
    Utc::now().max(previous)
}

pub(crate) fn status_of(model: &listing::Model) -> ServiceResult<ListingStatus> {
    model
        .status
        .parse()
        .map_err(|e: String| ServiceError::Dependency(format!("listing {}: {e}", model.id)))
}

fn not_found(id: &str) -> ServiceError {
    ServiceError::NotFound(format!("Listing {id} not found"))
}
