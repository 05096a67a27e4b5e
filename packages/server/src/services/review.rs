use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseTransaction, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use tracing::{error, info};

use super::error::{ServiceError, ServiceResult};
use super::listing::find_for_update;
use crate::entity::{listing, review};

pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 5;

/// Mean rounded half-up to two decimals; zero for no reviews.
///
/// Rounds in integer hundredths so exact half-cent means go up.
pub fn average_rating(sum: i64, count: i64) -> f64 {
    if count <= 0 {
        return 0.0;
    }
    let hundredths = (sum * 200 + count).div_euclid(2 * count);
    hundredths as f64 / 100.0
}

/// Review persistence plus the materialised `listings.average_rating`.
pub struct ReviewAggregator<'a, C> {
    conn: &'a C,
}

impl<'a, C> ReviewAggregator<'a, C>
where
    C: ConnectionTrait + TransactionTrait<Transaction = DatabaseTransaction>,
{
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    /// Insert a review and recompute the listing's average in the same transaction.
    ///
    /// The listing row lock is held from the existence check to commit, so two
    /// inserts on the same listing recompute strictly one after the other and
    /// each sees the other's row. If the recompute fails the insert rolls back.
    pub async fn insert(
        &self,
        listing_id: &str,
        user_id: &str,
        rating: i32,
        comment: &str,
    ) -> ServiceResult<review::Model> {
        let txn = self.conn.begin().await?;
        let listing = find_for_update(&txn, listing_id).await?;

        if !(MIN_RATING..=MAX_RATING).contains(&rating) {
            return Err(ServiceError::Validation(format!(
                "rating must be between {MIN_RATING} and {MAX_RATING}"
            )));
        }
        if comment.trim().is_empty() {
            return Err(ServiceError::Validation("comment is required".into()));
        }
        if user_id.trim().is_empty() {
            return Err(ServiceError::Validation("userId is required".into()));
        }

        let created = review::ActiveModel {
            listing_id: Set(listing.id.clone()),
            user_id: Set(user_id.to_string()),
            rating: Set(rating),
            comment: Set(comment.trim().to_string()),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let (sum, count) = review::Entity::find()
            .select_only()
            .column_as(review::Column::Rating.sum(), "rating_sum")
            .column_as(review::Column::Id.count(), "rating_count")
            .filter(review::Column::ListingId.eq(listing.id.as_str()))
            .into_tuple::<(Option<i64>, i64)>()
            .one(&txn)
            .await?
            .unwrap_or((None, 0));
        let average = average_rating(sum.unwrap_or(0), count);

        let mut active: listing::ActiveModel = listing.into();
        active.average_rating = Set(average);
        if let Err(e) = active.update(&txn).await {
            error!(listing_id, "Failed to store recomputed average rating: {e}");
            return Err(e.into());
        }

        txn.commit().await?;

        info!(
            listing_id,
            review_id = created.id,
            rating,
            average,
            reviews = count,
            "Review recorded"
        );
        Ok(created)
    }

    /// All reviews for a listing, newest first.
    pub async fn list(&self, listing_id: &str) -> ServiceResult<Vec<review::Model>> {
        listing::Entity::find_by_id(listing_id.to_string())
            .one(self.conn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Listing {listing_id} not found")))?;

        Ok(review::Entity::find()
            .filter(review::Column::ListingId.eq(listing_id))
            .order_by_desc(review::Column::CreatedAt)
            .order_by_desc(review::Column::Id)
            .all(self.conn)
            .await?)
    }
}
