use std::time::Duration;

use sea_orm::sea_query::{Index, IndexCreateStatement, PostgresQueryBuilder, SqliteQueryBuilder};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbBackend, DbErr};
use tracing::{info, warn};

use crate::config::DatabaseConfig;
use crate::entity::{listing, review};

/// Connect the process-wide pool and bring the schema up to date.
pub async fn init_db(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(config.url.to_owned());

    opt.max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .sqlx_logging(config.log_queries);

    let db = Database::connect(opt).await?;
    db.get_schema_registry("listing_service::entity::*")
        .sync(&db)
        .await?;

    Ok(db)
}

/// Ensure the composite indexes used by the hot queries exist.
///
/// Schema sync only creates single-column indexes, so these are created by hand.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    // SELECT ... FROM listings WHERE status = ? ORDER BY created_at DESC
    let listing_feed = Index::create()
        .if_not_exists()
        .name("idx_listings_status_created")
        .table(listing::Entity)
        .col(listing::Column::Status)
        .col(listing::Column::CreatedAt)
        .to_owned();

    // SELECT ... FROM reviews WHERE listing_id = ? ORDER BY created_at DESC
    let review_feed = Index::create()
        .if_not_exists()
        .name("idx_reviews_listing_created")
        .table(review::Entity)
        .col(review::Column::ListingId)
        .col(review::Column::CreatedAt)
        .to_owned();

    for stmt in [listing_feed, review_feed] {
        let sql = render_index(db.get_database_backend(), &stmt);
        match db.execute_unprepared(&sql).await {
            Ok(_) => info!("Ensured index: {sql}"),
            Err(e) => warn!("Failed to create index ({sql}): {e}"),
        }
    }

    Ok(())
}

fn render_index(backend: DbBackend, stmt: &IndexCreateStatement) -> String {
    match backend {
        DbBackend::Sqlite => stmt.to_string(SqliteQueryBuilder),
        _ => stmt.to_string(PostgresQueryBuilder),
    }
}
