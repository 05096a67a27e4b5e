use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::config::AppConfig;
use crate::handlers;
use crate::state::AppState;

pub fn routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .merge(listing_routes())
        .merge(review_routes())
        .merge(photo_routes(config.storage.max_photo_size))
        .merge(moderation_routes())
        .routes(routes!(handlers::health::health))
}

fn listing_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::listing::list_listings,
            handlers::listing::create_listing
        ))
        .routes(routes!(
            handlers::listing::get_listing,
            handlers::listing::update_listing,
            handlers::listing::delete_listing
        ))
}

fn review_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(
        handlers::review::list_reviews,
        handlers::review::create_review
    ))
}

fn photo_routes(max_photo_size: u64) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::photo::upload_photo,
            handlers::photo::download_photo
        ))
        .layer(handlers::photo::photo_upload_body_limit(max_photo_size))
}

fn moderation_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::moderation::list_pending))
        .routes(routes!(handlers::moderation::approve_listing))
        .routes(routes!(handlers::moderation::reject_listing))
}
