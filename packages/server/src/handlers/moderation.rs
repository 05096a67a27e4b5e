use axum::Json;
use axum::extract::{Path, Query, State};
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::models::listing::ListingResponse;
use crate::models::shared::PageQuery;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/moderation/listings",
    tag = "Moderation",
    operation_id = "listPendingListings",
    summary = "List listings awaiting moderation",
    description = "Pending listings, newest first. Moderators only.",
    params(PageQuery),
    responses(
        (status = 200, description = "Pending listings", body = Vec<ListingResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn list_pending(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Vec<ListingResponse>>, AppError> {
    auth_user.require_moderator(&state.config.auth)?;

    let listings = state.coordinator().list_pending(query.page()).await?;
    Ok(Json(listings.into_iter().map(ListingResponse::from).collect()))
}

#[utoipa::path(
    put,
    path = "/moderation/listings/{id}/approve",
    tag = "Moderation",
    operation_id = "approveListing",
    summary = "Approve a pending listing",
    description = "Approving an approved listing is a no-op. Approving a rejected listing is a \
        conflict. Moderators only.",
    params(("id" = String, Path, description = "Listing ID")),
    responses(
        (status = 200, description = "Listing approved", body = ListingResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Listing not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Listing already rejected (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn approve_listing(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ListingResponse>, AppError> {
    auth_user.require_moderator(&state.config.auth)?;

    let listing = state.coordinator().approve_listing(&id).await?;
    Ok(Json(listing.into()))
}

#[utoipa::path(
    put,
    path = "/moderation/listings/{id}/reject",
    tag = "Moderation",
    operation_id = "rejectListing",
    summary = "Reject a pending listing",
    description = "Rejecting a rejected listing is a no-op. Rejecting an approved listing is a \
        conflict. Moderators only.",
    params(("id" = String, Path, description = "Listing ID")),
    responses(
        (status = 200, description = "Listing rejected", body = ListingResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Listing not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Listing already approved (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn reject_listing(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ListingResponse>, AppError> {
    auth_user.require_moderator(&state.config.auth)?;

    let listing = state.coordinator().reject_listing(&id).await?;
    Ok(Json(listing.into()))
}
