use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::listing::{ListingListQuery, ListingRequest, ListingResponse};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/listings",
    tag = "Listings",
    operation_id = "listListings",
    summary = "List approved listings",
    description = "Returns approved listings only, newest first. All filters are optional and \
        combined with AND. Unparsable price bounds are ignored; `limit` defaults to 10 (max 100) \
        and `offset` to 0.",
    params(ListingListQuery),
    responses(
        (status = 200, description = "Approved listings", body = Vec<ListingResponse>),
        (status = 503, description = "Store unavailable (DEPENDENCY_UNAVAILABLE)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn list_listings(
    State(state): State<AppState>,
    Query(query): Query<ListingListQuery>,
) -> Result<Json<Vec<ListingResponse>>, AppError> {
    let listings = state
        .coordinator()
        .list_approved(&query.filter(), query.page())
        .await?;

    Ok(Json(listings.into_iter().map(ListingResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/listings",
    tag = "Listings",
    operation_id = "createListing",
    summary = "Create a listing",
    description = "Checks the owner and device against their remote services, forwarding the \
        caller's token, before anything is stored. New listings always start as `pending`.",
    request_body = ListingRequest,
    responses(
        (status = 201, description = "Listing created", body = ListingResponse),
        (status = 400, description = "Invalid body, or owner/device not found (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 503, description = "Remote service or store unavailable (DEPENDENCY_UNAVAILABLE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = %auth_user.user_id))]
pub async fn create_listing(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<ListingRequest>,
) -> Result<impl IntoResponse, AppError> {
    let listing = state
        .coordinator()
        .create_listing(payload.into(), &auth_user.credential)
        .await?;

    Ok((StatusCode::CREATED, Json(ListingResponse::from(listing))))
}

#[utoipa::path(
    get,
    path = "/listings/{id}",
    tag = "Listings",
    operation_id = "getListing",
    summary = "Get a listing by ID",
    params(("id" = String, Path, description = "Listing ID")),
    responses(
        (status = 200, description = "Listing", body = ListingResponse),
        (status = 404, description = "Listing not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_listing(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ListingResponse>, AppError> {
    let listing = state.coordinator().get_listing(&id).await?;
    Ok(Json(listing.into()))
}

#[utoipa::path(
    put,
    path = "/listings/{id}",
    tag = "Listings",
    operation_id = "updateListing",
    summary = "Replace a listing's editable fields",
    description = "Owner or moderator only. Owner and device are re-checked remotely. Status and \
        average rating cannot be changed here.",
    params(("id" = String, Path, description = "Listing ID")),
    request_body = ListingRequest,
    responses(
        (status = 200, description = "Listing updated", body = ListingResponse),
        (status = 400, description = "Invalid body, or owner/device not found (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Listing not found (NOT_FOUND)", body = ErrorBody),
        (status = 503, description = "Remote service or store unavailable (DEPENDENCY_UNAVAILABLE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = %auth_user.user_id))]
pub async fn update_listing(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(payload): AppJson<ListingRequest>,
) -> Result<Json<ListingResponse>, AppError> {
    let coordinator = state.coordinator();
    let current = coordinator.get_listing(&id).await?;
    auth_user.require_owner_or_moderator(&current.owner_id, &state.config.auth)?;

    let listing = coordinator
        .update_listing(&id, payload.into(), &auth_user.credential)
        .await?;

    Ok(Json(listing.into()))
}

#[utoipa::path(
    delete,
    path = "/listings/{id}",
    tag = "Listings",
    operation_id = "deleteListing",
    summary = "Delete a listing",
    description = "Owner or moderator only. Removes the listing with its reviews and photo \
        record. Stored photo bytes are kept.",
    params(("id" = String, Path, description = "Listing ID")),
    responses(
        (status = 204, description = "Listing deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Listing not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn delete_listing(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let coordinator = state.coordinator();
    let current = coordinator.get_listing(&id).await?;
    auth_user.require_owner_or_moderator(&current.owner_id, &state.config.auth)?;

    coordinator.delete_listing(&id).await?;

    Ok(StatusCode::NO_CONTENT)
}
