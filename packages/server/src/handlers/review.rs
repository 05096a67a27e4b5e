use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::review::{CreateReviewRequest, ReviewResponse};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/listings/{id}/reviews",
    tag = "Reviews",
    operation_id = "listReviews",
    summary = "List reviews of a listing",
    description = "All reviews, newest first.",
    params(("id" = String, Path, description = "Listing ID")),
    responses(
        (status = 200, description = "Reviews", body = Vec<ReviewResponse>),
        (status = 404, description = "Listing not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn list_reviews(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<ReviewResponse>>, AppError> {
    let reviews = state.coordinator().list_reviews(&id).await?;
    Ok(Json(reviews.into_iter().map(ReviewResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/listings/{id}/reviews",
    tag = "Reviews",
    operation_id = "createReview",
    summary = "Review a listing",
    description = "Stores the review and recomputes the listing's average rating atomically.",
    params(("id" = String, Path, description = "Listing ID")),
    request_body = CreateReviewRequest,
    responses(
        (status = 201, description = "Review created", body = ReviewResponse),
        (status = 400, description = "Rating out of range or empty comment (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Listing not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = %auth_user.user_id))]
pub async fn create_review(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(payload): AppJson<CreateReviewRequest>,
) -> Result<impl IntoResponse, AppError> {
    let review = state
        .coordinator()
        .add_review(&id, &auth_user.user_id, payload.rating, &payload.comment)
        .await?;

    Ok((StatusCode::CREATED, Json(ReviewResponse::from(review))))
}
