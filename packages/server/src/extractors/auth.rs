use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::config::AuthConfig;
use crate::error::AppError;
use crate::services::identity::Credential;
use crate::state::AppState;
use crate::utils::jwt;

/// Authenticated caller extracted from the `Authorization: Bearer <token>` header.
///
/// Add this as a handler parameter to require authentication.
/// Role checks happen in the handler body.
pub struct AuthUser {
    pub user_id: String,
    pub roles: Vec<String>,
    /// The header exactly as received, for forwarding to remote services.
    pub credential: Credential,
}

impl AuthUser {
    pub fn is_moderator(&self, config: &AuthConfig) -> bool {
        self.roles.iter().any(|r| r == &config.moderator_role)
    }

    /// Returns `Ok(())` for moderators, `Err(PermissionDenied)` otherwise.
    pub fn require_moderator(&self, config: &AuthConfig) -> Result<(), AppError> {
        if self.is_moderator(config) {
            Ok(())
        } else {
            Err(AppError::PermissionDenied)
        }
    }

    /// Owners may manage their own listings; moderators may manage any.
    pub fn require_owner_or_moderator(
        &self,
        owner_id: &str,
        config: &AuthConfig,
    ) -> Result<(), AppError> {
        if self.user_id == owner_id || self.is_moderator(config) {
            Ok(())
        } else {
            Err(AppError::PermissionDenied)
        }
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::TokenMissing)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AppError::TokenInvalid)?;

        let claims = jwt::verify(token, state.config.auth.jwt_secret.as_bytes())
            .map_err(|_| AppError::TokenInvalid)?;

        Ok(AuthUser {
            user_id: claims.sub,
            roles: claims.roles.into_vec(),
            credential: Credential::new(auth_header),
        })
    }
}
