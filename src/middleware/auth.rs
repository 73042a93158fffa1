use crate::error::Error;
use crate::models::user::User;
use crate::AppState;
use axum::{extract::FromRequestParts, http::request::Parts};

/// Caller identity resolved from the opaque `Authorization: Bearer` token.
/// Token issuance lives with the external auth collaborator; the engine
/// only maps a token back to its user and hands that user to the services
/// explicitly.
pub struct AuthUser(pub User);

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .ok_or_else(|| Error::Unauthorized("Missing Authorization header".to_string()))?;

        let auth_str = auth_header
            .to_str()
            .map_err(|_| Error::Unauthorized("Malformed Authorization header".to_string()))?;

        let token = auth_str
            .strip_prefix("Bearer ")
            .ok_or_else(|| Error::Unauthorized("Unsupported authorization scheme".to_string()))?;

        let user = state
            .store
            .find_user_by_token(token)
            .await
            .ok_or_else(|| Error::Unauthorized("Invalid token".to_string()))?;

        Ok(AuthUser(user))
    }
}
