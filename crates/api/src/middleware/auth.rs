//! Operator authentication extractor for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use cadenza_core::error::CoreError;

use crate::auth::jwt::{validate_token, ROLE_ADMIN, ROLE_OPERATOR};
use crate::error::AppError;
use crate::state::AppState;

/// Operator extracted from a JWT Bearer token in the `Authorization` header.
///
/// Rejects with 401 when the token is missing or invalid and with 403 when
/// the role is neither `operator` nor `admin`.
#[derive(Debug, Clone)]
pub struct OperatorUser {
    pub subject: String,
    pub role: String,
}

impl FromRequestParts<AppState> for OperatorUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized(
                    "Missing Authorization header".into(),
                ))
            })?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Invalid Authorization format. Expected: Bearer <token>".into(),
            ))
        })?;

        let claims = validate_token(token, &state.config.jwt).map_err(|_| {
            AppError::Core(CoreError::Unauthorized("Invalid or expired token".into()))
        })?;

        if claims.role != ROLE_OPERATOR && claims.role != ROLE_ADMIN {
            return Err(AppError::Core(CoreError::Forbidden(
                "Operator role required".into(),
            )));
        }

        Ok(OperatorUser {
            subject: claims.sub,
            role: claims.role,
        })
    }
}
