pub mod admin;
pub mod events;
pub mod health;
pub mod notifications;
pub mod public;
pub mod tracking;

use axum::http::HeaderMap;

use crate::db::queries;
use crate::errors::AppError;
use crate::services::session::SessionClaims;
use crate::state::AppState;

fn bearer_token(headers: &HeaderMap) -> &str {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .unwrap_or("")
}

/// Checks a session token's signature, expiry and revocation.
pub(crate) fn authorize(state: &AppState, token: &str) -> Result<SessionClaims, AppError> {
    let claims = state.sessions.verify(token.trim()).map_err(|e| {
        tracing::debug!(error = %e, "rejected admin session");
        AppError::Unauthorized
    })?;

    let revoked = {
        let db = state.db()?;
        queries::is_session_revoked(&db, &claims.nonce)?
    };
    if revoked {
        return Err(AppError::Unauthorized);
    }

    Ok(claims)
}

pub(crate) fn require_admin(state: &AppState, headers: &HeaderMap) -> Result<SessionClaims, AppError> {
    authorize(state, bearer_token(headers))
}
