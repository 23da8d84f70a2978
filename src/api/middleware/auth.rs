//! Bearer session authentication middleware.
//!
//! Extracts `Authorization: Bearer <token>`, resolves it against the
//! `sessions` table, and injects `SessionContext` into request extensions
//! for downstream handlers. Expired sessions are deleted on sight.

use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::api::error::ApiError;
use crate::api::types::{bearer_token, hash_token, ApiContext, SessionContext};
use crate::db;
use crate::models::timestamp;

/// Require a live session.
///
/// Accesses `ApiContext` from request extensions (injected by Extension layer).
pub async fn require_session(req: Request<axum::body::Body>, next: Next) -> Response {
    match require_session_inner(req, next).await {
        Ok(resp) => resp,
        Err(err) => err.into_response(),
    }
}

async fn require_session_inner(
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let ctx: ApiContext = req
        .extensions()
        .get::<ApiContext>()
        .cloned()
        .ok_or(ApiError::Internal("missing API context".into()))?;

    let token_hash = bearer_token(req.headers())
        .map(hash_token)
        .ok_or_else(|| ApiError::Unauthorized("Authentication required".into()))?;

    let session = resolve_session(&ctx, &token_hash)?;
    req.extensions_mut().insert(session);

    Ok(next.run(req).await)
}

/// Resolve a token hash to the session's user.
pub fn resolve_session(ctx: &ApiContext, token_hash: &[u8; 32]) -> Result<SessionContext, ApiError> {
    let invalid = || ApiError::Unauthorized("Invalid or expired session".into());

    let conn = ctx.core.open_db()?;
    let session = db::get_session(&conn, token_hash)?.ok_or_else(invalid)?;

    if session.is_expired(timestamp::now()) {
        db::delete_session(&conn, token_hash)?;
        tracing::debug!(user_id = %session.user_id, "Expired session rejected");
        return Err(invalid());
    }

    // A session whose user no longer exists is invalid.
    let user = db::get_user(&conn, &session.user_id)?.ok_or_else(invalid)?;

    Ok(SessionContext {
        user_id: user.id,
        user_type: user.user_type,
        token_hash: *token_hash,
    })
}
