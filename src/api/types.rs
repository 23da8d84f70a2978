//! Shared types for the HTTP API layer.

use std::sync::Arc;

use axum::extract::{FromRequest, FromRequestParts};
use axum::http::HeaderMap;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::core_state::CoreState;
use crate::models::UserType;

// ═══════════════════════════════════════════════════════════
// API context: shared state for the router
// ═══════════════════════════════════════════════════════════

/// Shared context for all API routes and middleware.
#[derive(Clone)]
pub struct ApiContext {
    pub core: Arc<CoreState>,
}

impl ApiContext {
    pub fn new(core: Arc<CoreState>) -> Self {
        Self { core }
    }
}

// ═══════════════════════════════════════════════════════════
// Session context, injected by auth middleware
// ═══════════════════════════════════════════════════════════

/// Authenticated caller, injected into request extensions by the auth
/// middleware after the bearer token resolved to a live session.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub user_id: Uuid,
    pub user_type: UserType,
    pub token_hash: [u8; 32],
}

impl SessionContext {
    /// The caller must be the doctor identified by `doctor_id`.
    pub fn ensure_doctor(&self, doctor_id: &Uuid) -> Result<(), ApiError> {
        if self.user_type != UserType::Doctor {
            return Err(ApiError::Forbidden("Only doctors can do this".into()));
        }
        if &self.user_id != doctor_id {
            return Err(ApiError::Forbidden(
                "doctorId does not match the signed-in doctor".into(),
            ));
        }
        Ok(())
    }

    /// The caller must be the user identified by `user_id`.
    pub fn ensure_self(&self, user_id: &Uuid) -> Result<(), ApiError> {
        if &self.user_id != user_id {
            return Err(ApiError::Forbidden("You can only modify your own profile".into()));
        }
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════
// Bearer tokens
// ═══════════════════════════════════════════════════════════

/// Hash a bearer token string using SHA-256.
pub fn hash_token(token: &str) -> [u8; 32] {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hasher.finalize().into()
}

/// Generate a random bearer token (URL-safe base64, 32 bytes of entropy).
pub fn generate_token() -> String {
    use base64::Engine;
    let bytes: [u8; 32] = rand::random();
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// Token from an `Authorization: Bearer <token>` header, if present.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

// ═══════════════════════════════════════════════════════════
// Extractors and input helpers
// ═══════════════════════════════════════════════════════════

/// JSON body extractor whose rejections become `400 {message}`.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Query string extractor whose rejections become `400 {message}`.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// Parse an id from a path segment or body field.
pub fn parse_id(raw: &str, field: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::BadRequest(format!("Invalid {field}")))
}

/// Required id field from a request body.
pub fn required_id(raw: Option<&str>, field: &str) -> Result<Uuid, ApiError> {
    match raw {
        Some(raw) if !raw.trim().is_empty() => parse_id(raw, field),
        _ => Err(ApiError::BadRequest(format!("{field} is required"))),
    }
}

/// Required non-blank text field, trimmed.
pub fn required_text(raw: Option<String>, field: &str) -> Result<String, ApiError> {
    match raw.map(|s| s.trim().to_string()) {
        Some(s) if !s.is_empty() => Ok(s),
        _ => Err(ApiError::BadRequest(format!("{field} is required"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn hash_token_deterministic() {
        let h1 = hash_token("test-token");
        let h2 = hash_token("test-token");
        assert_eq!(h1, h2);
        assert_ne!(h1, hash_token("other-token"));
    }

    #[test]
    fn generate_token_unique() {
        let t1 = generate_token();
        let t2 = generate_token();
        assert_ne!(t1, t2);
        assert_eq!(t1.len(), 43);
    }

    #[test]
    fn bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert("Authorization", HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert("Authorization", HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);

        headers.insert("Authorization", HeaderValue::from_static("Bearer abc123"));
        assert_eq!(bearer_token(&headers), Some("abc123"));
    }

    #[test]
    fn parse_id_rejects_garbage() {
        let id = Uuid::new_v4();
        assert_eq!(parse_id(&id.to_string(), "userId").unwrap(), id);
        let err = parse_id("not-an-id", "userId").unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(m) if m == "Invalid userId"));
    }

    #[test]
    fn required_fields() {
        assert!(matches!(
            required_id(None, "patientId"),
            Err(ApiError::BadRequest(m)) if m == "patientId is required"
        ));
        assert!(required_id(Some("  "), "patientId").is_err());
        assert_eq!(required_text(Some("  walk  ".into()), "task").unwrap(), "walk");
        assert!(required_text(Some("   ".into()), "task").is_err());
        assert!(required_text(None, "task").is_err());
    }

    fn session(user_type: UserType) -> SessionContext {
        SessionContext {
            user_id: Uuid::new_v4(),
            user_type,
            token_hash: [0u8; 32],
        }
    }

    #[test]
    fn doctor_role_checks() {
        let doctor = session(UserType::Doctor);
        assert!(doctor.ensure_doctor(&doctor.user_id).is_ok());
        assert!(matches!(
            doctor.ensure_doctor(&Uuid::new_v4()),
            Err(ApiError::Forbidden(_))
        ));

        let patient = session(UserType::Patient);
        assert!(matches!(
            patient.ensure_doctor(&patient.user_id),
            Err(ApiError::Forbidden(_))
        ));
    }

    #[test]
    fn self_check() {
        let user = session(UserType::Patient);
        assert!(user.ensure_self(&user.user_id).is_ok());
        assert!(user.ensure_self(&Uuid::new_v4()).is_err());
    }
}
