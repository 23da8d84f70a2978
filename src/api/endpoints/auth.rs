//! Account and session endpoints.
//!
//! - `POST /api/register`: create an account, returns a session token
//! - `POST /api/login`: check credentials, returns a session token
//! - `GET /api/session`: resolve the bearer token to its user
//! - `POST /api/logout`: revoke the bearer token

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use chrono::Duration;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::{generate_token, hash_token, required_text, ApiContext, ApiJson, SessionContext};
use crate::db::{self, DatabaseError};
use crate::models::{timestamp, NewUser, Session, User, UserType};

pub const MIN_PASSWORD_LENGTH: usize = 6;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub doctor_name: Option<String>,
    pub user_type: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub message: &'static str,
    pub user: User,
    pub token: String,
}

#[derive(Serialize)]
pub struct SessionResponse {
    pub user: User,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// `POST /api/register`: create a patient or doctor account.
pub async fn register(
    State(ctx): State<ApiContext>,
    ApiJson(body): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let full_name = required_text(body.full_name, "fullName")?;
    let email = normalize_email(&required_text(body.email, "email")?)?;
    let password = validate_password(body.password)?;
    let doctor_name = required_text(body.doctor_name, "doctorName")?;
    let user_type = parse_user_type(&required_text(body.user_type, "userType")?)?;

    if db::email_exists(&ctx.core.open_db()?, &email)? {
        return Err(ApiError::BadRequest("User already exists".into()));
    }

    let password_hash = ctx.core.hash_password(password).await?;

    let conn = ctx.core.open_db()?;
    let new_user = NewUser {
        id: Uuid::new_v4(),
        full_name,
        email,
        password_hash,
        doctor_name,
        user_type,
        created_at: timestamp::now(),
    };
    // A concurrent registration may have taken the email since the check above
    match db::insert_user(&conn, &new_user) {
        Err(DatabaseError::ConstraintViolation(_)) => {
            return Err(ApiError::BadRequest("User already exists".into()))
        }
        other => other?,
    }

    let user = db::get_user(&conn, &new_user.id)?
        .ok_or_else(|| ApiError::Internal("user missing after insert".into()))?;
    let token = issue_session(&ctx, &conn, &user.id)?;

    tracing::info!(user_id = %user.id, user_type = %user.user_type, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "User created successfully",
            user,
            token,
        }),
    ))
}

/// `POST /api/login`: verify credentials.
///
/// Unknown email and wrong password produce the same response and cost the
/// same hashing work.
pub async fn login(
    State(ctx): State<ApiContext>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let invalid = || ApiError::BadRequest("Invalid credentials".into());

    let (Some(email), Some(password)) = (body.email, body.password) else {
        return Err(ApiError::BadRequest("Email and password are required".into()));
    };
    let email = email.trim().to_lowercase();

    let credentials = db::get_credentials_by_email(&ctx.core.open_db()?, &email)?;
    let stored_hash = credentials.as_ref().map(|c| c.password_hash.clone());

    if !ctx.core.verify_password(password, stored_hash).await? {
        tracing::warn!("Login rejected");
        return Err(invalid());
    }
    let credentials = credentials.ok_or_else(invalid)?;

    let conn = ctx.core.open_db()?;
    let user = db::get_user(&conn, &credentials.user_id)?.ok_or_else(invalid)?;
    let token = issue_session(&ctx, &conn, &user.id)?;

    tracing::info!(user_id = %user.id, "Login successful");

    Ok(Json(AuthResponse {
        message: "Login successful",
        user,
        token,
    }))
}

/// `GET /api/session`: the user behind the bearer token.
pub async fn current(
    State(ctx): State<ApiContext>,
    Extension(session): Extension<SessionContext>,
) -> Result<Json<SessionResponse>, ApiError> {
    let user = db::get_user(&ctx.core.open_db()?, &session.user_id)?
        .ok_or_else(|| ApiError::Unauthorized("Invalid or expired session".into()))?;
    Ok(Json(SessionResponse { user }))
}

/// `POST /api/logout`: revoke the bearer token.
pub async fn logout(
    State(ctx): State<ApiContext>,
    Extension(session): Extension<SessionContext>,
) -> Result<Json<MessageResponse>, ApiError> {
    db::delete_session(&ctx.core.open_db()?, &session.token_hash)?;
    tracing::info!(user_id = %session.user_id, "Logged out");
    Ok(Json(MessageResponse {
        message: "Logged out",
    }))
}

/// Create a session row and return the plaintext token. Only the hash is stored.
fn issue_session(ctx: &ApiContext, conn: &Connection, user_id: &Uuid) -> Result<String, ApiError> {
    let token = generate_token();
    let now = timestamp::now();
    db::insert_session(
        conn,
        &Session {
            token_hash: hash_token(&token),
            user_id: *user_id,
            created_at: now,
            expires_at: now + Duration::hours(ctx.core.config.session_ttl_hours),
        },
    )?;
    Ok(token)
}

/// Trim and lower-case an email, rejecting obviously malformed ones.
pub(crate) fn normalize_email(raw: &str) -> Result<String, ApiError> {
    let email = raw.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() && !email.contains(' ') => {
            Ok(email)
        }
        _ => Err(ApiError::BadRequest("Invalid email address".into())),
    }
}

pub(crate) fn validate_password(raw: Option<String>) -> Result<String, ApiError> {
    let password = raw
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("password is required".into()))?;
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(password)
}

pub(crate) fn parse_user_type(raw: &str) -> Result<UserType, ApiError> {
    raw.trim()
        .parse()
        .map_err(|_| ApiError::BadRequest("userType must be patient or doctor".into()))
}
