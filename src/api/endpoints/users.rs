//! User profile endpoints.
//!
//! - `GET /api/user/:id`: profile without the password hash
//! - `PUT /api/user/:id`: partial profile update

use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde::Deserialize;

use crate::api::endpoints::auth::{normalize_email, parse_user_type, validate_password};
use crate::api::error::ApiError;
use crate::api::types::{parse_id, ApiContext, ApiJson, SessionContext};
use crate::db::{self, DatabaseError};
use crate::models::{timestamp, User, UserStatus, UserUpdate};

/// Updatable profile fields. Anything else in the body (`_id`, `createdAt`,
/// `updatedAt`) is ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub doctor_name: Option<String>,
    pub user_type: Option<String>,
    pub status: Option<String>,
    pub date_of_birth: Option<String>,
    pub blood_group: Option<String>,
    pub gender: Option<String>,
    pub allergies: Option<Vec<String>>,
    pub medical_history: Option<String>,
    pub conditions: Option<Vec<String>>,
}

/// `GET /api/user/:id`
pub async fn get(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<User>, ApiError> {
    let id = parse_id(&id, "user id")?;
    let user = db::get_user(&ctx.core.open_db()?, &id)?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;
    Ok(Json(user))
}

/// `PUT /api/user/:id`: merge the supplied fields into the profile.
pub async fn update(
    State(ctx): State<ApiContext>,
    session: Option<Extension<SessionContext>>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<UpdateUserRequest>,
) -> Result<Json<User>, ApiError> {
    let id = parse_id(&id, "user id")?;
    if let Some(Extension(session)) = &session {
        session.ensure_self(&id)?;
    }

    let password = body.password.clone();
    let mut update = to_update(body)?;
    if password.is_some() {
        let password = validate_password(password)?;
        update.password_hash = Some(ctx.core.hash_password(password).await?);
    }

    let mut conn = ctx.core.open_db()?;
    let user = match db::update_user(&mut conn, &id, &update, timestamp::now()) {
        Ok(Some(user)) => user,
        Ok(None) => return Err(ApiError::NotFound("User not found".into())),
        Err(DatabaseError::ConstraintViolation(_)) => {
            return Err(ApiError::BadRequest("Email already in use".into()))
        }
        Err(e) => return Err(e.into()),
    };

    tracing::info!(
        user_id = %user.id,
        password_changed = update.password_hash.is_some(),
        "User profile updated"
    );
    Ok(Json(user))
}

/// Validate the request fields and convert them into a storage update.
/// The password is handled by the caller since hashing is async.
fn to_update(body: UpdateUserRequest) -> Result<UserUpdate, ApiError> {
    let full_name = match body.full_name {
        Some(name) if name.trim().is_empty() => {
            return Err(ApiError::BadRequest("fullName cannot be empty".into()))
        }
        other => other.map(|n| n.trim().to_string()),
    };
    let email = body.email.as_deref().map(normalize_email).transpose()?;
    let user_type = body.user_type.as_deref().map(parse_user_type).transpose()?;
    let status = body
        .status
        .as_deref()
        .map(|s| {
            s.trim().parse::<UserStatus>().map_err(|_| {
                ApiError::BadRequest("status must be active, inactive or critical".into())
            })
        })
        .transpose()?;

    Ok(UserUpdate {
        full_name,
        email,
        password_hash: None,
        doctor_name: body.doctor_name.map(|n| n.trim().to_string()),
        user_type,
        status,
        date_of_birth: body.date_of_birth,
        blood_group: body.blood_group,
        gender: body.gender,
        allergies: body.allergies,
        medical_history: body.medical_history,
        conditions: body.conditions,
    })
}
