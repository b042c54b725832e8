/// User route handlers
///
/// Registration, login/logout (session cookie), team listing, profile and
/// password management, and the admin account controls.
///
/// Login and admin registration set an HTTP-only `token` cookie carrying
/// the session JWT; logout clears it. Non-browser clients may instead send
/// the token as an `Authorization: Bearer` header.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::Json,
};
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Extension,
};
use serde::Deserialize;
use serde_json::json;
use taskcrew_shared::auth::{
    jwt::{create_token, Claims},
    middleware::{AuthContext, SESSION_COOKIE},
    password::{hash_password, validate_password_strength, verify_password},
};
use taskcrew_shared::models::user::{CreateUser, UpdateProfile, User};
use uuid::Uuid;
use validator::Validate;

/// Session cookie lifetime, matching the JWT expiration
const COOKIE_MAX_AGE: i64 = taskcrew_shared::auth::jwt::SESSION_SECONDS;

/// Builds the Set-Cookie value carrying the session token
fn session_cookie(token: &str, secure: bool) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Strict; Max-Age={}",
        SESSION_COOKIE, token, COOKIE_MAX_AGE
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Builds the Set-Cookie value that clears the session
fn clear_session_cookie(secure: bool) -> String {
    let mut cookie = format!(
        "{}=; Path=/; HttpOnly; SameSite=Strict; Max-Age=0",
        SESSION_COOKIE
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Registration request body
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,

    #[validate(email(message = "Invalid email address"))]
    pub email: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters long"))]
    pub password: String,

    /// Defaults to the email local part when omitted
    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub role: Option<String>,

    #[serde(default)]
    pub is_admin: bool,
}

/// POST /api/user/register
///
/// Creates a user account. Registering an admin account also starts a
/// session, so a fresh deployment can bootstrap itself from the first
/// admin registration.
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> ApiResult<Response> {
    payload.validate()?;
    validate_password_strength(&payload.password).map_err(ApiError::BadRequest)?;

    let username = match payload.username {
        Some(username) if !username.trim().is_empty() => username.trim().to_string(),
        _ => payload
            .email
            .split('@')
            .next()
            .unwrap_or(&payload.email)
            .to_string(),
    };

    let password_hash = hash_password(&payload.password)?;

    let user = User::create(
        &state.db,
        CreateUser {
            username,
            name: payload.name,
            email: payload.email,
            password_hash,
            title: payload.title.unwrap_or_else(|| "Member".to_string()),
            role: payload.role.unwrap_or_else(|| "user".to_string()),
            is_admin: payload.is_admin,
        },
    )
    .await?;

    let user_id = user.id;
    let is_admin = user.is_admin;

    let body = Json(json!({
        "status": true,
        "message": "Account created successfully",
        "user": user,
    }));

    if is_admin {
        let claims = Claims::new(user_id, true);
        let token = create_token(&claims, state.jwt_secret())?;
        let cookie = session_cookie(&token, state.config.api.cookie_secure);

        return Ok((StatusCode::CREATED, [(header::SET_COOKIE, cookie)], body).into_response());
    }

    Ok((StatusCode::CREATED, body).into_response())
}

/// Login request body
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// POST /api/user/login
///
/// Verifies credentials and starts a session. Bad credentials and
/// deactivated accounts both answer 401; the deactivated case gets its own
/// message so the user knows to contact an administrator.
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Response> {
    payload.validate()?;

    let user = User::find_by_email(&state.db, &payload.email)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid email or password.".to_string()))?;

    if !user.is_active {
        return Err(ApiError::Unauthorized(
            "User account has been deactivated, contact the administrator".to_string(),
        ));
    }

    if !verify_password(&payload.password, &user.password_hash)? {
        return Err(ApiError::Unauthorized(
            "Invalid email or password.".to_string(),
        ));
    }

    let claims = Claims::new(user.id, user.is_admin);
    let token = create_token(&claims, state.jwt_secret())?;
    let cookie = session_cookie(&token, state.config.api.cookie_secure);

    let body = Json(json!({
        "status": true,
        "message": "Login successful",
        "user": user,
    }));

    Ok(([(header::SET_COOKIE, cookie)], body).into_response())
}

/// POST /api/user/logout
///
/// Clears the session cookie. Stateless on the server side: the JWT stays
/// valid until it expires, the browser just forgets it.
pub async fn logout(State(state): State<AppState>) -> Response {
    let cookie = clear_session_cookie(state.config.api.cookie_secure);

    let body = Json(json!({
        "status": true,
        "message": "Logged out successfully",
    }));

    ([(header::SET_COOKIE, cookie)], body).into_response()
}

/// Team listing query parameters
#[derive(Debug, Deserialize)]
pub struct TeamListQuery {
    pub search: Option<String>,
}

/// GET /api/user/team
///
/// Lists active users for the team picker, optionally filtered by a
/// case-insensitive substring over name, title, role, and email.
pub async fn team_list(
    State(state): State<AppState>,
    Query(query): Query<TeamListQuery>,
) -> ApiResult<Json<serde_json::Value>> {
    let users = User::team_list(&state.db, query.search.as_deref()).await?;

    Ok(Json(json!({
        "status": true,
        "users": users,
    })))
}

/// GET /api/user/status
///
/// Admin overview: every user with their assigned tasks reduced to
/// id/title/stage.
pub async fn task_status(
    State(state): State<AppState>,
) -> ApiResult<Json<serde_json::Value>> {
    let users = User::task_status(&state.db).await?;

    Ok(Json(json!({
        "status": true,
        "users": users,
    })))
}

/// Profile update request body
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    /// Target user; admins may edit other accounts, everyone else edits
    /// themselves regardless of this field
    #[serde(default)]
    pub id: Option<Uuid>,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub role: Option<String>,
}

/// PUT /api/user/profile
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<UpdateProfileRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    payload.validate()?;

    let target = match payload.id {
        Some(id) if auth.is_admin => id,
        _ => auth.user_id,
    };

    let user = User::update_profile(
        &state.db,
        target,
        UpdateProfile {
            name: payload.name,
            title: payload.title,
            role: payload.role,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("User not found.".to_string()))?;

    Ok(Json(json!({
        "status": true,
        "message": "Profile updated successfully.",
        "user": user,
    })))
}

/// Password change request body
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[validate(length(min = 8, message = "Password must be at least 8 characters long"))]
    pub password: String,
}

/// PUT /api/user/change-password
pub async fn change_password(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<ChangePasswordRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    payload.validate()?;
    validate_password_strength(&payload.password).map_err(ApiError::BadRequest)?;

    let password_hash = hash_password(&payload.password)?;

    let updated = User::set_password(&state.db, auth.user_id, &password_hash).await?;
    if !updated {
        return Err(ApiError::NotFound("User not found.".to_string()));
    }

    Ok(Json(json!({
        "status": true,
        "message": "Password changed successfully.",
    })))
}

/// Activation request body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetActiveRequest {
    pub is_active: bool,
}

/// PUT /api/user/:id
///
/// Activates or deactivates an account (admin only). Deactivation keeps
/// the row and task history; the user is simply refused at login.
pub async fn set_active(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SetActiveRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let user = User::set_active(&state.db, id, payload.is_active)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found.".to_string()))?;

    let message = if user.is_active {
        "User account has been activated"
    } else {
        "User account has been disabled"
    };

    Ok(Json(json!({
        "status": true,
        "message": message,
        "user": user,
    })))
}

/// DELETE /api/user/:id
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    let deleted = User::delete(&state.db, id).await?;
    if !deleted {
        return Err(ApiError::NotFound("User not found.".to_string()));
    }

    Ok(Json(json!({
        "status": true,
        "message": "User deleted successfully",
    })))
}
