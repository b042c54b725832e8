/// Authentication middleware for Axum
///
/// Extracts the session JWT from the request, validates it, and adds an
/// [`AuthContext`] to the request extensions for handlers to read.
///
/// # Token Sources
///
/// The token is read from the `token` cookie first (how browser clients
/// authenticate after login sets it), falling back to an
/// `Authorization: Bearer <token>` header for non-browser clients.
///
/// # Example
///
/// ```no_run
/// use axum::{middleware, routing::get, Extension, Router};
/// use taskcrew_shared::auth::middleware::{create_jwt_middleware, AuthContext};
///
/// async fn protected_handler(Extension(auth): Extension<AuthContext>) -> String {
///     format!("Hello, user {}!", auth.user_id)
/// }
///
/// let app: Router = Router::new()
///     .route("/protected", get(protected_handler))
///     .layer(middleware::from_fn(create_jwt_middleware("your-jwt-secret")));
/// ```

use axum::{
    extract::Request,
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use super::jwt::{validate_token, JwtError};

/// Name of the session cookie carrying the JWT
pub const SESSION_COOKIE: &str = "token";

/// Authentication context added to request extensions
///
/// Handlers extract it with Axum's `Extension` extractor.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AuthContext {
    /// Authenticated user ID
    pub user_id: Uuid,

    /// Whether the user may use admin routes
    pub is_admin: bool,
}

/// Error type for authentication middleware
#[derive(Debug)]
pub enum AuthError {
    /// No token in cookie or Authorization header
    MissingCredentials,

    /// Token validation failed
    InvalidToken(String),

    /// Authenticated but not an admin
    NotAuthorized,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::MissingCredentials => (
                StatusCode::UNAUTHORIZED,
                "Not authorized. Try login again.".to_string(),
            ),
            AuthError::InvalidToken(_) => (
                StatusCode::UNAUTHORIZED,
                "Not authorized. Try login again.".to_string(),
            ),
            AuthError::NotAuthorized => (
                StatusCode::FORBIDDEN,
                "Not authorized as admin. Try login as admin.".to_string(),
            ),
        };

        (status, Json(json!({ "status": false, "message": message }))).into_response()
    }
}

/// Pulls the session token out of the request headers
///
/// Checks the `token` cookie first, then the `Authorization: Bearer` header.
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    if let Some(cookie_header) = headers.get(header::COOKIE).and_then(|v| v.to_str().ok()) {
        for pair in cookie_header.split(';') {
            if let Some((name, value)) = pair.trim().split_once('=') {
                if name == SESSION_COOKIE && !value.is_empty() {
                    return Some(value.to_string());
                }
            }
        }
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|token| token.to_string())
}

/// JWT authentication middleware
///
/// On success the request gains an [`AuthContext`] extension; on failure
/// the request is rejected with a 401 envelope.
pub async fn jwt_auth_middleware(
    secret: String,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let token = extract_token(req.headers()).ok_or(AuthError::MissingCredentials)?;

    let claims = validate_token(&token, &secret).map_err(|e| match e {
        JwtError::Expired => AuthError::InvalidToken("Token expired".to_string()),
        _ => AuthError::InvalidToken(format!("Invalid token: {}", e)),
    })?;

    let auth_context = AuthContext {
        user_id: claims.sub,
        is_admin: claims.is_admin,
    };
    req.extensions_mut().insert(auth_context);

    Ok(next.run(req).await)
}

/// Admin guard middleware
///
/// Must run after [`jwt_auth_middleware`]; rejects non-admin sessions with
/// a 403 envelope. A request that reaches this without an `AuthContext`
/// extension is treated as unauthenticated.
pub async fn admin_guard(req: Request, next: Next) -> Result<Response, AuthError> {
    let auth = req
        .extensions()
        .get::<AuthContext>()
        .copied()
        .ok_or(AuthError::MissingCredentials)?;

    if !auth.is_admin {
        return Err(AuthError::NotAuthorized);
    }

    Ok(next.run(req).await)
}

/// Creates a JWT authentication middleware closure
///
/// Helper that captures the JWT secret and returns a middleware function
/// suitable for `middleware::from_fn`.
pub fn create_jwt_middleware(
    secret: impl Into<String>,
) -> impl Fn(Request, Next) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<Response, AuthError>> + Send>> + Clone {
    let secret = secret.into();
    move |req, next| {
        let secret = secret.clone();
        Box::pin(jwt_auth_middleware(secret, req, next))
    }
}
