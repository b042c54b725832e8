/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use taskcrew_api::{app::AppState, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config);
/// let app = taskcrew_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::config::Config;
use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use taskcrew_shared::auth::middleware::{admin_guard, create_jwt_middleware};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                              # Liveness + db probe (public)
/// └── /api/
///     ├── /user/
///     │   ├── POST /register               # Public
///     │   ├── POST /login                  # Public, sets session cookie
///     │   ├── POST /logout                 # Public, clears session cookie
///     │   ├── GET  /team                   # Auth
///     │   ├── PUT  /profile                # Auth (admin may edit others)
///     │   ├── PUT  /change-password        # Auth
///     │   ├── GET  /status                 # Admin
///     │   ├── PUT  /:id                    # Admin (activate/deactivate)
///     │   └── DELETE /:id                  # Admin
///     └── /task/
///         ├── GET  /                       # Auth, visibility-filtered
///         ├── GET  /dashboard              # Auth
///         ├── GET  /:id                    # Auth
///         ├── POST /activity/:id           # Auth
///         ├── PUT  /stage/:id              # Auth
///         ├── PUT  /sub-stage/:tid/:sid    # Auth
///         ├── POST /                       # Admin
///         ├── POST /duplicate/:id          # Admin
///         ├── POST /sub-task/:id           # Admin
///         ├── PUT  /:id                    # Admin
///         ├── PUT  /trash/:id              # Admin
///         └── DELETE /:id                  # Admin
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Authentication (per-route-group: JWT, then admin guard where needed)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let jwt_layer = middleware::from_fn(create_jwt_middleware(state.jwt_secret().to_string()));

    // Health check (public, no auth)
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // User routes: public session endpoints
    let user_public_routes = Router::new()
        .route("/register", post(routes::users::register))
        .route("/login", post(routes::users::login))
        .route("/logout", post(routes::users::logout));

    // User routes requiring a valid session
    let user_protected_routes = Router::new()
        .route("/team", get(routes::users::team_list))
        .route("/profile", put(routes::users::update_profile))
        .route("/change-password", put(routes::users::change_password))
        .layer(jwt_layer.clone());

    // User routes requiring an admin session
    let user_admin_routes = Router::new()
        .route("/status", get(routes::users::task_status))
        .route("/:id", put(routes::users::set_active))
        .route("/:id", delete(routes::users::delete_user))
        .layer(middleware::from_fn(admin_guard))
        .layer(jwt_layer.clone());

    // Task routes requiring a valid session
    let task_protected_routes = Router::new()
        .route("/", get(routes::tasks::list_tasks))
        .route("/dashboard", get(routes::tasks::dashboard))
        .route("/:id", get(routes::tasks::get_task))
        .route("/activity/:id", post(routes::tasks::post_activity))
        .route("/stage/:id", put(routes::tasks::change_stage))
        .route(
            "/sub-stage/:task_id/:sub_task_id",
            put(routes::tasks::change_sub_task_stage),
        )
        .layer(jwt_layer.clone());

    // Task routes requiring an admin session
    let task_admin_routes = Router::new()
        .route("/", post(routes::tasks::create_task))
        .route("/duplicate/:id", post(routes::tasks::duplicate_task))
        .route("/sub-task/:id", post(routes::tasks::create_sub_task))
        .route("/:id", put(routes::tasks::update_task))
        .route("/trash/:id", put(routes::tasks::trash_task))
        .route("/:id", delete(routes::tasks::delete_or_restore_task))
        .layer(middleware::from_fn(admin_guard))
        .layer(jwt_layer);

    let api_routes = Router::new()
        .nest(
            "/user",
            user_public_routes
                .merge(user_protected_routes)
                .merge(user_admin_routes),
        )
        .nest(
            "/task",
            task_protected_routes.merge(task_admin_routes),
        );

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.contains(&"*".to_string()) {
        // Development mode: permissive CORS
        CorsLayer::permissive()
    } else {
        // Production mode: configured origins, credentials allowed for the
        // session cookie
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/api", api_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}
