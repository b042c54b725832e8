/// Common test utilities for integration tests
///
/// Provides shared infrastructure:
/// - Test database setup (migrations run on first use)
/// - Test user creation (one admin, one regular member)
/// - JWT token generation
/// - Request helpers
///
/// These tests need a running PostgreSQL reachable via `DATABASE_URL`
/// (and a `JWT_SECRET` of at least 32 bytes), so they are `#[ignore]`d by
/// default and run with `cargo test -- --ignored`.

use axum::body::Body;
use axum::http::{Request, Response};
use sqlx::PgPool;
use taskcrew_api::app::{build_router, AppState};
use taskcrew_api::config::Config;
use taskcrew_shared::auth::jwt::{create_token, Claims};
use taskcrew_shared::auth::password::hash_password;
use taskcrew_shared::models::task::{CreateTask, Task, TaskPriority, TaskStage};
use taskcrew_shared::models::user::{CreateUser, User};
use uuid::Uuid;

/// Test context containing all necessary resources
pub struct TestContext {
    pub db: PgPool,
    pub app: axum::Router,
    pub admin: User,
    pub admin_token: String,
    pub member: User,
    pub member_token: String,
}

impl TestContext {
    /// Creates a new test context with a fresh admin and member user
    pub async fn new() -> anyhow::Result<Self> {
        let config = Config::from_env()?;

        let db = PgPool::connect(&config.database.url).await?;

        // Migrations live in the shared crate (path relative to Cargo.toml)
        sqlx::migrate!("../taskcrew-shared/migrations")
            .run(&db)
            .await?;

        let admin = User::create(
            &db,
            CreateUser {
                username: format!("admin-{}", Uuid::new_v4()),
                name: "Test Admin".to_string(),
                email: format!("admin-{}@example.com", Uuid::new_v4()),
                password_hash: hash_password("adminpass1")?,
                title: "Administrator".to_string(),
                role: "admin".to_string(),
                is_admin: true,
            },
        )
        .await?;

        let member = User::create(
            &db,
            CreateUser {
                username: format!("member-{}", Uuid::new_v4()),
                name: "Test Member".to_string(),
                email: format!("member-{}@example.com", Uuid::new_v4()),
                password_hash: hash_password("memberpass1")?,
                title: "Developer".to_string(),
                role: "user".to_string(),
                is_admin: false,
            },
        )
        .await?;

        let admin_token = create_token(&Claims::new(admin.id, true), &config.jwt.secret)?;
        let member_token = create_token(&Claims::new(member.id, false), &config.jwt.secret)?;

        let state = AppState::new(db.clone(), config);
        let app = build_router(state);

        Ok(TestContext {
            db,
            app,
            admin,
            admin_token,
            member,
            member_token,
        })
    }

    /// Cleans up the users (task teams and activities cascade away); tasks
    /// created through [`create_test_task`] must be removed explicitly
    pub async fn cleanup(&self) -> anyhow::Result<()> {
        User::delete(&self.db, self.admin.id).await?;
        User::delete(&self.db, self.member.id).await?;
        Ok(())
    }

    /// Removes a task created during a test
    pub async fn remove_task(&self, task_id: Uuid) -> anyhow::Result<()> {
        Task::delete(&self.db, task_id).await?;
        Ok(())
    }
}

/// Builds a JSON request authenticated with a bearer token
pub fn json_request(method: &str, uri: &str, token: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", format!("Bearer {}", token))
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Builds a bodyless request authenticated with a bearer token
pub fn get_request(method: &str, uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

/// Reads a response body as JSON
pub async fn response_json(response: Response<Body>) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

/// Creates a task directly through the store, teamed on the given users
pub async fn create_test_task(
    ctx: &TestContext,
    title: &str,
    stage: TaskStage,
    priority: TaskPriority,
    team: Vec<Uuid>,
) -> anyhow::Result<Task> {
    let task = Task::create(
        &ctx.db,
        CreateTask {
            title: title.to_string(),
            description: None,
            priority,
            stage,
            date: chrono::Utc::now(),
            assets: vec![],
            links: vec![],
            team,
        },
    )
    .await?;

    Ok(task)
}
