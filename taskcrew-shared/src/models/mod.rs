/// Database models for TaskCrew
///
/// This module contains all database models and their CRUD operations.
///
/// # Models
///
/// - `user`: User accounts, team listing, profile management
/// - `task`: Tasks with stage/priority normalization, soft delete, team
///   membership
/// - `activity`: Append-only per-task activity log
/// - `sub_task`: Sub-tasks (checklist items) attached to a task
///
/// # Example
///
/// ```no_run
/// use taskcrew_shared::models::user::{User, CreateUser};
/// use taskcrew_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let new_user = CreateUser {
///     username: "jdoe".to_string(),
///     name: "John Doe".to_string(),
///     email: "jdoe@example.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     title: "Developer".to_string(),
///     role: "user".to_string(),
///     is_admin: false,
/// };
///
/// let user = User::create(&pool, new_user).await?;
/// # Ok(())
/// # }
/// ```

pub mod activity;
pub mod sub_task;
pub mod task;
pub mod user;
