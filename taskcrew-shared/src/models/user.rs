/// User model and CRUD operations
///
/// Users carry their own credentials (Argon2id hash), an admin flag, and an
/// active flag. Deactivated users keep their rows and task history but are
/// refused at login. Email and username are stored lowercase and are unique;
/// duplicate inserts surface as constraint violations for the API layer to
/// translate.
///
/// The password hash never leaves this crate in serialized form.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     username VARCHAR(100) NOT NULL UNIQUE,
///     name VARCHAR(255) NOT NULL,
///     email VARCHAR(255) NOT NULL UNIQUE,
///     password_hash VARCHAR(255) NOT NULL,
///     title VARCHAR(255) NOT NULL DEFAULT 'Member',
///     role VARCHAR(100) NOT NULL DEFAULT 'user',
///     is_admin BOOLEAN NOT NULL DEFAULT FALSE,
///     is_active BOOLEAN NOT NULL DEFAULT TRUE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::task::TaskStage;

const USER_COLUMNS: &str = "id, username, name, email, password_hash, title, role, \
                            is_admin, is_active, created_at, updated_at";

/// User account row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique user ID
    pub id: Uuid,

    /// Login handle, stored lowercase
    pub username: String,

    /// Display name
    pub name: String,

    /// Email address, stored lowercase
    pub email: String,

    /// Argon2id PHC string, never serialized
    #[serde(skip_serializing, default)]
    pub password_hash: String,

    /// Job title shown in team listings
    pub title: String,

    /// Free-form role label ("user", "Developer", ...)
    pub role: String,

    /// Grants access to admin-only routes
    pub is_admin: bool,

    /// Deactivated users are refused at login
    pub is_active: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a user
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub username: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub title: String,
    pub role: String,
    pub is_admin: bool,
}

/// Input for updating a user's profile
///
/// All fields are optional; omitted fields keep their current value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfile {
    pub name: Option<String>,
    pub title: Option<String>,
    pub role: Option<String>,
}

/// Team-listing projection: a user without credentials or timestamps
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TeamMemberListing {
    pub id: Uuid,
    pub name: String,
    pub title: String,
    pub role: String,
    pub email: String,
    pub is_active: bool,
}

/// Dashboard projection: recently created active users
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct RecentUser {
    pub id: Uuid,
    pub name: String,
    pub title: String,
    pub role: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// A user's assigned tasks, reduced to id/title/stage
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserTaskStatus {
    pub id: Uuid,
    pub name: String,
    pub title: String,
    pub tasks: Vec<TaskSlice>,
}

/// Minimal task projection for status listings
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TaskSlice {
    pub id: Uuid,
    pub title: String,
    #[sqlx(try_from = "String")]
    pub stage: TaskStage,
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct StatusRow {
    user_id: Uuid,
    user_name: String,
    user_title: String,
    task_id: Option<Uuid>,
    task_title: Option<String>,
    task_stage: Option<String>,
}

impl User {
    /// Creates a new user
    ///
    /// Email and username are lowercased before insert. Duplicates surface
    /// as unique-constraint violations.
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (username, name, email, password_hash, title, role, is_admin)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(data.username.to_lowercase())
        .bind(&data.name)
        .bind(data.email.to_lowercase())
        .bind(&data.password_hash)
        .bind(&data.title)
        .bind(&data.role)
        .bind(data.is_admin)
        .fetch_one(pool)
        .await
    }

    /// Finds a user by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Finds a user by email (case-insensitive via stored lowercase form)
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email.to_lowercase())
        .fetch_optional(pool)
        .await
    }

    /// Updates profile fields, keeping current values for omitted ones
    ///
    /// Returns `None` if the user doesn't exist.
    pub async fn update_profile(
        pool: &PgPool,
        id: Uuid,
        data: UpdateProfile,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE users SET updated_at = NOW()");
        let mut bind_count = 0;

        if data.name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", name = ${}", bind_count));
        }
        if data.title.is_some() {
            bind_count += 1;
            query.push_str(&format!(", title = ${}", bind_count));
        }
        if data.role.is_some() {
            bind_count += 1;
            query.push_str(&format!(", role = ${}", bind_count));
        }

        bind_count += 1;
        query.push_str(&format!(" WHERE id = ${} RETURNING {}", bind_count, USER_COLUMNS));

        let mut q = sqlx::query_as::<_, User>(&query);

        if let Some(name) = &data.name {
            q = q.bind(name);
        }
        if let Some(title) = &data.title {
            q = q.bind(title);
        }
        if let Some(role) = &data.role {
            q = q.bind(role);
        }

        q.bind(id).fetch_optional(pool).await
    }

    /// Replaces a user's password hash
    ///
    /// Returns `false` if the user doesn't exist.
    pub async fn set_password(
        pool: &PgPool,
        id: Uuid,
        password_hash: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE users SET password_hash = $1, updated_at = NOW() WHERE id = $2",
        )
        .bind(password_hash)
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Activates or deactivates an account
    ///
    /// Returns the updated user, or `None` if it doesn't exist.
    pub async fn set_active(
        pool: &PgPool,
        id: Uuid,
        is_active: bool,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET is_active = $1, updated_at = NOW() WHERE id = $2 \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(is_active)
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Permanently deletes a user
    ///
    /// Task-team rows and activities cascade away with the user. Returns
    /// `false` if the user doesn't exist.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists active users for the team picker
    ///
    /// `search` is a case-insensitive substring match over name, title,
    /// role, and email.
    pub async fn team_list(
        pool: &PgPool,
        search: Option<&str>,
    ) -> Result<Vec<TeamMemberListing>, sqlx::Error> {
        let mut query = String::from(
            "SELECT id, name, title, role, email, is_active FROM users WHERE is_active = TRUE",
        );

        if search.is_some() {
            query.push_str(
                " AND (name ILIKE $1 OR title ILIKE $1 OR role ILIKE $1 OR email ILIKE $1)",
            );
        }

        query.push_str(" ORDER BY name");

        let mut q = sqlx::query_as::<_, TeamMemberListing>(&query);
        if let Some(search) = search {
            q = q.bind(format!("%{}%", search));
        }

        q.fetch_all(pool).await
    }

    /// Lists the most recently created active users, newest first
    ///
    /// Deactivated accounts are excluded; the admin dashboard only shows
    /// users who can still log in.
    pub async fn list_recent(pool: &PgPool, limit: i64) -> Result<Vec<RecentUser>, sqlx::Error> {
        sqlx::query_as::<_, RecentUser>(
            r#"
            SELECT id, name, title, role, is_active, created_at
            FROM users
            WHERE is_active = TRUE
            ORDER BY created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(pool)
        .await
    }

    /// Lists every user with their assigned tasks reduced to id/title/stage
    ///
    /// Users without tasks appear with an empty slice.
    pub async fn task_status(pool: &PgPool) -> Result<Vec<UserTaskStatus>, sqlx::Error> {
        let rows = sqlx::query_as::<_, StatusRow>(
            r#"
            SELECT u.id AS user_id, u.name AS user_name, u.title AS user_title,
                   t.id AS task_id, t.title AS task_title, t.stage AS task_stage
            FROM users u
            LEFT JOIN task_team tt ON tt.user_id = u.id
            LEFT JOIN tasks t ON t.id = tt.task_id AND t.is_trashed = FALSE
            ORDER BY u.name, u.id, t.created_at DESC
            "#,
        )
        .fetch_all(pool)
        .await?;

        // Ordering by name then id keeps each user's rows contiguous even
        // when two users share a name
        let mut statuses: Vec<UserTaskStatus> = Vec::new();
        for row in rows {
            if statuses.last().map(|s| s.id) != Some(row.user_id) {
                statuses.push(UserTaskStatus {
                    id: row.user_id,
                    name: row.user_name,
                    title: row.user_title,
                    tasks: Vec::new(),
                });
            }

            if let (Some(id), Some(title), Some(stage)) =
                (row.task_id, row.task_title, row.task_stage)
            {
                let stage = TaskStage::parse(&stage)
                    .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
                if let Some(current) = statuses.last_mut() {
                    current.tasks.push(TaskSlice { id, title, stage });
                }
            }
        }

        Ok(statuses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_serialization_omits_password_hash() {
        let user = User {
            id: Uuid::nil(),
            username: "jdoe".to_string(),
            name: "John Doe".to_string(),
            email: "jdoe@example.com".to_string(),
            password_hash: "$argon2id$v=19$secret".to_string(),
            title: "Developer".to_string(),
            role: "user".to_string(),
            is_admin: false,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("argon2id"));
        assert!(!json.contains("passwordHash"));
        assert!(json.contains("\"isAdmin\":false"));
    }

    #[test]
    fn test_update_profile_all_optional() {
        let update: UpdateProfile = serde_json::from_str("{}").unwrap();
        assert!(update.name.is_none());
        assert!(update.title.is_none());
        assert!(update.role.is_none());
    }
}
