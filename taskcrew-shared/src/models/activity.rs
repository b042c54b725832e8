/// Append-only task activity log
///
/// Every notable event on a task (assignment, a posted note, a bug report)
/// becomes an activity row. Entries are immutable: there is no update or
/// delete operation in this module, and rows only disappear when their
/// owning task is permanently deleted (FK cascade).
///
/// Retrieval is always ordered by timestamp descending.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE activities (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     task_id UUID NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     activity_type TEXT NOT NULL DEFAULT 'ASSIGNED',
///     text TEXT NOT NULL,
///     date TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

use super::task::NormalizeError;

/// Kind of event an activity records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityType {
    Assigned,
    Started,
    InProgress,
    Bug,
    Completed,
    Commented,
}

impl ActivityType {
    /// Canonical stored form
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityType::Assigned => "ASSIGNED",
            ActivityType::Started => "STARTED",
            ActivityType::InProgress => "IN_PROGRESS",
            ActivityType::Bug => "BUG",
            ActivityType::Completed => "COMPLETED",
            ActivityType::Commented => "COMMENTED",
        }
    }

    /// Parses a free-form type string ("in progress", "Bug", "COMMENTED")
    pub fn parse(input: &str) -> Result<Self, NormalizeError> {
        match input.trim().to_uppercase().replace(' ', "_").as_str() {
            "ASSIGNED" => Ok(ActivityType::Assigned),
            "STARTED" => Ok(ActivityType::Started),
            "IN_PROGRESS" => Ok(ActivityType::InProgress),
            "BUG" => Ok(ActivityType::Bug),
            "COMPLETED" => Ok(ActivityType::Completed),
            "COMMENTED" => Ok(ActivityType::Commented),
            _ => Err(NormalizeError::UnknownActivityType(input.to_string())),
        }
    }
}

impl TryFrom<String> for ActivityType {
    type Error = NormalizeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        ActivityType::parse(&value)
    }
}

/// Activity row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    /// Unique activity ID
    pub id: Uuid,

    /// Owning task
    pub task_id: Uuid,

    /// User who posted the entry
    pub user_id: Uuid,

    /// Kind of event
    #[sqlx(try_from = "String")]
    #[serde(rename = "type")]
    pub activity_type: ActivityType,

    /// Human-readable entry text
    pub text: String,

    /// When the entry was posted
    pub date: DateTime<Utc>,
}

/// Activity row joined with the posting user's name, for responses
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ActivityWithUser {
    pub id: Uuid,
    pub task_id: Uuid,
    pub user_id: Uuid,
    #[sqlx(try_from = "String")]
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    pub text: String,
    pub date: DateTime<Utc>,
    pub user_name: String,
}

/// Input for appending an activity
#[derive(Debug, Clone)]
pub struct NewActivity {
    pub activity_type: ActivityType,
    pub text: String,
    pub by: Uuid,
}

impl Activity {
    /// Appends a typed, timestamped entry to a task's log
    ///
    /// This is the only write operation the log supports.
    pub async fn append(
        pool: &PgPool,
        task_id: Uuid,
        data: NewActivity,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Activity>(
            r#"
            INSERT INTO activities (task_id, user_id, activity_type, text)
            VALUES ($1, $2, $3, $4)
            RETURNING id, task_id, user_id, activity_type, text, date
            "#,
        )
        .bind(task_id)
        .bind(data.by)
        .bind(data.activity_type.as_str())
        .bind(&data.text)
        .fetch_one(pool)
        .await
    }
}

impl ActivityWithUser {
    /// Lists a task's activities, newest first
    pub async fn list_for_task(pool: &PgPool, task_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, ActivityWithUser>(
            r#"
            SELECT a.id, a.task_id, a.user_id, a.activity_type, a.text, a.date,
                   u.name AS user_name
            FROM activities a
            JOIN users u ON u.id = a.user_id
            WHERE a.task_id = $1
            ORDER BY a.date DESC
            "#,
        )
        .bind(task_id)
        .fetch_all(pool)
        .await
    }

    /// Lists activities for many tasks in one round trip, newest first
    pub async fn list_for_tasks(
        pool: &PgPool,
        task_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<Self>>, sqlx::Error> {
        let rows = sqlx::query_as::<_, ActivityWithUser>(
            r#"
            SELECT a.id, a.task_id, a.user_id, a.activity_type, a.text, a.date,
                   u.name AS user_name
            FROM activities a
            JOIN users u ON u.id = a.user_id
            WHERE a.task_id = ANY($1)
            ORDER BY a.date DESC
            "#,
        )
        .bind(task_ids)
        .fetch_all(pool)
        .await?;

        let mut grouped: HashMap<Uuid, Vec<Self>> = HashMap::new();
        for row in rows {
            grouped.entry(row.task_id).or_default().push(row);
        }

        Ok(grouped)
    }
}
