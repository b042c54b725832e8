/// Sub-tasks (checklist items) attached to a task
///
/// A sub-task is a lightweight checklist entry with an optional due date
/// and tag. It carries its own completion flag, independent of the parent
/// task's stage. Sub-tasks are always addressed through their parent task
/// so a stale or forged sub-task ID cannot touch another task's checklist.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE sub_tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     task_id UUID NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
///     title VARCHAR(255) NOT NULL,
///     date TIMESTAMPTZ,
///     tag VARCHAR(100),
///     is_completed BOOLEAN NOT NULL DEFAULT FALSE
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

/// Sub-task row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SubTask {
    /// Unique sub-task ID
    pub id: Uuid,

    /// Parent task
    pub task_id: Uuid,

    /// Checklist entry title
    pub title: String,

    /// Optional due date
    pub date: Option<DateTime<Utc>>,

    /// Optional free-form tag
    pub tag: Option<String>,

    /// Completion flag, independent of the parent task's stage
    pub is_completed: bool,
}

/// Input for adding a sub-task
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubTask {
    pub title: String,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tag: Option<String>,
}

impl SubTask {
    /// Adds a checklist entry to a task
    ///
    /// # Errors
    ///
    /// Returns a foreign-key violation if the task does not exist.
    pub async fn create(
        pool: &PgPool,
        task_id: Uuid,
        data: CreateSubTask,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, SubTask>(
            r#"
            INSERT INTO sub_tasks (task_id, title, date, tag)
            VALUES ($1, $2, $3, $4)
            RETURNING id, task_id, title, date, tag, is_completed
            "#,
        )
        .bind(task_id)
        .bind(&data.title)
        .bind(data.date)
        .bind(&data.tag)
        .fetch_one(pool)
        .await
    }

    /// Sets a sub-task's completion flag
    ///
    /// The sub-task must belong to `task_id`; a mismatched pair updates
    /// nothing. Returns `false` when no row matched.
    pub async fn set_completed(
        pool: &PgPool,
        task_id: Uuid,
        sub_task_id: Uuid,
        is_completed: bool,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE sub_tasks SET is_completed = $1 WHERE id = $2 AND task_id = $3",
        )
        .bind(is_completed)
        .bind(sub_task_id)
        .bind(task_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists a task's sub-tasks in insertion order
    pub async fn list_for_task(pool: &PgPool, task_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, SubTask>(
            r#"
            SELECT id, task_id, title, date, tag, is_completed
            FROM sub_tasks
            WHERE task_id = $1
            ORDER BY id
            "#,
        )
        .bind(task_id)
        .fetch_all(pool)
        .await
    }

    /// Lists sub-tasks for many tasks in one round trip
    pub async fn list_for_tasks(
        pool: &PgPool,
        task_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<Self>>, sqlx::Error> {
        let rows = sqlx::query_as::<_, SubTask>(
            r#"
            SELECT id, task_id, title, date, tag, is_completed
            FROM sub_tasks
            WHERE task_id = ANY($1)
            ORDER BY id
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_sub_task_optional_fields_default() {
        let input: CreateSubTask =
            serde_json::from_str(r#"{"title": "Write docs"}"#).unwrap();
        assert_eq!(input.title, "Write docs");
        assert!(input.date.is_none());
        assert!(input.tag.is_none());
    }

    #[test]
    fn test_sub_task_serde_camel_case() {
        let sub_task = SubTask {
            id: Uuid::nil(),
            task_id: Uuid::nil(),
            title: "Review".to_string(),
            date: None,
            tag: Some("qa".to_string()),
            is_completed: true,
        };

        let json = serde_json::to_value(&sub_task).unwrap();
        assert_eq!(json["taskId"], json["id"]);
        assert_eq!(json["isCompleted"], true);
        assert_eq!(json["tag"], "qa");
    }
}
