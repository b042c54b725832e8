/// Task model, normalization layer, and database operations
///
/// Tasks are the core entity of TaskCrew. Each task carries a workflow
/// stage, a priority, a team (many-to-many with users), an append-only
/// activity log, and a set of sub-tasks.
///
/// # Normalization
///
/// `stage` and `priority` arrive from clients as free-form strings
/// ("in progress", "High", "todo"). [`TaskStage::parse`] and
/// [`TaskPriority::parse`] canonicalize them (upper-case, spaces to
/// underscores) and reject anything outside the closed vocabulary, so the
/// stored form is always one of the canonical values.
///
/// # Soft delete
///
/// `is_trashed` hides a task from default listings without destroying it.
/// Trashed tasks remain queryable under the trashed filter until an
/// explicit permanent delete.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     title VARCHAR(255) NOT NULL,
///     description TEXT,
///     priority TEXT NOT NULL DEFAULT 'NORMAL',
///     stage TEXT NOT NULL DEFAULT 'TODO',
///     date TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     is_trashed BOOLEAN NOT NULL DEFAULT FALSE,
///     is_group BOOLEAN NOT NULL DEFAULT FALSE,
///     has_issues BOOLEAN NOT NULL DEFAULT FALSE,
///     assets TEXT[] NOT NULL DEFAULT '{}',
///     links TEXT[] NOT NULL DEFAULT '{}',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE TABLE task_team (
///     task_id UUID NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     PRIMARY KEY (task_id, user_id)
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

use super::activity::ActivityWithUser;
use super::sub_task::SubTask;

/// Error type for task store operations
#[derive(Debug, thiserror::Error)]
pub enum TaskStoreError {
    /// A team member id does not reference an existing user
    #[error("Team member {0} does not exist")]
    TeamMemberNotFound(Uuid),

    /// Underlying database error
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Error type for stage/priority normalization
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NormalizeError {
    /// Stage string is not in the canonical vocabulary
    #[error("Unrecognized task stage: {0:?}")]
    UnknownStage(String),

    /// Priority string is not in the canonical vocabulary
    #[error("Unrecognized task priority: {0:?}")]
    UnknownPriority(String),

    /// Activity type string is not in the canonical vocabulary
    #[error("Unrecognized activity type: {0:?}")]
    UnknownActivityType(String),
}

/// Task workflow stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStage {
    Todo,
    InProgress,
    Completed,
}

impl TaskStage {
    /// Canonical stored form
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStage::Todo => "TODO",
            TaskStage::InProgress => "IN_PROGRESS",
            TaskStage::Completed => "COMPLETED",
        }
    }

    /// Human label for display layers (dashboard grouping)
    pub fn label(&self) -> &'static str {
        match self {
            TaskStage::Todo => "todo",
            TaskStage::InProgress => "in progress",
            TaskStage::Completed => "completed",
        }
    }

    /// Parses a free-form stage string into the canonical form
    ///
    /// Input is trimmed, upper-cased, and spaces become underscores, so
    /// "in progress", "In Progress", and "IN_PROGRESS" all parse to
    /// [`TaskStage::InProgress`]. Anything outside the vocabulary is
    /// rejected rather than silently persisted.
    ///
    /// # Example
    ///
    /// ```
    /// use taskcrew_shared::models::task::TaskStage;
    ///
    /// assert_eq!(TaskStage::parse("in progress").unwrap(), TaskStage::InProgress);
    /// assert_eq!(TaskStage::parse("Todo").unwrap(), TaskStage::Todo);
    /// assert!(TaskStage::parse("archived").is_err());
    /// ```
    pub fn parse(input: &str) -> Result<Self, NormalizeError> {
        match normalize(input).as_str() {
            "TODO" => Ok(TaskStage::Todo),
            "IN_PROGRESS" => Ok(TaskStage::InProgress),
            "COMPLETED" => Ok(TaskStage::Completed),
            _ => Err(NormalizeError::UnknownStage(input.to_string())),
        }
    }
}

impl TryFrom<String> for TaskStage {
    type Error = NormalizeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        TaskStage::parse(&value)
    }
}

/// Task priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskPriority {
    Low,
    Normal,
    Medium,
    High,
}

impl TaskPriority {
    /// Canonical stored form
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "LOW",
            TaskPriority::Normal => "NORMAL",
            TaskPriority::Medium => "MEDIUM",
            TaskPriority::High => "HIGH",
        }
    }

    /// Human label for display layers
    pub fn label(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Normal => "normal",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
        }
    }

    /// Parses a free-form priority string into the canonical form
    ///
    /// # Example
    ///
    /// ```
    /// use taskcrew_shared::models::task::TaskPriority;
    ///
    /// assert_eq!(TaskPriority::parse("high").unwrap(), TaskPriority::High);
    /// assert_eq!(TaskPriority::parse(" Normal ").unwrap(), TaskPriority::Normal);
    /// assert!(TaskPriority::parse("urgent").is_err());
    /// ```
    pub fn parse(input: &str) -> Result<Self, NormalizeError> {
        match normalize(input).as_str() {
            "LOW" => Ok(TaskPriority::Low),
            "NORMAL" => Ok(TaskPriority::Normal),
            "MEDIUM" => Ok(TaskPriority::Medium),
            "HIGH" => Ok(TaskPriority::High),
            _ => Err(NormalizeError::UnknownPriority(input.to_string())),
        }
    }
}

impl TryFrom<String> for TaskPriority {
    type Error = NormalizeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        TaskPriority::parse(&value)
    }
}

/// Shared canonicalization: trim, upper-case, spaces to underscores
fn normalize(input: &str) -> String {
    input.trim().to_uppercase().replace(' ', "_")
}

/// Task model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique task ID
    pub id: Uuid,

    /// Task title
    pub title: String,

    /// Optional longer description
    pub description: Option<String>,

    /// Priority, always canonical after normalization
    #[sqlx(try_from = "String")]
    pub priority: TaskPriority,

    /// Workflow stage, always canonical after normalization
    #[sqlx(try_from = "String")]
    pub stage: TaskStage,

    /// Due date
    pub date: DateTime<Utc>,

    /// Soft-delete flag; trashed tasks are hidden from default listings
    pub is_trashed: bool,

    /// Whether this is a group task
    pub is_group: bool,

    /// Whether the task has open issues
    pub has_issues: bool,

    /// Attachment URLs, in upload order
    pub assets: Vec<String>,

    /// Related links
    pub links: Vec<String>,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last updated
    pub updated_at: DateTime<Utc>,
}

/// Team member summary attached to task responses
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TeamMember {
    pub id: Uuid,
    pub name: String,
    pub title: String,
    pub role: String,
    pub email: String,
}

/// Input for creating a new task
#[derive(Debug, Clone)]
pub struct CreateTask {
    pub title: String,
    pub description: Option<String>,
    pub priority: TaskPriority,
    pub stage: TaskStage,
    pub date: DateTime<Utc>,
    pub assets: Vec<String>,
    pub links: Vec<String>,
    pub team: Vec<Uuid>,
}

/// Input for updating an existing task
///
/// All content fields are replaced; `team` of `None` leaves the current
/// team membership untouched.
#[derive(Debug, Clone)]
pub struct UpdateTask {
    pub title: String,
    pub description: Option<String>,
    pub priority: TaskPriority,
    pub stage: TaskStage,
    pub date: DateTime<Utc>,
    pub assets: Vec<String>,
    pub links: Vec<String>,
    pub team: Option<Vec<Uuid>>,
}

/// Filters for task listings
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    /// Restrict to tasks this user is teamed on (None = admin, sees all)
    pub member: Option<Uuid>,

    /// Filter by stage
    pub stage: Option<TaskStage>,

    /// Include trashed instead of live tasks
    pub is_trashed: bool,

    /// Case-insensitive substring search over title, stage, and priority
    pub search: Option<String>,
}

const TASK_COLUMNS: &str = "id, title, description, priority, stage, date, \
     is_trashed, is_group, has_issues, assets, links, created_at, updated_at";

impl Task {
    /// Creates a new task and its team membership in one transaction
    ///
    /// Every id in `data.team` must reference an existing user; the whole
    /// insert rolls back on the first unknown id.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::TeamMemberNotFound`] for an unknown team
    /// member, or the underlying database error.
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, TaskStoreError> {
        let mut tx = pool.begin().await?;

        verify_team_exists(&mut tx, &data.team).await?;

        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            INSERT INTO tasks (title, description, priority, stage, date, assets, links)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {TASK_COLUMNS}
            "#,
        ))
        .bind(&data.title)
        .bind(&data.description)
        .bind(data.priority.as_str())
        .bind(data.stage.as_str())
        .bind(data.date)
        .bind(&data.assets)
        .bind(&data.links)
        .fetch_one(&mut *tx)
        .await?;

        for user_id in &data.team {
            sqlx::query("INSERT INTO task_team (task_id, user_id) VALUES ($1, $2)")
                .bind(task.id)
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        Ok(task)
    }

    /// Finds a task by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1",
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Lists tasks matching the filter, newest first
    ///
    /// Non-admin callers set `filter.member`; the listing then only
    /// contains tasks where that user appears in the team relation. The
    /// search term is matched case-insensitively against the title as
    /// given, and against stage/priority after normalization (so
    /// "in progress" matches tasks stored as IN_PROGRESS).
    pub async fn list(pool: &PgPool, filter: &TaskFilter) -> Result<Vec<Self>, sqlx::Error> {
        let mut query = format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE is_trashed = $1",
        );
        let mut bind_count = 1;

        if filter.member.is_some() {
            bind_count += 1;
            query.push_str(&format!(
                " AND EXISTS (SELECT 1 FROM task_team tt \
                 WHERE tt.task_id = tasks.id AND tt.user_id = ${bind_count})"
            ));
        }
        if filter.stage.is_some() {
            bind_count += 1;
            query.push_str(&format!(" AND stage = ${bind_count}"));
        }
        if filter.search.is_some() {
            query.push_str(&format!(
                " AND (title ILIKE ${} OR stage ILIKE ${} OR priority ILIKE ${})",
                bind_count + 1,
                bind_count + 2,
                bind_count + 3,
            ));
        }

        query.push_str(" ORDER BY created_at DESC");

        let mut q = sqlx::query_as::<_, Task>(&query).bind(filter.is_trashed);

        if let Some(member) = filter.member {
            q = q.bind(member);
        }
        if let Some(stage) = filter.stage {
            q = q.bind(stage.as_str());
        }
        if let Some(ref search) = filter.search {
            q = q
                .bind(format!("%{}%", search))
                .bind(format!("%{}%", normalize(search)))
                .bind(format!("%{}%", search.trim().to_uppercase()));
        }

        q.fetch_all(pool).await
    }

    /// Lists the non-trashed tasks visible to a requester for the dashboard
    ///
    /// `member` of `None` means the requester is an admin and sees all
    /// tasks. Ordered newest first, which the aggregation layer relies on
    /// for its "last ten" slice.
    pub async fn list_visible(
        pool: &PgPool,
        member: Option<Uuid>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let filter = TaskFilter {
            member,
            ..Default::default()
        };
        Self::list(pool, &filter).await
    }

    /// Replaces all content fields of a task, and its team when given
    ///
    /// Runs in a single transaction so a failed team replacement cannot
    /// leave the content update applied on its own.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::TeamMemberNotFound`] for an unknown team
    /// member; `sqlx::Error::RowNotFound` surfaces as `Database` when the
    /// task id is unknown.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateTask,
    ) -> Result<Self, TaskStoreError> {
        let mut tx = pool.begin().await?;

        if let Some(ref team) = data.team {
            verify_team_exists(&mut tx, team).await?;
        }

        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            UPDATE tasks
            SET title = $2,
                description = $3,
                priority = $4,
                stage = $5,
                date = $6,
                assets = $7,
                links = $8,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {TASK_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(&data.title)
        .bind(&data.description)
        .bind(data.priority.as_str())
        .bind(data.stage.as_str())
        .bind(data.date)
        .bind(&data.assets)
        .bind(&data.links)
        .fetch_one(&mut *tx)
        .await?;

        if let Some(team) = data.team {
            sqlx::query("DELETE FROM task_team WHERE task_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;

            for user_id in &team {
                sqlx::query("INSERT INTO task_team (task_id, user_id) VALUES ($1, $2)")
                    .bind(id)
                    .bind(user_id)
                    .execute(&mut *tx)
                    .await?;
            }
        }

        tx.commit().await?;

        Ok(task)
    }

    /// Changes only the workflow stage
    ///
    /// Returns the updated task, or `None` if the id is unknown.
    pub async fn set_stage(
        pool: &PgPool,
        id: Uuid,
        stage: TaskStage,
    ) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            UPDATE tasks
            SET stage = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {TASK_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(stage.as_str())
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Sets or clears the soft-delete flag
    ///
    /// Returns `true` when a task was updated.
    pub async fn set_trashed(
        pool: &PgPool,
        id: Uuid,
        is_trashed: bool,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE tasks SET is_trashed = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(is_trashed)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Permanently deletes a task
    ///
    /// Activities, sub-tasks, and team rows go with it via CASCADE.
    /// Returns `true` when a task was deleted.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Permanently deletes all trashed tasks, returning how many went
    pub async fn delete_all_trashed(pool: &PgPool) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE is_trashed = TRUE")
            .execute(pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Restores all trashed tasks, returning how many came back
    pub async fn restore_all_trashed(pool: &PgPool) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE tasks SET is_trashed = FALSE, updated_at = NOW() WHERE is_trashed = TRUE",
        )
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Fetches the team members of a task
    pub async fn team(pool: &PgPool, task_id: Uuid) -> Result<Vec<TeamMember>, sqlx::Error> {
        sqlx::query_as::<_, TeamMember>(
            r#"
            SELECT u.id, u.name, u.title, u.role, u.email
            FROM task_team tt
            JOIN users u ON u.id = tt.user_id
            WHERE tt.task_id = $1
            ORDER BY u.name
            "#,
        )
        .bind(task_id)
        .fetch_all(pool)
        .await
    }

    /// Fetches the team user ids of a task (for duplication)
    pub async fn team_ids(pool: &PgPool, task_id: Uuid) -> Result<Vec<Uuid>, sqlx::Error> {
        let rows: Vec<(Uuid,)> =
            sqlx::query_as("SELECT user_id FROM task_team WHERE task_id = $1")
                .bind(task_id)
                .fetch_all(pool)
                .await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// Fetches team members for many tasks in one round trip
    pub async fn teams_for(
        pool: &PgPool,
        task_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<TeamMember>>, sqlx::Error> {
        #[derive(sqlx::FromRow)]
        struct Row {
            task_id: Uuid,
            id: Uuid,
            name: String,
            title: String,
            role: String,
            email: String,
        }

        let rows = sqlx::query_as::<_, Row>(
            r#"
            SELECT tt.task_id, u.id, u.name, u.title, u.role, u.email
            FROM task_team tt
            JOIN users u ON u.id = tt.user_id
            WHERE tt.task_id = ANY($1)
            ORDER BY u.name
            "#,
        )
        .bind(task_ids)
        .fetch_all(pool)
        .await?;

        let mut grouped: HashMap<Uuid, Vec<TeamMember>> = HashMap::new();
        for row in rows {
            grouped.entry(row.task_id).or_default().push(TeamMember {
                id: row.id,
                name: row.name,
                title: row.title,
                role: row.role,
                email: row.email,
            });
        }

        Ok(grouped)
    }
}

/// Checks that every id references an existing user
///
/// Applied on both create and update paths so an unknown member surfaces
/// as a clean 400 instead of a foreign-key violation.
async fn verify_team_exists(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    team: &[Uuid],
) -> Result<(), TaskStoreError> {
    for user_id in team {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE id = $1)")
            .bind(user_id)
            .fetch_one(&mut **tx)
            .await?;

        if !exists {
            return Err(TaskStoreError::TeamMemberNotFound(*user_id));
        }
    }

    Ok(())
}

/// A task hydrated with its team, activity log, and sub-tasks
///
/// This is the shape the list and get endpoints return.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDetail {
    #[serde(flatten)]
    pub task: Task,
    pub team: Vec<TeamMember>,
    pub activities: Vec<ActivityWithUser>,
    pub sub_tasks: Vec<SubTask>,
}

impl TaskDetail {
    /// Hydrates a single task
    pub async fn load(pool: &PgPool, task: Task) -> Result<Self, sqlx::Error> {
        let team = Task::team(pool, task.id).await?;
        let activities = ActivityWithUser::list_for_task(pool, task.id).await?;
        let sub_tasks = SubTask::list_for_task(pool, task.id).await?;

        Ok(Self {
            task,
            team,
            activities,
            sub_tasks,
        })
    }

    /// Hydrates a whole listing with three grouped queries
    pub async fn load_many(pool: &PgPool, tasks: Vec<Task>) -> Result<Vec<Self>, sqlx::Error> {
        let ids: Vec<Uuid> = tasks.iter().map(|t| t.id).collect();

        let mut teams = Task::teams_for(pool, &ids).await?;
        let mut activities = ActivityWithUser::list_for_tasks(pool, &ids).await?;
        let mut sub_tasks = SubTask::list_for_tasks(pool, &ids).await?;

        Ok(tasks
            .into_iter()
            .map(|task| {
                let id = task.id;
                Self {
                    task,
                    team: teams.remove(&id).unwrap_or_default(),
                    activities: activities.remove(&id).unwrap_or_default(),
                    sub_tasks: sub_tasks.remove(&id).unwrap_or_default(),
                }
            })
            .collect())
    }
}
