/// Task route handlers
///
/// Listing and dashboard output is visibility-filtered: non-admin sessions
/// only ever see tasks they are teamed on, admins see everything. Stage and
/// priority strings from clients go through the normalization layer, so
/// `"in progress"` and `"IN_PROGRESS"` are the same filter and unknown
/// values are rejected with a 400.
///
/// Soft delete: trashing hides a task behind the `isTrashed` filter; the
/// `DELETE` endpoint's `actionType` decides between permanent delete,
/// restore, and their bulk variants over the whole trash.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::Json,
};
use axum::{
    extract::{Path, Query, State},
    Extension,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use taskcrew_shared::auth::middleware::AuthContext;
use taskcrew_shared::models::activity::{Activity, ActivityType, NewActivity};
use taskcrew_shared::models::sub_task::{CreateSubTask, SubTask};
use taskcrew_shared::models::task::{
    CreateTask, Task, TaskDetail, TaskFilter, TaskPriority, TaskStage, UpdateTask,
};
use taskcrew_shared::models::user::User;
use taskcrew_shared::stats;
use uuid::Uuid;
use validator::Validate;

/// Builds the assignment alert posted to a task's activity log on creation
/// and duplication.
fn assignment_alert(team_size: usize, priority: TaskPriority, date: DateTime<Utc>) -> String {
    let mut text = String::from("New task has been assigned to you");
    if team_size > 1 {
        text.push_str(&format!(" and {} others.", team_size - 1));
    }
    text.push_str(&format!(
        " The task priority is set a {} priority, so check and act accordingly. \
         The task date is {}. Thank you!!!",
        priority.label(),
        date.format("%a %b %d %Y"),
    ));
    text
}

/// The member filter for a session: admins see everything
fn visibility(auth: &AuthContext) -> Option<Uuid> {
    if auth.is_admin {
        None
    } else {
        Some(auth.user_id)
    }
}

/// Task listing query parameters
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskListQuery {
    pub stage: Option<String>,

    /// Any value other than "false" switches the listing to the trash
    pub is_trashed: Option<String>,

    pub search: Option<String>,
}

/// GET /api/task
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<TaskListQuery>,
) -> ApiResult<Json<serde_json::Value>> {
    let stage = match query.stage.as_deref() {
        Some(stage) if !stage.is_empty() => Some(TaskStage::parse(stage)?),
        _ => None,
    };

    let is_trashed = query
        .is_trashed
        .as_deref()
        .map(|v| !v.is_empty() && v != "false")
        .unwrap_or(false);

    let filter = TaskFilter {
        member: visibility(&auth),
        stage,
        is_trashed,
        search: query.search.filter(|s| !s.is_empty()),
    };

    let tasks = Task::list(&state.db, &filter).await?;
    let tasks = TaskDetail::load_many(&state.db, tasks).await?;

    Ok(Json(json!({
        "status": true,
        "tasks": tasks,
    })))
}

/// GET /api/task/dashboard
///
/// Aggregated statistics over the visible, non-trashed tasks plus the ten
/// most recent of them hydrated for display. Admins additionally get the
/// ten most recently created users.
pub async fn dashboard(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<serde_json::Value>> {
    let tasks = Task::list_visible(&state.db, visibility(&auth)).await?;
    let summary = stats::summarize(&tasks);

    let last_ten: Vec<Task> = tasks.into_iter().take(10).collect();
    let last_ten = TaskDetail::load_many(&state.db, last_ten).await?;

    let users = if auth.is_admin {
        User::list_recent(&state.db, 10).await?
    } else {
        Vec::new()
    };

    Ok(Json(json!({
        "status": true,
        "message": "Successfully",
        "totalTasks": summary.total_tasks,
        "last10Task": last_ten,
        "users": users,
        "tasks": summary.tasks,
        "graphData": summary.graph_data,
    })))
}

/// GET /api/task/:id
pub async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    let task = Task::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found.".to_string()))?;

    let task = TaskDetail::load(&state.db, task).await?;

    Ok(Json(json!({
        "status": true,
        "task": task,
    })))
}

/// Task creation request body
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub team: Vec<Uuid>,

    /// Free-form; normalized, defaults to TODO
    #[serde(default)]
    pub stage: Option<String>,

    /// Free-form; normalized, defaults to NORMAL
    #[serde(default)]
    pub priority: Option<String>,

    #[serde(default)]
    pub date: Option<DateTime<Utc>>,

    #[serde(default)]
    pub assets: Vec<String>,

    #[serde(default)]
    pub links: Vec<String>,
}

/// POST /api/task
///
/// Creates a task (admin). Team existence is verified before anything is
/// written; an ASSIGNED activity with the alert text is appended after.
pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<CreateTaskRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    payload.validate()?;

    let stage = match payload.stage.as_deref() {
        Some(stage) if !stage.is_empty() => TaskStage::parse(stage)?,
        _ => TaskStage::Todo,
    };
    let priority = match payload.priority.as_deref() {
        Some(priority) if !priority.is_empty() => TaskPriority::parse(priority)?,
        _ => TaskPriority::Normal,
    };
    let date = payload.date.unwrap_or_else(Utc::now);
    let team_size = payload.team.len();

    let task = Task::create(
        &state.db,
        CreateTask {
            title: payload.title,
            description: payload.description,
            priority,
            stage,
            date,
            assets: payload.assets,
            links: payload.links,
            team: payload.team,
        },
    )
    .await?;

    Activity::append(
        &state.db,
        task.id,
        NewActivity {
            activity_type: ActivityType::Assigned,
            text: assignment_alert(team_size, priority, date),
            by: auth.user_id,
        },
    )
    .await?;

    Ok(Json(json!({
        "status": true,
        "message": "Task created successfully.",
        "task": task,
    })))
}

/// POST /api/task/duplicate/:id
///
/// Copies a task as "Duplicate - {title}" with its team and sub-tasks, and
/// a fresh ASSIGNED activity. The original's activity log is not copied.
pub async fn duplicate_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    let original = Task::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found.".to_string()))?;

    let team = Task::team_ids(&state.db, id).await?;
    let sub_tasks = SubTask::list_for_task(&state.db, id).await?;
    let team_size = team.len();

    let duplicate = Task::create(
        &state.db,
        CreateTask {
            title: format!("Duplicate - {}", original.title),
            description: original.description.clone(),
            priority: original.priority,
            stage: original.stage,
            date: original.date,
            assets: original.assets.clone(),
            links: original.links.clone(),
            team,
        },
    )
    .await?;

    for sub_task in sub_tasks {
        SubTask::create(
            &state.db,
            duplicate.id,
            CreateSubTask {
                title: sub_task.title,
                date: sub_task.date,
                tag: sub_task.tag,
            },
        )
        .await?;
    }

    Activity::append(
        &state.db,
        duplicate.id,
        NewActivity {
            activity_type: ActivityType::Assigned,
            text: assignment_alert(team_size, duplicate.priority, duplicate.date),
            by: auth.user_id,
        },
    )
    .await?;

    Ok(Json(json!({
        "status": true,
        "message": "Task duplicated successfully.",
        "task": duplicate,
    })))
}

/// Activity request body
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PostActivityRequest {
    /// Free-form; normalized against the activity vocabulary
    #[serde(rename = "type")]
    pub activity_type: String,

    #[validate(length(min = 1, message = "Activity text is required"))]
    pub activity: String,
}

/// POST /api/task/activity/:id
pub async fn post_activity(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(payload): Json<PostActivityRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    payload.validate()?;

    let activity_type = ActivityType::parse(&payload.activity_type)?;

    Task::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found.".to_string()))?;

    Activity::append(
        &state.db,
        id,
        NewActivity {
            activity_type,
            text: payload.activity,
            by: auth.user_id,
        },
    )
    .await?;

    Ok(Json(json!({
        "status": true,
        "message": "Activity posted successfully.",
    })))
}

/// Task update request body
///
/// Content fields are replaced wholesale; an omitted `team` keeps the
/// current membership.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub team: Option<Vec<Uuid>>,

    pub stage: String,

    pub priority: String,

    pub date: DateTime<Utc>,

    #[serde(default)]
    pub assets: Vec<String>,

    #[serde(default)]
    pub links: Vec<String>,
}

/// PUT /api/task/:id
pub async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateTaskRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    payload.validate()?;

    let task = Task::update(
        &state.db,
        id,
        UpdateTask {
            title: payload.title,
            description: payload.description,
            priority: TaskPriority::parse(&payload.priority)?,
            stage: TaskStage::parse(&payload.stage)?,
            date: payload.date,
            assets: payload.assets,
            links: payload.links,
            team: payload.team,
        },
    )
    .await?;

    Ok(Json(json!({
        "status": true,
        "message": "Task updated successfully.",
        "task": task,
    })))
}

/// Stage change request body
#[derive(Debug, Deserialize)]
pub struct ChangeStageRequest {
    pub stage: String,
}

/// PUT /api/task/stage/:id
pub async fn change_stage(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ChangeStageRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let stage = TaskStage::parse(&payload.stage)?;

    let task = Task::set_stage(&state.db, id, stage)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found.".to_string()))?;

    Ok(Json(json!({
        "status": true,
        "message": "Task stage changed successfully.",
        "task": task,
    })))
}

/// Sub-task completion request body
#[derive(Debug, Deserialize)]
pub struct ChangeSubTaskStageRequest {
    pub status: bool,
}

/// PUT /api/task/sub-stage/:task_id/:sub_task_id
pub async fn change_sub_task_stage(
    State(state): State<AppState>,
    Path((task_id, sub_task_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<ChangeSubTaskStageRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let updated = SubTask::set_completed(&state.db, task_id, sub_task_id, payload.status).await?;
    if !updated {
        return Err(ApiError::NotFound("Sub-task not found.".to_string()));
    }

    let message = if payload.status {
        "Sub-task marked as completed"
    } else {
        "Sub-task marked as in progress"
    };

    Ok(Json(json!({
        "status": true,
        "message": message,
    })))
}

/// Sub-task creation request body
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubTaskRequest {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,

    #[serde(default)]
    pub date: Option<DateTime<Utc>>,

    #[serde(default)]
    pub tag: Option<String>,
}

/// POST /api/task/sub-task/:id
pub async fn create_sub_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CreateSubTaskRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    payload.validate()?;

    Task::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found.".to_string()))?;

    let sub_task = SubTask::create(
        &state.db,
        id,
        CreateSubTask {
            title: payload.title,
            date: payload.date,
            tag: payload.tag,
        },
    )
    .await?;

    Ok(Json(json!({
        "status": true,
        "message": "SubTask added successfully.",
        "subTask": sub_task,
    })))
}

/// PUT /api/task/trash/:id
pub async fn trash_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    let trashed = Task::set_trashed(&state.db, id, true).await?;
    if !trashed {
        return Err(ApiError::NotFound("Task not found.".to_string()));
    }

    Ok(Json(json!({
        "status": true,
        "message": "Task trashed successfully.",
    })))
}

/// Delete/restore query parameters
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteRestoreQuery {
    pub action_type: String,
}

/// DELETE /api/task/:id?actionType=delete|deleteAll|restore|restoreAll
///
/// The bulk variants operate on the whole trash and ignore the path id.
pub async fn delete_or_restore_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<DeleteRestoreQuery>,
) -> ApiResult<Json<serde_json::Value>> {
    match query.action_type.as_str() {
        "delete" => {
            if !Task::delete(&state.db, id).await? {
                return Err(ApiError::NotFound("Task not found.".to_string()));
            }
        }
        "deleteAll" => {
            Task::delete_all_trashed(&state.db).await?;
        }
        "restore" => {
            if !Task::set_trashed(&state.db, id, false).await? {
                return Err(ApiError::NotFound("Task not found.".to_string()));
            }
        }
        "restoreAll" => {
            Task::restore_all_trashed(&state.db).await?;
        }
        other => {
            return Err(ApiError::BadRequest(format!(
                "Unknown actionType: {}",
                other
            )));
        }
    }

    Ok(Json(json!({
        "status": true,
        "message": "Operation performed successfully.",
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assignment_alert_single_member() {
        let date = DateTime::parse_from_rfc3339("2026-02-05T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);

        let text = assignment_alert(1, TaskPriority::High, date);
        assert!(text.starts_with("New task has been assigned to you The task priority"));
        assert!(text.contains("set a high priority"));
        assert!(text.contains("Thu Feb 05 2026"));
        assert!(text.ends_with("Thank you!!!"));
    }

    #[test]
    fn test_assignment_alert_mentions_other_members() {
        let text = assignment_alert(4, TaskPriority::Normal, Utc::now());
        assert!(text.contains("and 3 others."));
    }
}
