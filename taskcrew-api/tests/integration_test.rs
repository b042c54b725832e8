/// Integration tests for the TaskCrew API
///
/// These verify the full system end-to-end against a real database:
/// - Registration and login (cookie issuance, 401 paths)
/// - Task lifecycle (create, normalize, trash, restore, delete)
/// - Visibility filtering for non-admin sessions
/// - Admin gating
/// - Dashboard aggregation invariants
///
/// All tests are `#[ignore]`d because they need PostgreSQL; run them with
/// `cargo test -- --ignored` and a `DATABASE_URL`/`JWT_SECRET` environment.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{create_test_task, get_request, json_request, response_json, TestContext};
use serde_json::json;
use taskcrew_shared::auth::password::hash_password;
use taskcrew_shared::models::task::{Task, TaskPriority, TaskStage};
use taskcrew_shared::models::user::{CreateUser, User};
use tower::Service as _;
use uuid::Uuid;

#[tokio::test]
#[ignore = "requires a running PostgreSQL"]
async fn test_health_check() {
    let ctx = TestContext::new().await.unwrap();

    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let response = ctx.app.clone().call(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "connected");

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL"]
async fn test_register_login_roundtrip() {
    let ctx = TestContext::new().await.unwrap();
    let email = format!("newuser-{}@example.com", Uuid::new_v4());

    // Register without a username: it defaults to the email local part
    let request = Request::builder()
        .method("POST")
        .uri("/api/user/register")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({
                "name": "New User",
                "email": email,
                "password": "newuserpass1",
            })
            .to_string(),
        ))
        .unwrap();
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = response_json(response).await;
    assert_eq!(body["status"], true);
    assert_eq!(
        body["user"]["username"],
        email.split('@').next().unwrap().to_lowercase()
    );
    assert!(body["user"].get("passwordHash").is_none());
    let user_id: Uuid = serde_json::from_value(body["user"]["id"].clone()).unwrap();

    // Wrong password answers 401
    let request = Request::builder()
        .method("POST")
        .uri("/api/user/login")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({ "email": email, "password": "wrongpass1" }).to_string(),
        ))
        .unwrap();
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Correct password logs in and sets the session cookie
    let request = Request::builder()
        .method("POST")
        .uri("/api/user/login")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({ "email": email, "password": "newuserpass1" }).to_string(),
        ))
        .unwrap();
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let cookie = response
        .headers()
        .get("set-cookie")
        .and_then(|v| v.to_str().ok())
        .unwrap()
        .to_string();
    assert!(cookie.starts_with("token="));
    assert!(cookie.contains("HttpOnly"));

    // The cookie authenticates subsequent requests
    let request = Request::builder()
        .uri("/api/user/team")
        .header("cookie", cookie.split(';').next().unwrap())
        .body(Body::empty())
        .unwrap();
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    User::delete(&ctx.db, user_id).await.unwrap();
    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL"]
async fn test_duplicate_email_rejected() {
    let ctx = TestContext::new().await.unwrap();

    let request = Request::builder()
        .method("POST")
        .uri("/api/user/register")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({
                "name": "Copycat",
                "email": ctx.member.email,
                "password": "copycatpass1",
            })
            .to_string(),
        ))
        .unwrap();
    let response = ctx.app.clone().call(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert_eq!(body["status"], false);
    assert_eq!(body["message"], "Email address already exists");

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL"]
async fn test_create_task_normalizes_stage_and_priority() {
    let ctx = TestContext::new().await.unwrap();

    let request = json_request(
        "POST",
        "/api/task",
        &ctx.admin_token,
        json!({
            "title": "Normalize me",
            "team": [ctx.member.id],
            "stage": "in progress",
            "priority": "high",
        }),
    );
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    assert_eq!(body["status"], true);
    assert_eq!(body["task"]["stage"], "IN_PROGRESS");
    assert_eq!(body["task"]["priority"], "HIGH");
    let task_id: Uuid = serde_json::from_value(body["task"]["id"].clone()).unwrap();

    // Creation appended an ASSIGNED activity with the alert text
    let request = get_request("GET", &format!("/api/task/{}", task_id), &ctx.admin_token);
    let response = ctx.app.clone().call(request).await.unwrap();
    let body = response_json(response).await;
    let activities = body["task"]["activities"].as_array().unwrap();
    assert_eq!(activities.len(), 1);
    assert_eq!(activities[0]["type"], "ASSIGNED");
    assert!(activities[0]["text"]
        .as_str()
        .unwrap()
        .starts_with("New task has been assigned to you"));

    // The stage filter accepts the un-normalized spelling
    let request = get_request("GET", "/api/task?stage=in%20progress", &ctx.member_token);
    let response = ctx.app.clone().call(request).await.unwrap();
    let body = response_json(response).await;
    let tasks = body["tasks"].as_array().unwrap();
    assert!(tasks.iter().any(|t| t["id"] == json!(task_id)));

    ctx.remove_task(task_id).await.unwrap();
    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL"]
async fn test_unknown_stage_rejected() {
    let ctx = TestContext::new().await.unwrap();

    let request = json_request(
        "POST",
        "/api/task",
        &ctx.admin_token,
        json!({ "title": "Bad stage", "stage": "archived" }),
    );
    let response = ctx.app.clone().call(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert_eq!(body["status"], false);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL"]
async fn test_non_admin_cannot_create_task() {
    let ctx = TestContext::new().await.unwrap();

    let request = json_request(
        "POST",
        "/api/task",
        &ctx.member_token,
        json!({ "title": "Forbidden" }),
    );
    let response = ctx.app.clone().call(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL"]
async fn test_visibility_filtering() {
    let ctx = TestContext::new().await.unwrap();

    // Teamed on the admin only; the member must never see it
    let task = create_test_task(
        &ctx,
        &format!("Admin-only {}", Uuid::new_v4()),
        TaskStage::Todo,
        TaskPriority::Normal,
        vec![ctx.admin.id],
    )
    .await
    .unwrap();

    let request = get_request("GET", "/api/task", &ctx.member_token);
    let response = ctx.app.clone().call(request).await.unwrap();
    let body = response_json(response).await;
    let tasks = body["tasks"].as_array().unwrap();
    assert!(!tasks.iter().any(|t| t["id"] == json!(task.id)));

    let request = get_request("GET", "/api/task", &ctx.admin_token);
    let response = ctx.app.clone().call(request).await.unwrap();
    let body = response_json(response).await;
    let tasks = body["tasks"].as_array().unwrap();
    assert!(tasks.iter().any(|t| t["id"] == json!(task.id)));

    ctx.remove_task(task.id).await.unwrap();
    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL"]
async fn test_trash_restore_delete_lifecycle() {
    let ctx = TestContext::new().await.unwrap();

    let task = create_test_task(
        &ctx,
        &format!("Lifecycle {}", Uuid::new_v4()),
        TaskStage::Todo,
        TaskPriority::Low,
        vec![ctx.admin.id],
    )
    .await
    .unwrap();

    // Trash hides it from the default listing
    let request = get_request("PUT", &format!("/api/task/trash/{}", task.id), &ctx.admin_token);
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let request = get_request("GET", "/api/task", &ctx.admin_token);
    let body = response_json(ctx.app.clone().call(request).await.unwrap()).await;
    assert!(!body["tasks"]
        .as_array()
        .unwrap()
        .iter()
        .any(|t| t["id"] == json!(task.id)));

    // But the trash listing has it
    let request = get_request("GET", "/api/task?isTrashed=true", &ctx.admin_token);
    let body = response_json(ctx.app.clone().call(request).await.unwrap()).await;
    assert!(body["tasks"]
        .as_array()
        .unwrap()
        .iter()
        .any(|t| t["id"] == json!(task.id)));

    // Restore brings it back losslessly
    let request = get_request(
        "DELETE",
        &format!("/api/task/{}?actionType=restore", task.id),
        &ctx.admin_token,
    );
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let restored = Task::find_by_id(&ctx.db, task.id).await.unwrap().unwrap();
    assert!(!restored.is_trashed);
    assert_eq!(restored.title, task.title);

    // Permanent delete: a later get answers 404
    let request = get_request(
        "DELETE",
        &format!("/api/task/{}?actionType=delete", task.id),
        &ctx.admin_token,
    );
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let request = get_request("GET", &format!("/api/task/{}", task.id), &ctx.admin_token);
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL"]
async fn test_sub_task_add_and_toggle() {
    let ctx = TestContext::new().await.unwrap();

    let task = create_test_task(
        &ctx,
        &format!("With sub-tasks {}", Uuid::new_v4()),
        TaskStage::Todo,
        TaskPriority::Normal,
        vec![ctx.member.id],
    )
    .await
    .unwrap();

    let request = json_request(
        "POST",
        &format!("/api/task/sub-task/{}", task.id),
        &ctx.admin_token,
        json!({ "title": "Write tests", "tag": "qa" }),
    );
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    let sub_task_id: Uuid = serde_json::from_value(body["subTask"]["id"].clone()).unwrap();
    assert_eq!(body["subTask"]["isCompleted"], false);

    let request = json_request(
        "PUT",
        &format!("/api/task/sub-stage/{}/{}", task.id, sub_task_id),
        &ctx.member_token,
        json!({ "status": true }),
    );
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // A mismatched task/sub-task pair updates nothing
    let request = json_request(
        "PUT",
        &format!("/api/task/sub-stage/{}/{}", Uuid::new_v4(), sub_task_id),
        &ctx.member_token,
        json!({ "status": false }),
    );
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    ctx.remove_task(task.id).await.unwrap();
    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL"]
async fn test_duplicate_task() {
    let ctx = TestContext::new().await.unwrap();

    let task = create_test_task(
        &ctx,
        &format!("Original {}", Uuid::new_v4()),
        TaskStage::InProgress,
        TaskPriority::High,
        vec![ctx.member.id],
    )
    .await
    .unwrap();

    let request = get_request(
        "POST",
        &format!("/api/task/duplicate/{}", task.id),
        &ctx.admin_token,
    );
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    assert_eq!(
        body["task"]["title"],
        format!("Duplicate - {}", task.title)
    );
    assert_eq!(body["task"]["stage"], "IN_PROGRESS");
    assert_eq!(body["task"]["priority"], "HIGH");
    let duplicate_id: Uuid = serde_json::from_value(body["task"]["id"].clone()).unwrap();

    // Team carried over
    let team = Task::team_ids(&ctx.db, duplicate_id).await.unwrap();
    assert_eq!(team, vec![ctx.member.id]);

    ctx.remove_task(task.id).await.unwrap();
    ctx.remove_task(duplicate_id).await.unwrap();
    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL"]
async fn test_task_status_keeps_same_named_users_apart() {
    let ctx = TestContext::new().await.unwrap();

    // Two distinct accounts sharing a display name, two tasks each
    let mut twins = Vec::new();
    for _ in 0..2 {
        let twin = User::create(
            &ctx.db,
            CreateUser {
                username: format!("twin-{}", Uuid::new_v4()),
                name: "Alex Doe".to_string(),
                email: format!("twin-{}@example.com", Uuid::new_v4()),
                password_hash: hash_password("twinpass1").unwrap(),
                title: "Developer".to_string(),
                role: "user".to_string(),
                is_admin: false,
            },
        )
        .await
        .unwrap();
        twins.push(twin);
    }

    let mut tasks = Vec::new();
    for twin in &twins {
        for _ in 0..2 {
            let task = create_test_task(
                &ctx,
                &format!("Twin task {}", Uuid::new_v4()),
                TaskStage::Todo,
                TaskPriority::Normal,
                vec![twin.id],
            )
            .await
            .unwrap();
            tasks.push(task.id);
        }
    }

    // Each account gets exactly one entry carrying all of its tasks
    let statuses = User::task_status(&ctx.db).await.unwrap();
    for twin in &twins {
        let entries: Vec<_> = statuses.iter().filter(|s| s.id == twin.id).collect();
        assert_eq!(entries.len(), 1, "one entry per account, not per name");
        assert_eq!(entries[0].tasks.len(), 2);
    }

    for task_id in tasks {
        ctx.remove_task(task_id).await.unwrap();
    }
    for twin in twins {
        User::delete(&ctx.db, twin.id).await.unwrap();
    }
    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL"]
async fn test_dashboard_totals_match_stage_counts() {
    let ctx = TestContext::new().await.unwrap();

    let mut created = Vec::new();
    for (stage, priority) in [
        (TaskStage::Todo, TaskPriority::Low),
        (TaskStage::InProgress, TaskPriority::High),
        (TaskStage::Completed, TaskPriority::High),
    ] {
        let task = create_test_task(
            &ctx,
            &format!("Dashboard {}", Uuid::new_v4()),
            stage,
            priority,
            vec![ctx.member.id],
        )
        .await
        .unwrap();
        created.push(task.id);
    }

    // The member only sees their own tasks; totals must be internally
    // consistent regardless of what else is in the database
    let request = get_request("GET", "/api/task/dashboard", &ctx.member_token);
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    let total = body["totalTasks"].as_u64().unwrap();
    let stage_sum: u64 = body["tasks"]
        .as_array()
        .unwrap()
        .iter()
        .map(|slice| slice["total"].as_u64().unwrap())
        .sum();
    assert_eq!(total, stage_sum);
    assert!(total >= 3);

    // Non-admin dashboards carry no user listing
    assert_eq!(body["users"].as_array().unwrap().len(), 0);

    // Admin dashboards do
    let request = get_request("GET", "/api/task/dashboard", &ctx.admin_token);
    let body = response_json(ctx.app.clone().call(request).await.unwrap()).await;
    assert!(!body["users"].as_array().unwrap().is_empty());

    // Deactivated accounts never show up in the admin user listing
    let ghost = User::create(
        &ctx.db,
        CreateUser {
            username: format!("ghost-{}", Uuid::new_v4()),
            name: "Ghost User".to_string(),
            email: format!("ghost-{}@example.com", Uuid::new_v4()),
            password_hash: hash_password("ghostpass1").unwrap(),
            title: "Developer".to_string(),
            role: "user".to_string(),
            is_admin: false,
        },
    )
    .await
    .unwrap();
    User::set_active(&ctx.db, ghost.id, false).await.unwrap();

    let request = get_request("GET", "/api/task/dashboard", &ctx.admin_token);
    let body = response_json(ctx.app.clone().call(request).await.unwrap()).await;
    assert!(!body["users"]
        .as_array()
        .unwrap()
        .iter()
        .any(|u| u["id"] == json!(ghost.id)));

    User::delete(&ctx.db, ghost.id).await.unwrap();

    for task_id in created {
        ctx.remove_task(task_id).await.unwrap();
    }
    ctx.cleanup().await.unwrap();
}
