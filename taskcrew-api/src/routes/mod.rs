/// API route handlers
///
/// # Modules
///
/// - `health`: Liveness and database connectivity probe
/// - `users`: Registration, session management, team and profile endpoints
/// - `tasks`: Task CRUD, activity log, sub-tasks, dashboard

pub mod health;
pub mod tasks;
pub mod users;
