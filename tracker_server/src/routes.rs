//! HTTP routes for users and their exercise logs.

use crate::error::ApiError;
use crate::extract::{LogParams, RequestBody};
use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracker_core::{
    CreatedUser, ExerciseLog, ExerciseSummary, LogView, NewExercise, User,
    UserDirectory, UserId,
};

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub directory: UserDirectory,
    pub exercises: ExerciseLog,
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/users", post(create_user).get(list_users))
        .route("/api/users/:id/exercises", post(add_exercise))
        .route("/api/users/:id/logs", get(get_logs))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn create_user(
    State(state): State<AppState>,
    body: RequestBody,
) -> Result<Json<CreatedUser>, ApiError> {
    let username = body.text("username");
    let created = state.directory.create_user(username.as_deref())?;
    Ok(Json(created))
}

async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<User>>, ApiError> {
    Ok(Json(state.directory.list_users().await?))
}

async fn add_exercise(
    State(state): State<AppState>,
    Path(id): Path<String>,
    RequestBody(body): RequestBody,
) -> Result<Json<ExerciseSummary>, ApiError> {
    let exercise = NewExercise::from_body(&body);
    let summary = state
        .exercises
        .append_exercise(&UserId::from(id), exercise)
        .await?;
    Ok(Json(summary))
}

async fn get_logs(
    State(state): State<AppState>,
    Path(id): Path<String>,
    LogParams(query): LogParams,
) -> Result<Json<LogView>, ApiError> {
    let view = state.exercises.get_log(&UserId::from(id), &query).await?;
    Ok(Json(view))
}
