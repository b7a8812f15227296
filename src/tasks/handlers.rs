use axum::{
    extract::State,
    http::{header::LOCATION, HeaderMap, HeaderValue, StatusCode},
    routing::get,
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::{
    dto::{CreateTaskRequest, DeletedResponse, ListQuery, TaskResponse, UpdateTaskRequest},
    repo_types::TaskFilter,
    services,
};
use crate::{
    auth::AuthUser,
    error::AppResult,
    extract::{ApiJson, ApiPath, ApiQuery},
    state::AppState,
};

pub fn task_routes() -> Router<AppState> {
    Router::new()
        .route("/tasks", get(list_tasks).post(create_task))
        .route(
            "/tasks/:id",
            get(get_task).put(update_task).delete(delete_task),
        )
}

#[instrument(skip(state))]
pub async fn list_tasks(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> AppResult<Json<Vec<TaskResponse>>> {
    let filter = TaskFilter::try_from(query)?;
    let tasks = services::list_tasks(state.tasks.as_ref(), user_id, &filter).await?;
    Ok(Json(tasks.into_iter().map(TaskResponse::from).collect()))
}

#[instrument(skip(state, payload))]
pub async fn create_task(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiJson(payload): ApiJson<CreateTaskRequest>,
) -> AppResult<(StatusCode, HeaderMap, Json<TaskResponse>)> {
    let task = services::create_task(state.tasks.as_ref(), user_id, payload).await?;

    let mut headers = HeaderMap::new();
    if let Ok(location) = HeaderValue::from_str(&format!("/api/tasks/{}", task.id)) {
        headers.insert(LOCATION, location);
    }

    Ok((StatusCode::CREATED, headers, Json(task.into())))
}

#[instrument(skip(state))]
pub async fn get_task(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<TaskResponse>> {
    let task = services::get_task(state.tasks.as_ref(), user_id, id).await?;
    Ok(Json(task.into()))
}

#[instrument(skip(state, payload))]
pub async fn update_task(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdateTaskRequest>,
) -> AppResult<Json<TaskResponse>> {
    let task = services::update_task(state.tasks.as_ref(), user_id, id, payload).await?;
    Ok(Json(task.into()))
}

#[instrument(skip(state))]
pub async fn delete_task(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<DeletedResponse>> {
    services::delete_task(state.tasks.as_ref(), user_id, id).await?;
    Ok(Json(DeletedResponse {
        message: "Task removed".into(),
        id,
    }))
}
