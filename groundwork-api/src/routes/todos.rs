/// Todo endpoints, the sample feature module
///
/// Every route requires an authenticated user. New modules scaffolded with
/// `groundwork new-module` start from this shape.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extractors::CurrentUser,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use groundwork_shared::{
    db::pagination::{Page, PageParams},
    locale::Message,
    models::todo::{Todo, TodoData},
};
use validator::Validate;

pub const PREFIX: &str = "/todos";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_todos).post(create_todo))
        .route("/:id", get(get_todo).put(update_todo).delete(delete_todo))
}

pub async fn list_todos(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Query(params): Query<PageParams>,
) -> ApiResult<Json<Page<Todo>>> {
    let window = params.resolve(state.page_size());

    let todos = Todo::list(&state.db, window.limit(), window.offset()).await?;
    let count = Todo::count(&state.db).await?;

    Ok(Json(Page::new(todos, count, window)))
}

pub async fn create_todo(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Json(data): Json<TodoData>,
) -> ApiResult<(StatusCode, Json<Todo>)> {
    data.validate()?;

    let todo = Todo::create(&state.db, data).await?;
    tracing::debug!(todo_id = todo.id, "Todo created");

    Ok((StatusCode::CREATED, Json(todo)))
}

pub async fn get_todo(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<Todo>> {
    Todo::find_by_id(&state.db, id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(Message::TodoNotFound))
}

pub async fn update_todo(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(id): Path<i64>,
    Json(data): Json<TodoData>,
) -> ApiResult<Json<Todo>> {
    data.validate()?;

    Todo::update(&state.db, id, data)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(Message::TodoNotFound))
}

pub async fn delete_todo(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    if !Todo::soft_delete(&state.db, id).await? {
        return Err(ApiError::not_found(Message::TodoNotFound));
    }

    Ok(StatusCode::NO_CONTENT)
}
