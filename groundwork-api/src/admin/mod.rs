/// Admin console
///
/// A JSON API over the registered [`views::AdminView`]s, mounted at
/// `/v1/admin` and restricted to admins:
///
/// - `GET /v1/admin` - View metadata grouped by category
/// - `GET /v1/admin/:view?page=&size=&search=` - Paginated rows, soft-deleted included
/// - `GET /v1/admin/:view/:id` - One row
/// - `DELETE /v1/admin/:view/:id` - Soft delete, or hard delete if already soft-deleted

pub mod views;

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extractors::AdminUser,
};
use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use groundwork_shared::{
    db::pagination::{Page, PageParams},
    models::base::DeleteOutcome,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::info;
use views::{all_views, find_view, AdminError, AdminView};

pub const PREFIX: &str = "/admin";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/:view", get(list_rows))
        .route("/:view/:id", get(get_row).delete(delete_row))
}

impl From<AdminError> for ApiError {
    fn from(err: AdminError) -> Self {
        match err {
            AdminError::Database(e) => e.into(),
            AdminError::Serialize(e) => ApiError::InternalError(e.to_string()),
        }
    }
}

/// View metadata
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ViewInfo {
    pub identity: String,
    pub name: String,
    pub name_plural: String,
    pub columns: Vec<String>,
}

impl ViewInfo {
    fn of(view: &dyn AdminView) -> Self {
        Self {
            identity: view.identity().to_string(),
            name: view.name().to_string(),
            name_plural: view.name_plural().to_string(),
            columns: view.columns().iter().map(|c| c.to_string()).collect(),
        }
    }
}

/// Views grouped by category, categories sorted by name
pub fn grouped_views() -> BTreeMap<String, Vec<ViewInfo>> {
    let mut groups: BTreeMap<String, Vec<ViewInfo>> = BTreeMap::new();
    for view in all_views() {
        groups
            .entry(view.category().to_string())
            .or_default()
            .push(ViewInfo::of(view.as_ref()));
    }
    groups
}

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub page: Option<i64>,
    pub size: Option<i64>,
    pub search: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub detail: String,
    pub outcome: DeleteOutcome,
}

fn view_or_404(identity: &str) -> ApiResult<Box<dyn AdminView>> {
    find_view(identity).ok_or_else(|| ApiError::NotFound(format!("Unknown admin view '{}'", identity)))
}

fn row_not_found() -> ApiError {
    ApiError::NotFound("Resource not found".to_string())
}

pub async fn index(AdminUser(_admin): AdminUser) -> Json<BTreeMap<String, Vec<ViewInfo>>> {
    Json(grouped_views())
}

pub async fn list_rows(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(view): Path<String>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Page<Value>>> {
    let view = view_or_404(&view)?;
    let window = PageParams {
        page: params.page,
        size: params.size,
    }
    .resolve(state.page_size());
    let search = params.search.as_deref().map(str::trim).filter(|s| !s.is_empty());

    Ok(Json(view.list(&state.db, window, search).await?))
}

pub async fn get_row(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path((view, id)): Path<(String, i64)>,
) -> ApiResult<Json<Value>> {
    let view = view_or_404(&view)?;

    view.get(&state.db, id)
        .await?
        .map(Json)
        .ok_or_else(row_not_found)
}

pub async fn delete_row(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path((view, id)): Path<(String, i64)>,
) -> ApiResult<Json<DeleteResponse>> {
    let view = view_or_404(&view)?;

    let outcome = view
        .delete(&state.db, id)
        .await?
        .ok_or_else(row_not_found)?;

    info!(view = view.identity(), id, ?outcome, actor = admin.id, "Admin delete");

    let detail = match outcome {
        DeleteOutcome::SoftDeleted => format!("{} {} soft-deleted", view.name(), id),
        DeleteOutcome::HardDeleted => format!("{} {} permanently deleted", view.name(), id),
    };
    Ok(Json(DeleteResponse { detail, outcome }))
}
