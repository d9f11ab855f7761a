/// Role management endpoints (admin only)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extractors::AdminUser,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use groundwork_shared::{
    locale::Message,
    models::role::{CreateRole, Role, UpdateRole},
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::info;

pub const PREFIX: &str = "/roles";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_roles).post(create_role))
        .route("/:id", get(get_role).patch(update_role).delete(delete_role))
}

/// A role with its permission names
#[derive(Debug, Serialize, Deserialize)]
pub struct RoleResponse {
    #[serde(flatten)]
    pub role: Role,

    pub permissions: Vec<String>,
}

impl RoleResponse {
    async fn load(pool: &PgPool, role: Role) -> Result<Self, sqlx::Error> {
        let permissions = Role::permissions(pool, role.id).await?;
        Ok(Self { role, permissions })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub allow_deleted: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct DeleteParams {
    #[serde(default)]
    pub hard_delete: bool,
}

/// List roles, optionally including soft-deleted ones
pub async fn list_roles(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Vec<RoleResponse>>> {
    let roles = Role::list(&state.db, params.allow_deleted).await?;

    let mut response = Vec::with_capacity(roles.len());
    for role in roles {
        response.push(RoleResponse::load(&state.db, role).await?);
    }

    Ok(Json(response))
}

/// Create a role
///
/// A soft-deleted role with the same slug is restored instead.
///
/// # Errors
///
/// - `400 Bad Request`: A live role already has the slug
pub async fn create_role(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(req): Json<CreateRole>,
) -> ApiResult<(StatusCode, Json<RoleResponse>)> {
    if req.title.trim().is_empty() {
        return Err(ApiError::invalid_field("title", Message::RoleNotCreated));
    }

    let role = Role::create(&state.db, req).await?;

    info!(role_id = role.id, slug = %role.slug, actor = admin.id, "Role created");
    Ok((
        StatusCode::CREATED,
        Json(RoleResponse::load(&state.db, role).await?),
    ))
}

pub async fn get_role(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<RoleResponse>> {
    let role = Role::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found(Message::RoleNotFound))?;

    Ok(Json(RoleResponse::load(&state.db, role).await?))
}

/// Update a role's title and/or replace its permissions
pub async fn update_role(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<i64>,
    Json(req): Json<UpdateRole>,
) -> ApiResult<Json<RoleResponse>> {
    if req.title.is_none() && req.permissions.is_none() {
        return Err(ApiError::bad_request(Message::NoDataProvided));
    }

    let role = Role::update(&state.db, id, req)
        .await?
        .ok_or_else(|| ApiError::not_found(Message::RoleNotFound))?;

    Ok(Json(RoleResponse::load(&state.db, role).await?))
}

/// Delete a role
///
/// Soft deletes by default; `?hard_delete=true` removes the row, including
/// one that is already soft-deleted.
pub async fn delete_role(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<i64>,
    Query(params): Query<DeleteParams>,
) -> ApiResult<StatusCode> {
    let deleted = if params.hard_delete {
        Role::hard_delete(&state.db, id).await?
    } else {
        Role::soft_delete(&state.db, id).await?
    };

    if !deleted {
        return Err(ApiError::not_found(Message::RoleNotFound));
    }

    info!(role_id = id, hard = params.hard_delete, actor = admin.id, "Role deleted");
    Ok(StatusCode::NO_CONTENT)
}
