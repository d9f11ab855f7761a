/// User account endpoints
///
/// - `GET /v1/users` - Paginated user list (admin)
/// - `POST /v1/users/create` - Register an account (public)
/// - `GET /v1/users/me` - The authenticated user
/// - `GET /v1/users/:id` - Look up by id, email or username
/// - `PATCH /v1/users/:id` - Partial update (self or admin)
/// - `DELETE /v1/users/:id` - Soft delete (self or admin)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extractors::{AdminUser, CurrentUser},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use groundwork_shared::{
    auth::{
        authorization::{check_permissions, require_role, AccessLevel},
        password::validate_password_strength,
    },
    db::pagination::{Page, PageParams},
    locale::Message,
    models::user::{CreateUser, UpdateUser, User, UserPublic},
};
use serde::{Deserialize, Deserializer};
use tracing::info;
use validator::{Validate, ValidateEmail};

pub const PREFIX: &str = "/users";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users))
        .route("/create", post(create_user))
        .route("/me", get(me))
        .route("/:id", get(get_user).patch(update_user).delete(delete_user))
}

/// Registration request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be between 1 and 255 characters"))]
    pub name: String,

    pub email: String,

    pub username: Option<String>,

    pub password: String,
}

/// Partial update request
///
/// `username: null` clears the username; an absent field is left unchanged.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be between 1 and 255 characters"))]
    pub name: Option<String>,

    pub email: Option<String>,

    #[serde(default, deserialize_with = "nullable")]
    pub username: Option<Option<String>>,

    pub password: Option<String>,

    pub is_active: Option<bool>,

    pub role_id: Option<i64>,
}

/// Distinguishes an explicit `null` from an absent field
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl From<UpdateUserRequest> for UpdateUser {
    fn from(req: UpdateUserRequest) -> Self {
        Self {
            name: req.name,
            email: req.email,
            username: req.username,
            password: req.password,
            is_active: req.is_active,
            role_id: req.role_id,
        }
    }
}

fn check_email(email: &str) -> ApiResult<()> {
    if email.validate_email() {
        Ok(())
    } else {
        Err(ApiError::invalid_field("email", Message::EmailInvalid))
    }
}

fn check_password(password: &str) -> ApiResult<()> {
    validate_password_strength(password)
        .map_err(|_| ApiError::invalid_field("password", Message::PasswordTooWeak))
}

/// Rejects an email or username already held by another live account
async fn ensure_unique(
    state: &AppState,
    email: Option<&str>,
    username: Option<&str>,
    except: Option<i64>,
) -> ApiResult<()> {
    let taken_by_other = |user: Option<User>| user.is_some_and(|u| Some(u.id) != except);

    if let Some(email) = email {
        if taken_by_other(User::find_by_email(&state.db, email).await?) {
            return Err(ApiError::bad_request(Message::EmailExists));
        }
    }
    if let Some(username) = username {
        if taken_by_other(User::find_by_username(&state.db, username).await?) {
            return Err(ApiError::bad_request(Message::UsernameExists));
        }
    }

    Ok(())
}

/// List users
///
/// # Endpoint
///
/// ```text
/// GET /v1/users?page=1&size=10
/// Authorization: Bearer <admin token>
/// ```
pub async fn list_users(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Query(params): Query<PageParams>,
) -> ApiResult<Json<Page<UserPublic>>> {
    let window = params.resolve(state.page_size());

    let users = User::list(&state.db, window.limit(), window.offset()).await?;
    let count = User::count(&state.db).await?;

    Ok(Json(Page::new(users, count, window).map(UserPublic::from)))
}

/// Register a new account
///
/// # Endpoint
///
/// ```text
/// POST /v1/users/create
/// Content-Type: application/json
///
/// {"name": "Jane Doe", "email": "jane@example.com", "password": "s3cret-pass"}
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Email or username already registered
/// - `422 Unprocessable Entity`: Invalid email, name or weak password
pub async fn create_user(
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<UserPublic>)> {
    req.validate()?;
    check_email(&req.email)?;
    check_password(&req.password)?;
    ensure_unique(&state, Some(&req.email), req.username.as_deref(), None).await?;

    let user = User::create(
        &state.db,
        CreateUser {
            name: req.name,
            email: req.email,
            username: req.username,
            password: req.password,
            role_id: None,
        },
    )
    .await?;

    info!(user_id = user.id, "User created");
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// The authenticated user
pub async fn me(CurrentUser(user): CurrentUser) -> Json<UserPublic> {
    Json(user.into())
}

/// Look up a user by id, email or username
pub async fn get_user(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(identifier): Path<String>,
) -> ApiResult<Json<UserPublic>> {
    let user = User::find_by_identifier(&state.db, &identifier)
        .await?
        .ok_or_else(|| ApiError::not_found(Message::UserNotFound))?;

    Ok(Json(user.into()))
}

/// Partially update a user
///
/// Users may update themselves; admins may update anyone. Only admins may
/// change `is_active` or `role_id`.
///
/// # Errors
///
/// - `400 Bad Request`: Empty body, or email/username taken
/// - `403 Forbidden`: Updating another user without the admin permission
/// - `404 Not Found`: Unknown user, or a non-admin changing admin-only fields
pub async fn update_user(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<i64>,
    Json(req): Json<UpdateUserRequest>,
) -> ApiResult<Json<UserPublic>> {
    check_permissions(&state.db, &actor, id).await?;
    req.validate()?;

    let update = UpdateUser::from(req);
    if update.is_empty() {
        return Err(ApiError::bad_request(Message::NoDataProvided));
    }
    if update.is_active.is_some() || update.role_id.is_some() {
        require_role(&state.db, &actor, AccessLevel::Admin).await?;
    }

    if let Some(email) = &update.email {
        check_email(email)?;
    }
    if let Some(password) = &update.password {
        check_password(password)?;
    }
    ensure_unique(
        &state,
        update.email.as_deref(),
        update.username.as_ref().and_then(|u| u.as_deref()),
        Some(id),
    )
    .await?;

    let user = User::update(&state.db, id, update)
        .await?
        .ok_or_else(|| ApiError::not_found(Message::UserNotFound))?;

    info!(user_id = user.id, actor = actor.id, "User updated");
    Ok(Json(user.into()))
}

/// Soft delete a user
pub async fn delete_user(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    check_permissions(&state.db, &actor, id).await?;

    if !User::soft_delete(&state.db, id).await? {
        return Err(ApiError::not_found(Message::UserNotFound));
    }

    info!(user_id = id, actor = actor.id, "User deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_request_distinguishes_null_username() {
        let absent: UpdateUserRequest = serde_json::from_str(r#"{"name": "Jane"}"#).unwrap();
        assert_eq!(absent.username, None);

        let cleared: UpdateUserRequest = serde_json::from_str(r#"{"username": null}"#).unwrap();
        assert_eq!(cleared.username, Some(None));

        let set: UpdateUserRequest = serde_json::from_str(r#"{"username": "jane"}"#).unwrap();
        assert_eq!(set.username, Some(Some("jane".to_string())));
    }

    #[test]
    fn test_empty_update_detected() {
        let update = UpdateUser::from(UpdateUserRequest::default());
        assert!(update.is_empty());
    }

    #[test]
    fn test_email_and_password_checks() {
        assert!(check_email("jane@example.com").is_ok());
        assert!(matches!(
            check_email("not-an-email"),
            Err(ApiError::ValidationError(details)) if details[0].field == "email"
        ));

        assert!(check_password("abc123").is_ok());
        assert!(check_password("short").is_err());
        assert!(check_password("onlyletters").is_err());
    }

    #[test]
    fn test_create_request_name_length() {
        let req = CreateUserRequest {
            name: String::new(),
            email: "jane@example.com".to_string(),
            username: None,
            password: "abc123".to_string(),
        };
        assert!(req.validate().is_err());
    }
}
