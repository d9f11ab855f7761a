/// Error handling for the API server
///
/// This module provides a unified error type that maps to HTTP responses.
/// All handlers should return `Result<T, ApiError>` which automatically
/// converts to appropriate HTTP status codes. Messages shown to clients come
/// from [`Message`] and follow the request language.
///
/// # Example
///
/// ```
/// use groundwork_api::error::{ApiError, ApiResult};
/// use groundwork_shared::locale::Message;
/// use axum::Json;
/// use serde_json::{json, Value};
///
/// async fn handler(found: bool) -> ApiResult<Json<Value>> {
///     if !found {
///         return Err(ApiError::not_found(Message::TodoNotFound));
///     }
///     Ok(Json(json!({ "ok": true })))
/// }
/// ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use groundwork_shared::auth::authorization::{AccessLevel, AuthzError};
use groundwork_shared::auth::basic::BasicAuthError;
use groundwork_shared::auth::jwt::JwtError;
use groundwork_shared::auth::middleware::AuthError;
use groundwork_shared::auth::password::PasswordError;
use groundwork_shared::auth::session::SessionError;
use groundwork_shared::locale::Message;
use groundwork_shared::models::role::RoleError;
use groundwork_shared::models::user::UserError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400)
    BadRequest(String),

    /// Unprocessable entity (422) - validation errors
    ValidationError(Vec<ValidationErrorDetail>),

    /// Unauthorized (401)
    Unauthorized(String),

    /// Forbidden (403)
    Forbidden(String),

    /// Not found (404)
    NotFound(String),

    /// Not acceptable (406) - inactive account
    NotAcceptable(String),

    /// Conflict (409)
    Conflict(String),

    /// Status decided by an upstream auth service
    Upstream { status: u16, message: String },

    /// Service unavailable (503)
    ServiceUnavailable(String),

    /// Internal server error (500)
    InternalError(String),

    /// Database failure (500)
    DatabaseError(String),
}

/// Validation error detail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Field that failed validation
    pub field: String,

    /// Error message
    pub message: String,
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code (e.g., "bad_request", "unauthorized")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Optional validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,
}

impl ApiError {
    pub fn bad_request(message: Message) -> Self {
        ApiError::BadRequest(message.localized().to_string())
    }

    pub fn unauthorized(message: Message) -> Self {
        ApiError::Unauthorized(message.localized().to_string())
    }

    pub fn not_found(message: Message) -> Self {
        ApiError::NotFound(message.localized().to_string())
    }

    /// A single-field validation failure
    pub fn invalid_field(field: &str, message: Message) -> Self {
        ApiError::ValidationError(vec![ValidationErrorDetail {
            field: field.to_string(),
            message: message.localized().to_string(),
        }])
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::ValidationError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::NotAcceptable(_) => StatusCode::NOT_ACCEPTABLE,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Upstream { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::InternalError(_) | ApiError::DatabaseError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "bad_request",
            ApiError::ValidationError(_) => "validation_error",
            ApiError::Unauthorized(_) => "unauthorized",
            ApiError::Forbidden(_) => "forbidden",
            ApiError::NotFound(_) => "not_found",
            ApiError::NotAcceptable(_) => "not_acceptable",
            ApiError::Conflict(_) => "conflict",
            ApiError::Upstream { .. } => "auth_service_error",
            ApiError::ServiceUnavailable(_) => "service_unavailable",
            ApiError::InternalError(_) => "internal_error",
            ApiError::DatabaseError(_) => "database_error",
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::NotAcceptable(msg) => write!(f, "Not acceptable: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::Upstream { status, message } => {
                write!(f, "Auth service error ({}): {}", status, message)
            }
            ApiError::ServiceUnavailable(msg) => write!(f, "Service unavailable: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            ApiError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error = self.code().to_string();

        let (message, details) = match self {
            ApiError::ValidationError(errors) => {
                ("Request validation failed".to_string(), Some(errors))
            }
            ApiError::InternalError(msg) | ApiError::DatabaseError(msg) => {
                // Log internal errors but don't expose details to clients
                tracing::error!(error = %msg, "Internal error");
                (Message::GenericError.localized().to_string(), None)
            }
            ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::NotAcceptable(msg)
            | ApiError::Conflict(msg)
            | ApiError::ServiceUnavailable(msg)
            | ApiError::Upstream { message: msg, .. } => (msg, None),
        };

        let body = Json(ErrorResponse {
            error,
            message,
            details,
        });

        (status, body).into_response()
    }
}

/// Convert sqlx errors to API errors
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".to_string()),
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                let message = match db_err.constraint() {
                    Some("users_email_key") => Message::EmailExists,
                    Some("users_username_key") => Message::UsernameExists,
                    Some("roles_roles_slug_key") => Message::RoleExists,
                    _ => Message::GenericError,
                };
                ApiError::bad_request(message)
            }
            sqlx::Error::PoolTimedOut => {
                ApiError::ServiceUnavailable(Message::GenericError.localized().to_string())
            }
            _ => ApiError::DatabaseError(err.to_string()),
        }
    }
}

/// Convert validator errors to API errors
impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut details: Vec<ValidationErrorDetail> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| ValidationErrorDetail {
                    field: field.to_string(),
                    message: e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string()),
                })
            })
            .collect();
        details.sort_by(|a, b| a.field.cmp(&b.field));
        ApiError::ValidationError(details)
    }
}

/// Convert guard errors to API errors
impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingHeader => ApiError::unauthorized(Message::MissingAuthorizationHeader),
            AuthError::InvalidHeader => ApiError::unauthorized(Message::TokenInvalidHeader),
            AuthError::Expired => ApiError::unauthorized(Message::TokenExpired),
            AuthError::InvalidToken => ApiError::unauthorized(Message::TokenInvalid),
            AuthError::ServiceUnavailable => {
                ApiError::ServiceUnavailable(Message::AuthServiceUnavailable.localized().to_string())
            }
            AuthError::Rejected { status, detail } => ApiError::Upstream {
                status,
                message: detail,
            },
        }
    }
}

impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => ApiError::unauthorized(Message::TokenExpired),
            JwtError::WrongTokenType { .. } => ApiError::unauthorized(Message::TokenInvalidType),
            JwtError::Invalid(_) => ApiError::unauthorized(Message::TokenInvalid),
            JwtError::Encoding(msg) => ApiError::InternalError(format!("Token encoding failed: {}", msg)),
        }
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Jwt(e) => e.into(),
            SessionError::Store(e) => ApiError::InternalError(format!("Token store error: {}", e)),
            SessionError::NotFound => ApiError::unauthorized(Message::TokenInvalid),
            SessionError::NotRevoked => ApiError::unauthorized(Message::TokenNotRevoked),
        }
    }
}

/// Convert authorization errors to API errors
impl From<AuthzError> for ApiError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::Unauthenticated(e) => e.into(),
            AuthzError::UserNotFound => ApiError::not_found(Message::UserNotFound),
            AuthzError::Inactive => ApiError::NotAcceptable(Message::UserInactive.localized().to_string()),
            AuthzError::InsufficientRole(AccessLevel::Admin) => ApiError::not_found(Message::OnlyAdmin),
            AuthzError::InsufficientRole(_) => ApiError::not_found(Message::OnlyModerators),
            AuthzError::Forbidden => ApiError::Forbidden(Message::NotAuthorized.localized().to_string()),
            AuthzError::Database(e) => e.into(),
        }
    }
}

impl From<BasicAuthError> for ApiError {
    fn from(err: BasicAuthError) -> Self {
        match err {
            BasicAuthError::NotBasic => ApiError::unauthorized(Message::NotBasicToken),
            BasicAuthError::Malformed => ApiError::unauthorized(Message::TokenInvalidStructure),
            BasicAuthError::InvalidEncoding => ApiError::unauthorized(Message::InvalidCredentials),
        }
    }
}

/// Convert password errors to API errors
impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::InternalError(format!("Password operation failed: {}", err))
    }
}

impl From<UserError> for ApiError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::Password(e) => e.into(),
            UserError::Database(e) => e.into(),
        }
    }
}

impl From<RoleError> for ApiError {
    fn from(err: RoleError) -> Self {
        match err {
            RoleError::AlreadyExists(_) => ApiError::bad_request(Message::RoleExists),
            RoleError::Database(e) => e.into(),
        }
    }
}
