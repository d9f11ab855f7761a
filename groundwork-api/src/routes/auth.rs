/// Authentication endpoints
///
/// All three operations share one path and differ by method:
///
/// - `POST /v1/auth` - Login and get a token pair
/// - `PUT /v1/auth` - Exchange the `refreshtoken` header for a new access token
/// - `DELETE /v1/auth` - Revoke the bearer access token and its refresh token
///
/// The path is excluded from the JWT guard by default; `DELETE` checks its
/// bearer token itself.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{FromRequest, Request, State},
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderMap, StatusCode,
    },
    routing::post,
    Form, Json, Router,
};
use groundwork_shared::{
    auth::{
        basic::{parse_basic_credentials, BasicCredentials},
        jwt::TokenPair,
        middleware::bearer_token,
        password,
        session::SessionUser,
    },
    locale::Message,
    models::user::User,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub const PREFIX: &str = "/auth";

/// Header carrying the refresh token on `PUT`
pub const REFRESH_TOKEN_HEADER: &str = "refreshtoken";

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(login).put(refresh).delete(revoke))
}

/// Login form, accepted as JSON or urlencoded when no Basic header is sent
#[derive(Deserialize)]
pub struct LoginForm {
    /// Username or email
    pub username: String,
    pub password: String,
}

/// Token pair response
#[derive(Debug, Serialize, Deserialize)]
pub struct TokensResponse {
    pub access_token: String,

    pub refresh_token: String,

    /// Always `bearer`
    pub token_type: String,

    pub detail: String,
}

impl TokensResponse {
    fn new(pair: TokenPair, detail: Message) -> Self {
        Self {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            token_type: "bearer".to_string(),
            detail: detail.localized().to_string(),
        }
    }
}

/// Reads login credentials from a Basic header, or else the request body
async fn credentials(req: Request) -> ApiResult<BasicCredentials> {
    if let Some(header) = req.headers().get(AUTHORIZATION) {
        let header = header
            .to_str()
            .map_err(|_| ApiError::unauthorized(Message::TokenInvalidHeader))?;
        return Ok(parse_basic_credentials(header)?);
    }

    let is_json = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.starts_with("application/json"))
        .unwrap_or(false);

    let form = if is_json {
        Json::<LoginForm>::from_request(req, &())
            .await
            .map(|Json(form)| form)
            .map_err(|e| ApiError::BadRequest(e.body_text()))?
    } else {
        Form::<LoginForm>::from_request(req, &())
            .await
            .map(|Form(form)| form)
            .map_err(|e| ApiError::BadRequest(e.body_text()))?
    };

    Ok(BasicCredentials::new(form.username, form.password))
}

/// Login endpoint
///
/// # Endpoint
///
/// ```text
/// POST /v1/auth
/// Authorization: Basic base64(username:password)
/// ```
///
/// # Response (201)
///
/// ```json
/// {
///   "access_token": "eyJ...",
///   "refresh_token": "eyJ...",
///   "token_type": "bearer",
///   "detail": "Tokens generated successfully."
/// }
/// ```
///
/// # Errors
///
/// - `401 Unauthorized`: Invalid credentials or malformed Basic header
/// - `406 Not Acceptable`: Account is inactive
pub async fn login(
    State(state): State<AppState>,
    req: Request,
) -> ApiResult<(StatusCode, Json<TokensResponse>)> {
    let credentials = credentials(req).await?;

    let user = User::find_by_login(&state.db, &credentials.username)
        .await?
        .ok_or_else(|| {
            debug!("Login for unknown user");
            ApiError::unauthorized(Message::InvalidCredentials)
        })?;

    if !password::verify_password(&credentials.password, &user.password)? {
        debug!(user_id = user.id, "Login with wrong password");
        return Err(ApiError::unauthorized(Message::InvalidCredentials));
    }

    if !user.is_active {
        return Err(ApiError::NotAcceptable(
            Message::UserInactive.localized().to_string(),
        ));
    }

    let pair = state
        .sessions()
        .issue(SessionUser {
            id: user.id,
            email: &user.email,
        })
        .await?;

    info!(user_id = user.id, "User logged in");
    Ok((
        StatusCode::CREATED,
        Json(TokensResponse::new(pair, Message::TokensGenerated)),
    ))
}

/// Token refresh endpoint
///
/// # Endpoint
///
/// ```text
/// PUT /v1/auth
/// refreshtoken: eyJ...
/// ```
///
/// # Errors
///
/// - `401 Unauthorized`: Missing, expired, revoked or non-refresh token
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<TokensResponse>> {
    let refresh_token = headers
        .get(REFRESH_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::unauthorized(Message::TokenInvalid))?;

    let pair = state.sessions().refresh(refresh_token).await?;

    Ok(Json(TokensResponse::new(pair, Message::TokensRefreshed)))
}

/// Token revocation endpoint
///
/// # Endpoint
///
/// ```text
/// DELETE /v1/auth
/// Authorization: Bearer eyJ...
/// ```
///
/// # Errors
///
/// - `401 Unauthorized`: Missing or malformed header, or a token that is
///   not currently issued
pub async fn revoke(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<StatusCode> {
    let header = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| ApiError::unauthorized(Message::MissingAuthorizationHeader))?
        .to_str()
        .map_err(|_| ApiError::unauthorized(Message::TokenInvalidHeader))?;
    let token = bearer_token(header).ok_or_else(|| ApiError::unauthorized(Message::TokenInvalidHeader))?;

    state.sessions().revoke(token).await?;

    Ok(StatusCode::NO_CONTENT)
}
