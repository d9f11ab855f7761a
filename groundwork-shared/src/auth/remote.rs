/// Delegated token validation against an external auth service
///
/// When `AUTH_SERVICE_URL` is set, bearer tokens are checked by calling
/// `{AUTH_SERVICE_URL}/{AUTH_VERIFY_ENDPOINT}` instead of being decoded
/// locally. The service's status code is passed back to the caller.

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

/// Default verification path appended to the service URL
pub const DEFAULT_VERIFY_ENDPOINT: &str = "v1/token/validate";

/// Remote validation errors
#[derive(Debug, thiserror::Error)]
pub enum RemoteAuthError {
    #[error("auth service unavailable: {0}")]
    Unavailable(String),

    #[error("auth service rejected token ({status}): {detail}")]
    Rejected { status: u16, detail: String },

    #[error("invalid auth service URL: {0}")]
    InvalidUrl(String),
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(alias = "message")]
    detail: Option<String>,
}

/// Client for an external token validation service
#[derive(Debug, Clone)]
pub struct RemoteVerifier {
    client: Client,
    base_url: String,
    verify_url: String,
}

impl RemoteVerifier {
    pub fn new(base_url: &str, verify_endpoint: &str) -> Result<Self, RemoteAuthError> {
        let base_url = base_url.trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(RemoteAuthError::InvalidUrl(base_url));
        }
        let verify_url = join_url(&base_url, verify_endpoint);

        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| RemoteAuthError::InvalidUrl(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            verify_url,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn verify_url(&self) -> &str {
        &self.verify_url
    }

    /// Returns true when the service answers its base URL with a success status
    pub async fn is_up(&self) -> bool {
        match self.client.get(&self.base_url).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                warn!(error = %e, "Auth service health check failed");
                false
            }
        }
    }

    /// Asks the service whether `token` is valid
    pub async fn verify(&self, token: &str) -> Result<(), RemoteAuthError> {
        let resp = self
            .client
            .get(&self.verify_url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| RemoteAuthError::Unavailable(e.to_string()))?;

        let status = resp.status();
        if status.is_success() {
            debug!("Token accepted by auth service");
            return Ok(());
        }

        let detail = resp
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(|body| body.detail)
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("Token rejected")
                    .to_string()
            });

        Err(RemoteAuthError::Rejected {
            status: status.as_u16(),
            detail,
        })
    }
}

impl RemoteAuthError {
    /// HTTP status the guard should answer with
    pub fn status_code(&self) -> u16 {
        match self {
            RemoteAuthError::Rejected { status, .. } => *status,
            RemoteAuthError::Unavailable(_) | RemoteAuthError::InvalidUrl(_) => {
                StatusCode::SERVICE_UNAVAILABLE.as_u16()
            }
        }
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}
