//! Errors shared by the remote API clients.
use reqwest::{Response, StatusCode};
use serde::Deserialize;
use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

/// Remote-call failures.
///
/// Note:
/// - Kept independent from `AppError`; the form decides how each failure
///   is surfaced (notification vs. HTTP status).
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("rejected by server: {0}")]
    Validation(String),
    #[error("upstream returned {status}: {message}")]
    Upstream { status: u16, message: String },
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("invalid response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Message fit for a toast.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::NotFound(m) | ApiError::Validation(m) => m.clone(),
            ApiError::Upstream { message, .. } => message.clone(),
            ApiError::Network(_) => "could not reach the server".to_string(),
            ApiError::Decode(_) => "unexpected response from the server".to_string(),
        }
    }
}

// Error body used by the employee-record API.
#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

/// Passes successful responses through; turns everything else into `ApiError`.
pub async fn check(response: Response) -> ApiResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .ok()
        .and_then(|b| b.message)
        .unwrap_or_else(|| {
            if text.is_empty() {
                status.canonical_reason().unwrap_or("error").to_string()
            } else {
                text
            }
        });

    Err(match status {
        StatusCode::NOT_FOUND => ApiError::NotFound(message),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => ApiError::Validation(message),
        _ => ApiError::Upstream {
            status: status.as_u16(),
            message,
        },
    })
}

/// Decodes a JSON body, reporting shape mismatches as `Decode`.
pub async fn json<T: serde::de::DeserializeOwned>(response: Response) -> ApiResult<T> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
}
