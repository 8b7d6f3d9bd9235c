use thiserror::Error;
pub type Result<T = ()> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("malformed api token")]
    MalformedToken,
    #[error("malformed url")]
    MalformedUrl(#[from] url::ParseError),
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("notion error {}: {} ({})", .0.status, .0.message, .0.code)]
    Notion(ApiError),
}

/// The error body Notion returns for 4xx and 5xx responses.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct ApiError {
    pub status: u16,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

impl Error {
    pub fn notion(value: ApiError) -> Self {
        Self::Notion(value)
    }

    /// Returns true if this error is transient and the operation should be retried
    pub fn is_retryable(&self) -> bool {
        match self {
            // 400 validation, 401 unauthorized, 403 restricted, 404 not shared
            Self::Notion(err) if matches!(err.status, 400 | 401 | 403 | 404) => false,
            // 409 conflict, 429 rate limited, 5xx
            Self::Notion(_) => true,
            Self::Request(err) => !err.is_builder() && !err.is_decode(),
            _ => false,
        }
    }

    /// Convert this error into a RetryError based on whether it's retryable
    pub fn into_retry(self) -> tokio_retry2::RetryError<Self> {
        if self.is_retryable() {
            tokio_retry2::RetryError::transient(self)
        } else {
            tokio_retry2::RetryError::permanent(self)
        }
    }
}
