use thiserror::Error;

use crate::gateway::Verb;

/// Failure of a single catalog request.
///
/// The display text is the user-facing message, so callers can format it
/// directly without matching on the variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// DNS, connect, reset or timeout.
    #[error("请求异常: {0}")]
    Transport(String),

    #[error("API请求失败: {0}")]
    Status(u16),

    /// The body was not JSON, or not the JSON shape the verb expects.
    #[error("请求异常: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::Decode(e.to_string())
        } else {
            Self::Transport(e.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        Self::Decode(e.to_string())
    }
}

/// An [`ApiError`] tagged with the verb that hit it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}: {source}", verb.failure_label())]
pub struct GatewayError {
    pub verb: Verb,
    pub source: ApiError,
}

impl GatewayError {
    pub fn new(verb: Verb, source: ApiError) -> Self {
        Self { verb, source }
    }
}
