//! Error types for the weather SDK.

use std::fmt;

use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, SdkError>;

/// Top-level error returned by providers, the registry and configuration.
#[derive(Debug, Clone, Error)]
pub enum SdkError {
    /// A caller-supplied argument failed a local precondition (blank city,
    /// blank API key). Never retried.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A configuration value is out of range or could not be applied.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The fetcher failed; propagated verbatim.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Weather data could not be encoded for output.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for SdkError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

impl SdkError {
    /// Returns the fetch classification if this is a fetch failure.
    pub fn fetch_kind(&self) -> Option<FetchErrorKind> {
        match self {
            Self::Fetch(e) => Some(e.kind()),
            _ => None,
        }
    }
}

/// Classification assigned by the transport to a failed fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchErrorKind {
    NotFound,
    Unauthorized,
    RateLimited,
    UpstreamUnavailable,
    MalformedResponse,
    InvalidRequest,
    Timeout,
    Network,
    Other,
}

impl FetchErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "not found",
            Self::Unauthorized => "unauthorized",
            Self::RateLimited => "rate limited",
            Self::UpstreamUnavailable => "upstream unavailable",
            Self::MalformedResponse => "malformed response",
            Self::InvalidRequest => "invalid request",
            Self::Timeout => "timeout",
            Self::Network => "network error",
            Self::Other => "unexpected upstream error",
        }
    }
}

impl fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed fetch, as reported by a [`Fetcher`](crate::provider::Fetcher).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct FetchError {
    kind: FetchErrorKind,
    message: String,
    status: Option<u16>,
}

impl FetchError {
    pub fn new(kind: FetchErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
        }
    }

    /// Attach the upstream HTTP status that produced this error.
    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn kind(&self) -> FetchErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn status(&self) -> Option<u16> {
        self.status
    }
}
