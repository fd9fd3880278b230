// Error types for media resolution

use std::fmt;
use std::time::Duration;

use thiserror::Error;

use super::platforms::PlatformKind;

/// Coarse failure categories exposed to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// URL matched no platform, or a platform without a working resolver
    UnsupportedPlatform,
    /// Platform matched but the media identifier could not be extracted
    InvalidUrl,
    /// Timeout, connection error, non-success status, or exhausted mirror pool
    UpstreamUnavailable,
    /// Upstream answered but had nothing downloadable
    NoMediaFound,
    /// Upstream body did not have the expected shape
    MalformedUpstreamResponse,
}

impl ErrorKind {
    /// Short hint for the user
    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::UnsupportedPlatform => {
                "This site is not supported. Paste a link from YouTube, TikTok, X/Twitter, Reddit or Vimeo."
            }
            Self::InvalidUrl => "The link looks incomplete. Copy the full address of the post or video.",
            Self::UpstreamUnavailable => {
                "The download service is not responding. Try again in a few minutes or configure a proxy."
            }
            Self::NoMediaFound => "No downloadable media found. The post may be private, deleted, or image-only.",
            Self::MalformedUpstreamResponse => {
                "The download service returned an unexpected response. Try again later."
            }
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::UnsupportedPlatform => "unsupported platform",
            Self::InvalidUrl => "invalid url",
            Self::UpstreamUnavailable => "upstream unavailable",
            Self::NoMediaFound => "no media found",
            Self::MalformedUpstreamResponse => "malformed upstream response",
        };
        f.write_str(name)
    }
}

/// Transport-level failure of a single HTTP call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("failed to read body: {0}")]
    Body(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if let Some(status) = e.status() {
            Self::Status(status.as_u16())
        } else if e.is_body() || e.is_decode() {
            Self::Body(e.to_string())
        } else {
            Self::Connection(e.to_string())
        }
    }
}

/// Failure of a resolver or of one of its steps
#[derive(Debug, Clone, Error)]
pub enum ResolveError {
    #[error("unsupported: {0}")]
    UnsupportedPlatform(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("upstream request failed: {0}")]
    Upstream(#[from] FetchError),

    #[error("all {attempts} mirrors failed (last error: {last_error})")]
    AllMirrorsFailed { attempts: usize, last_error: String },

    #[error("resolution did not finish within {0:?}")]
    Timeout(Duration),

    #[error("no media found: {0}")]
    NoMediaFound(String),

    #[error("malformed upstream response: {0}")]
    MalformedResponse(String),
}

impl ResolveError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnsupportedPlatform(_) => ErrorKind::UnsupportedPlatform,
            Self::InvalidUrl(_) => ErrorKind::InvalidUrl,
            Self::Upstream(_) | Self::AllMirrorsFailed { .. } | Self::Timeout(_) => {
                ErrorKind::UpstreamUnavailable
            }
            Self::NoMediaFound(_) => ErrorKind::NoMediaFound,
            Self::MalformedResponse(_) => ErrorKind::MalformedUpstreamResponse,
        }
    }

    /// Parse a JSON body, mapping serde failures to `MalformedResponse`
    pub fn parse_json<T: serde::de::DeserializeOwned>(body: &str) -> Result<T, Self> {
        serde_json::from_str(body).map_err(|e| Self::MalformedResponse(e.to_string()))
    }
}

/// Failure returned by the facade, tagged with the platform it happened on
#[derive(Debug, Clone, Error)]
pub struct ResolutionError {
    pub platform: Option<PlatformKind>,
    #[source]
    pub source: ResolveError,
}

impl ResolutionError {
    pub fn new(platform: Option<PlatformKind>, source: ResolveError) -> Self {
        Self { platform, source }
    }

    pub fn kind(&self) -> ErrorKind {
        self.source.kind()
    }
}

impl fmt::Display for ResolutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.platform {
            Some(platform) => write!(f, "[{}] {}: {}", platform, self.kind(), self.source),
            None => write!(f, "{}: {}", self.kind(), self.source),
        }
    }
}
