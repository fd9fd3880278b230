// Common data models for media resolution

use serde::{Deserialize, Serialize};

use super::platforms::PlatformKind;

/// Canonical description of a resolved media item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaInfo {
    pub title: String,
    /// Thumbnail URL; empty when the upstream had none
    pub thumbnail: String,
    /// Formatted duration, or one of the live/unknown sentinels
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    pub author: String,
    pub platform: PlatformKind,
    /// Canonical source URL of the media page
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Ranked options; the first entry is the recommended pick. Never empty.
    pub download_options: Vec<DownloadOption>,
}

impl MediaInfo {
    /// The option shown to the user as the default choice
    pub fn recommended(&self) -> Option<&DownloadOption> {
        self.download_options.first()
    }
}

/// One concrete downloadable artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadOption {
    /// Free-form quality label ("1080p", "audio", "HD Video", ...)
    pub quality: String,
    /// Container or extension token ("mp4", "m4a", "m3u8", ...)
    pub format: String,
    pub url: String,
    /// Human-readable size, only when the upstream reported one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
}

/// Un-normalized option as extracted from an upstream response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawOption {
    pub quality: String,
    pub format: String,
    pub url: String,
    pub size_bytes: Option<u64>,
}

impl RawOption {
    pub fn new(quality: impl Into<String>, format: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            quality: quality.into(),
            format: format.into(),
            url: url.into(),
            size_bytes: None,
        }
    }

    pub fn with_size(mut self, bytes: Option<u64>) -> Self {
        self.size_bytes = bytes.filter(|b| *b > 0);
        self
    }
}

/// Everything an extractor pulled out of its upstream, before normalization
#[derive(Debug, Clone, Default)]
pub struct RawMedia {
    pub title: Option<String>,
    pub author: Option<String>,
    pub thumbnail: Option<String>,
    pub description: Option<String>,
    pub duration_seconds: Option<f64>,
    pub is_live: bool,
    /// Canonical page URL when the extractor can build one
    pub canonical_url: Option<String>,
    /// Options in the extractor's own preference order
    pub options: Vec<RawOption>,
}
