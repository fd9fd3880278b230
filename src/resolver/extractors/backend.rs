// Backend extractor - asks a self-hosted resolution service
//
// The backend answers `GET {base}/api/resolve?url=<encoded>` with a record
// shaped like `MediaInfo`; every field is optional and the options still go
// through the normal ranking.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use super::traits::MediaExtractor;
use super::LooseNumber;
use crate::resolver::errors::ResolveError;
use crate::resolver::http::HttpFetcher;
use crate::resolver::mirrors::join_url;
use crate::resolver::models::{RawMedia, RawOption};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BackendMedia {
    title: Option<String>,
    thumbnail: Option<String>,
    duration: Option<LooseNumber>,
    is_live: Option<bool>,
    author: Option<String>,
    url: Option<String>,
    description: Option<String>,
    download_options: Option<Vec<BackendOption>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BackendOption {
    quality: Option<String>,
    format: Option<String>,
    url: Option<String>,
    filesize: Option<LooseNumber>,
}

pub struct BackendExtractor {
    fetcher: Arc<dyn HttpFetcher>,
    base_url: String,
    timeout: Duration,
}

impl BackendExtractor {
    pub fn new(fetcher: Arc<dyn HttpFetcher>, base_url: &str, timeout: Duration) -> Self {
        Self {
            fetcher,
            base_url: base_url.to_string(),
            timeout,
        }
    }
}

#[async_trait]
impl MediaExtractor for BackendExtractor {
    fn name(&self) -> &'static str {
        "backend"
    }

    /// The backend does its own identification; the URL itself is the key
    fn media_id(&self, url: &str) -> Result<String, ResolveError> {
        Ok(url.trim().to_string())
    }

    async fn extract(&self, url: &str, _media_id: &str) -> Result<RawMedia, ResolveError> {
        let api_url = join_url(
            &self.base_url,
            &format!("/api/resolve?url={}", urlencoding::encode(url.trim())),
        );
        let body = self.fetcher.get(&api_url, self.timeout).await?;
        let media: BackendMedia = ResolveError::parse_json(&body)?;

        let options = media
            .download_options
            .unwrap_or_default()
            .into_iter()
            .filter_map(|o| {
                let url = o.url?;
                let size = o.filesize.and_then(|s| s.as_u64());
                Some(
                    RawOption::new(
                        o.quality.unwrap_or_default(),
                        o.format.unwrap_or_else(|| "mp4".to_string()),
                        url,
                    )
                    .with_size(size),
                )
            })
            .collect();

        info!("[Backend] Resolved {}", url.trim());
        Ok(RawMedia {
            title: media.title,
            author: media.author,
            thumbnail: media.thumbnail,
            description: media.description,
            duration_seconds: media.duration.and_then(|d| d.as_f64()),
            is_live: media.is_live.unwrap_or(false),
            canonical_url: media.url,
            options,
        })
    }
}
