// Vimeo extractor - player config JSON

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use super::traits::{capture_id, MediaExtractor};
use crate::resolver::config::ResolverConfig;
use crate::resolver::errors::ResolveError;
use crate::resolver::format_selector::FormatSelector;
use crate::resolver::http::HttpFetcher;
use crate::resolver::models::{RawMedia, RawOption};

lazy_static::lazy_static! {
    static ref VIDEO_ID_RE: Regex = Regex::new(r"(?i)vimeo\.com/(?:.*?/)?(?:video/)?(\d{4,})(?:[/?#]|$)").unwrap();
}

#[derive(Debug, Deserialize)]
struct PlayerConfig {
    video: Option<VimeoVideo>,
    request: Option<VimeoRequest>,
}

#[derive(Debug, Deserialize)]
struct VimeoVideo {
    title: Option<String>,
    duration: Option<f64>,
    url: Option<String>,
    thumbs: Option<HashMap<String, serde_json::Value>>,
    owner: Option<VimeoOwner>,
    live_event: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct VimeoOwner {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VimeoRequest {
    files: Option<VimeoFiles>,
}

#[derive(Debug, Deserialize)]
struct VimeoFiles {
    progressive: Option<Vec<Progressive>>,
    hls: Option<VimeoHls>,
}

#[derive(Debug, Deserialize)]
struct Progressive {
    quality: Option<String>,
    url: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    mime: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VimeoHls {
    default_cdn: Option<String>,
    cdns: Option<BTreeMap<String, VimeoCdn>>,
}

#[derive(Debug, Deserialize)]
struct VimeoCdn {
    url: Option<String>,
}

pub struct VimeoExtractor {
    fetcher: Arc<dyn HttpFetcher>,
    timeout: Duration,
}

impl VimeoExtractor {
    pub fn new(fetcher: Arc<dyn HttpFetcher>, config: &ResolverConfig) -> Self {
        Self {
            fetcher,
            timeout: config.mirror_timeout(),
        }
    }

    /// Largest numbered thumbnail, else `base`; non-string entries are ignored
    fn pick_thumbnail(thumbs: HashMap<String, serde_json::Value>) -> Option<String> {
        let largest = thumbs
            .iter()
            .filter_map(|(k, v)| Some((k.parse::<u32>().ok()?, v.as_str()?)))
            .max_by_key(|(size, _)| *size)
            .map(|(_, v)| v.to_string());
        largest.or_else(|| thumbs.get("base").and_then(|v| v.as_str()).map(str::to_string))
    }

    fn to_raw(config: PlayerConfig) -> RawMedia {
        let files = config.request.and_then(|r| r.files);
        let (progressive, hls) = match files {
            Some(f) => (f.progressive.unwrap_or_default(), f.hls),
            None => (Vec::new(), None),
        };

        let mut options: Vec<RawOption> = progressive
            .into_iter()
            .filter_map(|p| {
                let url = p.url?;
                let label = p
                    .quality
                    .map(|q| FormatSelector::normalize_label(&q))
                    .or_else(|| FormatSelector::label_for_height(p.width, p.height))
                    .unwrap_or_else(|| "Video".to_string());
                let format = p
                    .mime
                    .as_deref()
                    .map(FormatSelector::ext_from_mime)
                    .unwrap_or_else(|| "mp4".to_string());
                Some(RawOption::new(label, format, url))
            })
            .collect();

        // without a usable default, the first CDN by name
        if let Some(hls) = hls {
            let mut cdns = hls.cdns.unwrap_or_default();
            let url = hls
                .default_cdn
                .and_then(|name| cdns.remove(&name))
                .or_else(|| cdns.into_values().next())
                .and_then(|cdn| cdn.url);
            if let Some(url) = url {
                options.push(RawOption::new("HLS", "m3u8", url));
            }
        }

        let video = config.video;
        let is_live = video
            .as_ref()
            .and_then(|v| v.live_event.as_ref())
            .map_or(false, |e| !e.is_null());

        match video {
            Some(v) => RawMedia {
                title: v.title,
                author: v.owner.and_then(|o| o.name),
                thumbnail: v.thumbs.and_then(Self::pick_thumbnail),
                description: None,
                duration_seconds: v.duration,
                is_live,
                canonical_url: v.url,
                options,
            },
            None => RawMedia {
                options,
                ..Default::default()
            },
        }
    }
}

#[async_trait]
impl MediaExtractor for VimeoExtractor {
    fn name(&self) -> &'static str {
        "Vimeo"
    }

    fn media_id(&self, url: &str) -> Result<String, ResolveError> {
        capture_id(&[&*VIDEO_ID_RE], url)
    }

    async fn extract(&self, _url: &str, media_id: &str) -> Result<RawMedia, ResolveError> {
        let api_url = format!("https://player.vimeo.com/video/{}/config", media_id);
        let body = self.fetcher.get(&api_url, self.timeout).await?;
        let config: PlayerConfig = ResolveError::parse_json(&body)?;

        info!("[Vimeo] Resolved video {}", media_id);
        Ok(Self::to_raw(config))
    }
}
