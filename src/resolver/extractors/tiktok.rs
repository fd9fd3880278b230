// TikTok extractor - tikwm API (single upstream)

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use super::traits::{capture_id, MediaExtractor};
use super::LooseNumber;
use crate::resolver::config::ResolverConfig;
use crate::resolver::errors::ResolveError;
use crate::resolver::http::HttpFetcher;
use crate::resolver::mirrors::join_url;
use crate::resolver::models::{RawMedia, RawOption};

lazy_static::lazy_static! {
    static ref VIDEO_ID_RE: Regex = Regex::new(r"(?i)tiktok\.com/(?:@[\w.-]+/(?:video|photo)|v|embed(?:/v2)?)/(\d+)").unwrap();
    static ref SHORT_LINK_RE: Regex = Regex::new(r"(?i)(?:vm|vt)\.tiktok\.com/([A-Za-z0-9]+)").unwrap();
    static ref SHORT_PATH_RE: Regex = Regex::new(r"(?i)tiktok\.com/t/([A-Za-z0-9]+)").unwrap();
}

#[derive(Debug, Deserialize)]
struct TikwmResponse {
    code: Option<i64>,
    msg: Option<String>,
    data: Option<TikwmVideo>,
}

#[derive(Debug, Deserialize)]
struct TikwmVideo {
    title: Option<String>,
    cover: Option<String>,
    origin_cover: Option<String>,
    duration: Option<LooseNumber>,
    play: Option<String>,
    wmplay: Option<String>,
    hdplay: Option<String>,
    music: Option<String>,
    size: Option<LooseNumber>,
    wm_size: Option<LooseNumber>,
    hd_size: Option<LooseNumber>,
    author: Option<TikwmAuthor>,
}

#[derive(Debug, Deserialize)]
struct TikwmAuthor {
    unique_id: Option<String>,
    nickname: Option<String>,
}

pub struct TikTokExtractor {
    fetcher: Arc<dyn HttpFetcher>,
    endpoint: String,
    timeout: Duration,
}

impl TikTokExtractor {
    pub fn new(fetcher: Arc<dyn HttpFetcher>, config: &ResolverConfig) -> Self {
        Self {
            fetcher,
            endpoint: config.tikwm_endpoint.clone(),
            timeout: config.mirror_timeout(),
        }
    }

    /// tikwm sometimes hands out host-relative media paths
    fn absolute(&self, url: Option<String>) -> Option<String> {
        let url = url.filter(|u| !u.trim().is_empty())?;
        if url.starts_with('/') {
            Some(join_url(&self.endpoint, &url))
        } else {
            Some(url)
        }
    }

    fn to_raw(&self, video: TikwmVideo) -> RawMedia {
        let size = |n: &Option<LooseNumber>| n.as_ref().and_then(|v| v.as_u64());

        let candidates = [
            ("HD Video", "mp4", self.absolute(video.hdplay), size(&video.hd_size)),
            ("SD Video", "mp4", self.absolute(video.play), size(&video.size)),
            ("Watermarked", "mp4", self.absolute(video.wmplay), size(&video.wm_size)),
            ("Original Sound", "mp3", self.absolute(video.music), None),
        ];

        let options = candidates
            .into_iter()
            .filter_map(|(label, format, url, bytes)| {
                url.map(|u| RawOption::new(label, format, u).with_size(bytes))
            })
            .collect();

        let (author, handle) = match video.author {
            Some(a) => (a.nickname, a.unique_id),
            None => (None, None),
        };

        RawMedia {
            title: video.title,
            author: author.or_else(|| handle.map(|h| format!("@{}", h))),
            thumbnail: self.absolute(video.origin_cover.or(video.cover)),
            description: None,
            duration_seconds: video.duration.and_then(|d| d.as_f64()),
            is_live: false,
            canonical_url: None,
            options,
        }
    }
}

#[async_trait]
impl MediaExtractor for TikTokExtractor {
    fn name(&self) -> &'static str {
        "TikTok"
    }

    fn media_id(&self, url: &str) -> Result<String, ResolveError> {
        capture_id(&[&*VIDEO_ID_RE, &*SHORT_LINK_RE, &*SHORT_PATH_RE], url)
    }

    async fn extract(&self, url: &str, media_id: &str) -> Result<RawMedia, ResolveError> {
        let api_url = join_url(
            &self.endpoint,
            &format!("/api/?url={}&hd=1", urlencoding::encode(url.trim())),
        );
        let body = self.fetcher.get(&api_url, self.timeout).await?;
        let response: TikwmResponse = ResolveError::parse_json(&body)?;

        if response.code.unwrap_or(-1) != 0 {
            return Err(ResolveError::NoMediaFound(
                response.msg.unwrap_or_else(|| "tikwm rejected the URL".to_string()),
            ));
        }
        let video = response
            .data
            .ok_or_else(|| ResolveError::NoMediaFound("tikwm returned no data".to_string()))?;

        info!("[TikTok] Resolved {}", media_id);
        Ok(self.to_raw(video))
    }
}
