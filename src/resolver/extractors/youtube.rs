// YouTube extractor - Piped mirrors first, Invidious mirrors second
//
// Neither API is run by YouTube and individual instances come and go, so
// both are used as mirror pools. Only when every Piped instance is down do
// we move on to Invidious; a content failure from Piped is final.

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use super::traits::{capture_id, MediaExtractor};
use super::LooseNumber;
use crate::resolver::config::ResolverConfig;
use crate::resolver::errors::{ErrorKind, ResolveError};
use crate::resolver::format_selector::FormatSelector;
use crate::resolver::http::HttpFetcher;
use crate::resolver::mirrors::MirrorPool;
use crate::resolver::models::{RawMedia, RawOption};

lazy_static::lazy_static! {
    static ref VIDEO_ID_RE: Regex = Regex::new(
        r"(?i)(?:youtube(?:-nocookie)?\.com/(?:watch\?(?:[^#]*&)?v=|shorts/|embed/|live/|v/)|youtu\.be/)([A-Za-z0-9_-]{11})(?:[^A-Za-z0-9_-]|$)"
    ).unwrap();
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PipedStreams {
    title: Option<String>,
    description: Option<String>,
    uploader: Option<String>,
    thumbnail_url: Option<String>,
    duration: Option<f64>,
    livestream: Option<bool>,
    hls: Option<String>,
    video_streams: Option<Vec<PipedStream>>,
    audio_streams: Option<Vec<PipedStream>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PipedStream {
    url: Option<String>,
    format: Option<String>,
    quality: Option<String>,
    mime_type: Option<String>,
    video_only: Option<bool>,
    bitrate: Option<f64>,
    content_length: Option<i64>,
}

impl PipedStream {
    fn ext(&self) -> String {
        match (&self.mime_type, &self.format) {
            (Some(mime), _) if !mime.is_empty() => FormatSelector::ext_from_mime(mime),
            (_, Some(format)) => format.to_lowercase(),
            _ => "mp4".to_string(),
        }
    }

    fn to_option(&self, label: String) -> Option<RawOption> {
        let url = self.url.as_deref()?;
        Some(
            RawOption::new(label, self.ext(), url)
                .with_size(self.content_length.and_then(|l| u64::try_from(l).ok())),
        )
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InvidiousVideo {
    title: Option<String>,
    description: Option<String>,
    author: Option<String>,
    length_seconds: Option<f64>,
    live_now: Option<bool>,
    hls_url: Option<String>,
    video_thumbnails: Option<Vec<InvidiousThumbnail>>,
    format_streams: Option<Vec<InvidiousFormat>>,
    adaptive_formats: Option<Vec<InvidiousFormat>>,
}

#[derive(Debug, Deserialize)]
struct InvidiousThumbnail {
    quality: Option<String>,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InvidiousFormat {
    url: Option<String>,
    #[serde(rename = "type")]
    mime_type: Option<String>,
    quality_label: Option<String>,
    container: Option<String>,
    bitrate: Option<LooseNumber>,
    clen: Option<LooseNumber>,
}

impl InvidiousFormat {
    fn is_audio(&self) -> bool {
        self.mime_type
            .as_deref()
            .map_or(false, |t| t.starts_with("audio/"))
    }

    fn ext(&self) -> String {
        match (&self.mime_type, &self.container) {
            (Some(mime), _) if !mime.is_empty() => FormatSelector::ext_from_mime(mime),
            (_, Some(container)) => container.to_lowercase(),
            _ => "mp4".to_string(),
        }
    }

    fn to_option(&self, label: String) -> Option<RawOption> {
        let url = self.url.as_deref()?;
        Some(RawOption::new(label, self.ext(), url).with_size(self.clen.as_ref().and_then(|c| c.as_u64())))
    }
}

pub struct YouTubeExtractor {
    fetcher: Arc<dyn HttpFetcher>,
    piped_instances: Vec<String>,
    invidious_instances: Vec<String>,
    per_attempt: Duration,
}

impl YouTubeExtractor {
    pub fn new(fetcher: Arc<dyn HttpFetcher>, config: &ResolverConfig) -> Self {
        Self {
            fetcher,
            piped_instances: config.piped_instances.clone(),
            invidious_instances: config.invidious_instances.clone(),
            per_attempt: config.mirror_timeout(),
        }
    }

    fn watch_url(id: &str) -> String {
        format!("https://www.youtube.com/watch?v={}", id)
    }

    fn fallback_thumbnail(id: &str) -> String {
        format!("https://i.ytimg.com/vi/{}/hqdefault.jpg", id)
    }

    fn from_piped(id: &str, streams: PipedStreams) -> RawMedia {
        let is_live = streams.livestream.unwrap_or(false);
        let videos = streams.video_streams.unwrap_or_default();
        let audios: Vec<PipedStream> = streams
            .audio_streams
            .unwrap_or_default()
            .into_iter()
            .filter(|a| a.url.is_some())
            .collect();

        let label = |s: &PipedStream| FormatSelector::normalize_label(s.quality.as_deref().unwrap_or(""));

        // muxed first so they win deduplication over video-only variants
        let (muxed, video_only): (Vec<&PipedStream>, Vec<&PipedStream>) = videos
            .iter()
            .partition(|s| !s.video_only.unwrap_or(true));

        let mut options: Vec<RawOption> = muxed
            .iter()
            .chain(video_only.iter())
            .filter_map(|s| s.to_option(label(*s)))
            .collect();

        if let Some(best) = FormatSelector::best_audio(&audios, |a| a.bitrate) {
            options.extend(best.to_option("audio".to_string()));
        }

        if is_live {
            if let Some(hls) = streams.hls.filter(|h| !h.is_empty()) {
                options.push(RawOption::new("HLS", "m3u8", hls));
            }
        }

        RawMedia {
            title: streams.title,
            author: streams.uploader,
            thumbnail: streams
                .thumbnail_url
                .or_else(|| Some(Self::fallback_thumbnail(id))),
            description: streams.description,
            duration_seconds: streams.duration,
            is_live,
            canonical_url: Some(Self::watch_url(id)),
            options,
        }
    }

    fn from_invidious(id: &str, video: InvidiousVideo) -> RawMedia {
        let is_live = video.live_now.unwrap_or(false);
        let adaptive = video.adaptive_formats.unwrap_or_default();

        let label = |f: &InvidiousFormat| {
            FormatSelector::normalize_label(f.quality_label.as_deref().unwrap_or(""))
        };

        let mut options: Vec<RawOption> = video
            .format_streams
            .unwrap_or_default()
            .iter()
            .filter_map(|f| f.to_option(label(f)))
            .collect();

        options.extend(
            adaptive
                .iter()
                .filter(|f| !f.is_audio())
                .filter_map(|f| f.to_option(label(f))),
        );

        let audios: Vec<&InvidiousFormat> = adaptive
            .iter()
            .filter(|f| f.is_audio() && f.url.is_some())
            .collect();
        if let Some(best) = FormatSelector::best_audio(&audios, |f| f.bitrate.as_ref().and_then(|b| b.as_f64())) {
            options.extend(best.to_option("audio".to_string()));
        }

        if is_live {
            if let Some(hls) = video.hls_url.filter(|h| !h.is_empty()) {
                options.push(RawOption::new("HLS", "m3u8", hls));
            }
        }

        let thumbnails = video.video_thumbnails.unwrap_or_default();
        let thumbnail = thumbnails
            .iter()
            .find(|t| t.quality.as_deref() == Some("high"))
            .or_else(|| thumbnails.first())
            .and_then(|t| t.url.clone())
            .filter(|u| u.starts_with("http"))
            .unwrap_or_else(|| Self::fallback_thumbnail(id));

        RawMedia {
            title: video.title,
            author: video.author,
            thumbnail: Some(thumbnail),
            description: video.description,
            duration_seconds: video.length_seconds,
            is_live,
            canonical_url: Some(Self::watch_url(id)),
            options,
        }
    }
}

#[async_trait]
impl MediaExtractor for YouTubeExtractor {
    fn name(&self) -> &'static str {
        "YouTube"
    }

    fn media_id(&self, url: &str) -> Result<String, ResolveError> {
        capture_id(&[&*VIDEO_ID_RE], url)
    }

    async fn extract(&self, _url: &str, media_id: &str) -> Result<RawMedia, ResolveError> {
        let fetcher = self.fetcher.as_ref();

        let piped = MirrorPool::new("Piped", &self.piped_instances)
            .try_mirrors_json::<PipedStreams>(fetcher, &format!("/streams/{}", media_id), self.per_attempt)
            .await;

        match piped {
            Ok(streams) => {
                info!("[YouTube] Resolved {} via Piped", media_id);
                return Ok(Self::from_piped(media_id, streams));
            }
            Err(e) if e.kind() == ErrorKind::UpstreamUnavailable => {
                warn!("[YouTube] Piped pool exhausted for {}: {}", media_id, e);
            }
            Err(e) => return Err(e),
        }

        let video = MirrorPool::new("Invidious", &self.invidious_instances)
            .try_mirrors_json::<InvidiousVideo>(
                fetcher,
                &format!("/api/v1/videos/{}", media_id),
                self.per_attempt,
            )
            .await?;

        info!("[YouTube] Resolved {} via Invidious", media_id);
        Ok(Self::from_invidious(media_id, video))
    }
}
