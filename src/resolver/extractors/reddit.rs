// Reddit extractor - public post JSON

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use super::traits::{capture_id, MediaExtractor};
use crate::resolver::config::ResolverConfig;
use crate::resolver::errors::ResolveError;
use crate::resolver::format_selector::FormatSelector;
use crate::resolver::http::HttpFetcher;
use crate::resolver::models::{RawMedia, RawOption};

const API_BASE: &str = "https://www.reddit.com";

lazy_static::lazy_static! {
    static ref COMMENTS_RE: Regex = Regex::new(r"(?i)/comments/([a-z0-9]+)").unwrap();
    static ref SHORT_RE: Regex = Regex::new(r"(?i)redd\.it/([a-z0-9]+)").unwrap();
}

#[derive(Debug, Deserialize)]
struct Listing {
    data: Option<ListingData>,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    children: Option<Vec<Child>>,
}

#[derive(Debug, Deserialize)]
struct Child {
    data: Option<Post>,
}

#[derive(Debug, Deserialize)]
struct Post {
    title: Option<String>,
    author: Option<String>,
    selftext: Option<String>,
    permalink: Option<String>,
    url: Option<String>,
    thumbnail: Option<String>,
    secure_media: Option<PostMedia>,
    media: Option<PostMedia>,
    preview: Option<Preview>,
}

#[derive(Debug, Deserialize)]
struct PostMedia {
    reddit_video: Option<RedditVideo>,
}

#[derive(Debug, Deserialize)]
struct RedditVideo {
    fallback_url: Option<String>,
    hls_url: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    duration: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Preview {
    images: Option<Vec<PreviewImage>>,
}

#[derive(Debug, Deserialize)]
struct PreviewImage {
    source: Option<PreviewSource>,
}

#[derive(Debug, Deserialize)]
struct PreviewSource {
    url: Option<String>,
}

pub struct RedditExtractor {
    fetcher: Arc<dyn HttpFetcher>,
    timeout: Duration,
}

impl RedditExtractor {
    pub fn new(fetcher: Arc<dyn HttpFetcher>, config: &ResolverConfig) -> Self {
        Self {
            fetcher,
            timeout: config.mirror_timeout(),
        }
    }

    /// Reddit escapes `&` in JSON-embedded URLs
    fn unescape(url: String) -> String {
        url.replace("&amp;", "&")
    }

    fn direct_media(url: &str) -> Option<&'static str> {
        let path = url.split('?').next().unwrap_or(url).to_lowercase();
        if path.ends_with(".mp4") {
            Some("mp4")
        } else if path.ends_with(".gif") {
            Some("gif")
        } else {
            None
        }
    }

    fn to_raw(post: Post) -> RawMedia {
        let video = post
            .secure_media
            .and_then(|m| m.reddit_video)
            .or_else(|| post.media.and_then(|m| m.reddit_video));

        let mut options = Vec::new();
        let mut duration = None;

        if let Some(video) = video {
            duration = video.duration;
            if let Some(url) = video.fallback_url {
                let label = FormatSelector::label_for_height(video.width, video.height)
                    .unwrap_or_else(|| "Video".to_string());
                options.push(RawOption::new(label, "mp4", Self::unescape(url)));
            }
            if let Some(hls) = video.hls_url {
                options.push(RawOption::new("HLS", "m3u8", Self::unescape(hls)));
            }
        }

        if options.is_empty() {
            if let Some(url) = post.url.as_deref() {
                if let Some(format) = Self::direct_media(url) {
                    options.push(RawOption::new("Original", format, Self::unescape(url.to_string())));
                }
            }
        }

        let preview = post
            .preview
            .and_then(|p| p.images)
            .and_then(|images| images.into_iter().next())
            .and_then(|image| image.source)
            .and_then(|source| source.url)
            .map(Self::unescape);
        let thumbnail = preview.or_else(|| post.thumbnail.filter(|t| t.starts_with("http")));

        RawMedia {
            title: post.title,
            author: post.author.map(|a| format!("u/{}", a)),
            thumbnail,
            description: post.selftext,
            duration_seconds: duration,
            is_live: false,
            canonical_url: post.permalink.map(|p| format!("{}{}", API_BASE, p)),
            options,
        }
    }
}

#[async_trait]
impl MediaExtractor for RedditExtractor {
    fn name(&self) -> &'static str {
        "Reddit"
    }

    fn media_id(&self, url: &str) -> Result<String, ResolveError> {
        capture_id(&[&*COMMENTS_RE, &*SHORT_RE], url).map(|id| id.to_lowercase())
    }

    async fn extract(&self, _url: &str, media_id: &str) -> Result<RawMedia, ResolveError> {
        let api_url = format!("{}/comments/{}.json?raw_json=1", API_BASE, media_id);
        let body = self.fetcher.get(&api_url, self.timeout).await?;

        // [post listing, comment listing]
        let listings: Vec<Listing> = ResolveError::parse_json(&body)?;
        let post = listings
            .into_iter()
            .next()
            .and_then(|l| l.data)
            .and_then(|d| d.children)
            .and_then(|c| c.into_iter().next())
            .and_then(|c| c.data)
            .ok_or_else(|| ResolveError::NoMediaFound(format!("post {} not found", media_id)))?;

        info!("[Reddit] Resolved post {}", media_id);
        Ok(Self::to_raw(post))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::errors::ErrorKind;
    use crate::resolver::http::mock::MockFetcher;

    const API: &str = "https://www.reddit.com/comments/abc123.json?raw_json=1";

    fn extractor(fetcher: Arc<MockFetcher>) -> RedditExtractor {
        RedditExtractor::new(fetcher, &ResolverConfig::default())
    }

    #[test]
    fn test_media_id() {
        let ex = extractor(Arc::new(MockFetcher::new()));
        assert_eq!(
            ex.media_id("https://www.reddit.com/r/videos/comments/ABC123/some_title/").unwrap(),
            "abc123"
        );
        assert_eq!(ex.media_id("https://redd.it/abc123").unwrap(), "abc123");
        assert!(ex.media_id("https://www.reddit.com/r/videos/").is_err());
    }

    #[tokio::test]
    async fn test_hosted_video() {
        let body = r#"[
            {"kind": "Listing", "data": {"children": [{"kind": "t3", "data": {
                "title": "Cat",
                "author": "someone",
                "permalink": "/r/videos/comments/abc123/cat/",
                "url": "https://v.redd.it/xyz",
                "thumbnail": "https://b.thumbs.redditmedia.com/t.jpg",
                "secure_media": {"reddit_video": {
                    "fallback_url": "https://v.redd.it/xyz/DASH_720.mp4?source=fallback",
                    "hls_url": "https://v.redd.it/xyz/HLSPlaylist.m3u8?a=1&amp;b=2",
                    "width": 1280, "height": 720, "duration": 33
                }},
                "preview": {"images": [{"source": {"url": "https://preview.redd.it/p.jpg?width=640&amp;s=1"}}]}
            }}]}},
            {"kind": "Listing", "data": {"children": []}}
        ]"#;
        let fetcher = Arc::new(MockFetcher::new().ok(API, body));

        let raw = extractor(fetcher).extract("", "abc123").await.unwrap();

        assert_eq!(raw.author.as_deref(), Some("u/someone"));
        assert_eq!(
            raw.canonical_url.as_deref(),
            Some("https://www.reddit.com/r/videos/comments/abc123/cat/")
        );
        assert_eq!(raw.thumbnail.as_deref(), Some("https://preview.redd.it/p.jpg?width=640&s=1"));
        assert_eq!(raw.duration_seconds, Some(33.0));
        let labels: Vec<&str> = raw.options.iter().map(|o| o.quality.as_str()).collect();
        assert_eq!(labels, vec!["720p", "HLS"]);
        assert_eq!(raw.options[1].url, "https://v.redd.it/xyz/HLSPlaylist.m3u8?a=1&b=2");
    }

    #[tokio::test]
    async fn test_direct_gif_link() {
        let body = r#"[{"data": {"children": [{"data": {"title": "gif", "url": "https://i.redd.it/funny.gif"}}]}}]"#;
        let fetcher = Arc::new(MockFetcher::new().ok(API, body));

        let raw = extractor(fetcher).extract("", "abc123").await.unwrap();

        assert_eq!(raw.options.len(), 1);
        assert_eq!(raw.options[0].quality, "Original");
        assert_eq!(raw.options[0].format, "gif");
    }

    #[tokio::test]
    async fn test_missing_post() {
        let fetcher = Arc::new(MockFetcher::new().ok(API, r#"[{"data": {"children": []}}]"#));
        let err = extractor(fetcher).extract("", "abc123").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoMediaFound);

        let fetcher = Arc::new(MockFetcher::new().ok(API, r#"{"error": 404}"#));
        let err = extractor(fetcher).extract("", "abc123").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedUpstreamResponse);
    }
}
