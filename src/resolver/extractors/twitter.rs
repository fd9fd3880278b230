// Twitter/X extractor - FxTwitter-compatible API mirrors

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
use crate::resolver::mirrors::MirrorPool;
use crate::resolver::models::{RawMedia, RawOption};

const TITLE_LIMIT: usize = 100;

lazy_static::lazy_static! {
    static ref STATUS_ID_RE: Regex = Regex::new(r"(?i)/status(?:es)?/(\d+)").unwrap();
}

#[derive(Debug, Deserialize)]
struct FxResponse {
    tweet: Option<FxTweet>,
}

#[derive(Debug, Deserialize)]
struct FxTweet {
    url: Option<String>,
    text: Option<String>,
    author: Option<FxAuthor>,
    media: Option<FxMedia>,
}

#[derive(Debug, Deserialize)]
struct FxAuthor {
    name: Option<String>,
    screen_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FxMedia {
    videos: Option<Vec<FxVideo>>,
    photos: Option<Vec<FxPhoto>>,
}

#[derive(Debug, Deserialize)]
struct FxVideo {
    url: Option<String>,
    thumbnail_url: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    duration: Option<f64>,
    format: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FxPhoto {
    url: Option<String>,
}

pub struct TwitterExtractor {
    fetcher: Arc<dyn HttpFetcher>,
    instances: Vec<String>,
    per_attempt: Duration,
}

impl TwitterExtractor {
    pub fn new(fetcher: Arc<dyn HttpFetcher>, config: &ResolverConfig) -> Self {
        Self {
            fetcher,
            instances: config.fxtwitter_instances.clone(),
            per_attempt: config.mirror_timeout(),
        }
    }

    fn to_raw(tweet: FxTweet) -> RawMedia {
        let media = tweet.media.unwrap_or(FxMedia {
            videos: None,
            photos: None,
        });
        let videos = media.videos.unwrap_or_default();
        let photos = media.photos.unwrap_or_default();

        let mut options: Vec<RawOption> = videos
            .iter()
            .filter_map(|v| {
                let url = v.url.as_deref()?;
                let label = FormatSelector::label_for_height(v.width, v.height)
                    .unwrap_or_else(|| "Video".to_string());
                let format = v
                    .format
                    .as_deref()
                    .map(FormatSelector::ext_from_mime)
                    .unwrap_or_else(|| "mp4".to_string());
                Some(RawOption::new(label, format, url))
            })
            .collect();

        options.extend(
            photos
                .iter()
                .filter_map(|p| p.url.as_deref())
                .enumerate()
                .map(|(i, url)| RawOption::new(format!("Photo {}", i + 1), "jpg", url)),
        );

        let thumbnail = videos
            .iter()
            .find_map(|v| v.thumbnail_url.clone())
            .or_else(|| photos.iter().find_map(|p| p.url.clone()));

        let author = tweet.author.map(|a| match (a.name, a.screen_name) {
            (Some(name), Some(handle)) => format!("{} (@{})", name, handle),
            (Some(name), None) => name,
            (None, Some(handle)) => format!("@{}", handle),
            (None, None) => String::new(),
        });

        let text = tweet.text.unwrap_or_default();

        RawMedia {
            title: Some(FormatSelector::truncate(text.trim(), TITLE_LIMIT)),
            author,
            thumbnail,
            description: Some(text),
            duration_seconds: videos.iter().find_map(|v| v.duration),
            is_live: false,
            canonical_url: tweet.url,
            options,
        }
    }
}

#[async_trait]
impl MediaExtractor for TwitterExtractor {
    fn name(&self) -> &'static str {
        "Twitter"
    }

    fn media_id(&self, url: &str) -> Result<String, ResolveError> {
        capture_id(&[&*STATUS_ID_RE], url)
    }

    async fn extract(&self, _url: &str, media_id: &str) -> Result<RawMedia, ResolveError> {
        let response: FxResponse = MirrorPool::new("FxTwitter", &self.instances)
            .try_mirrors_json(
                self.fetcher.as_ref(),
                &format!("/status/{}", media_id),
                self.per_attempt,
            )
            .await?;

        let tweet = response
            .tweet
            .ok_or_else(|| ResolveError::NoMediaFound(format!("status {} not found", media_id)))?;

        info!("[Twitter] Resolved status {}", media_id);
        Ok(Self::to_raw(tweet))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::errors::FetchError;
    use crate::resolver::http::mock::MockFetcher;

    fn extractor(fetcher: Arc<MockFetcher>) -> TwitterExtractor {
        let mut config = ResolverConfig::default();
        config.fxtwitter_instances = vec!["https://fx1".to_string(), "https://fx2".to_string()];
        TwitterExtractor::new(fetcher, &config)
    }

    #[test]
    fn test_media_id() {
        let ex = extractor(Arc::new(MockFetcher::new()));
        assert_eq!(ex.media_id("https://x.com/user/status/1234567890").unwrap(), "1234567890");
        assert_eq!(
            ex.media_id("https://twitter.com/user/statuses/42?s=20").unwrap(),
            "42"
        );
        assert!(matches!(
            ex.media_id("https://x.com/user"),
            Err(ResolveError::InvalidUrl(_))
        ));
    }

    #[tokio::test]
    async fn test_extract_from_second_mirror() {
        let body = r#"{
            "code": 200,
            "message": "OK",
            "tweet": {
                "url": "https://x.com/user/status/42",
                "text": "look at this",
                "author": {"name": "User", "screen_name": "user"},
                "media": {
                    "videos": [
                        {"url": "https://video.twimg.com/v.mp4", "thumbnail_url": "https://pbs.twimg.com/t.jpg",
                         "width": 720, "height": 1280, "duration": 12.5, "format": "video/mp4"}
                    ],
                    "photos": [{"url": "https://pbs.twimg.com/p1.jpg"}]
                }
            }
        }"#;
        let fetcher = Arc::new(
            MockFetcher::new()
                .fail("https://fx1/status/42", FetchError::Timeout)
                .ok("https://fx2/status/42", body),
        );

        let raw = extractor(fetcher.clone()).extract("", "42").await.unwrap();

        assert_eq!(fetcher.call_count(), 2);
        assert_eq!(raw.author.as_deref(), Some("User (@user)"));
        assert_eq!(raw.title.as_deref(), Some("look at this"));
        assert_eq!(raw.duration_seconds, Some(12.5));
        assert_eq!(raw.thumbnail.as_deref(), Some("https://pbs.twimg.com/t.jpg"));
        let labels: Vec<&str> = raw.options.iter().map(|o| o.quality.as_str()).collect();
        assert_eq!(labels, vec!["720p", "Photo 1"]);
        assert_eq!(raw.options[1].format, "jpg");
    }

    #[tokio::test]
    async fn test_text_only_tweet_has_no_options() {
        let body = r#"{"code": 200, "tweet": {"text": "just words", "media": null}}"#;
        let fetcher = Arc::new(MockFetcher::new().ok("https://fx1/status/7", body));

        let raw = extractor(fetcher).extract("", "7").await.unwrap();

        assert!(raw.options.is_empty());
    }
}
