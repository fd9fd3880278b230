// Per-platform extractors
//
// Every supported platform has exactly one `MediaExtractor`. The registry is
// built from `PlatformKind` with an exhaustive match, so adding a platform
// without an extractor does not compile.

mod traits;
mod youtube;
mod tiktok;
mod twitter;
mod reddit;
mod vimeo;
mod unsupported;
mod backend;

use serde::Deserialize;
use std::sync::Arc;

use super::config::ResolverConfig;
use super::http::HttpFetcher;
use super::platforms::PlatformKind;

pub use traits::MediaExtractor;
pub use youtube::YouTubeExtractor;
pub use tiktok::TikTokExtractor;
pub use twitter::TwitterExtractor;
pub use reddit::RedditExtractor;
pub use vimeo::VimeoExtractor;
pub use unsupported::UnsupportedExtractor;
pub use backend::BackendExtractor;

/// Upstreams disagree on whether numbers are JSON numbers or strings
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum LooseNumber {
    Num(f64),
    Str(String),
}

impl LooseNumber {
    pub(crate) fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Num(n) if n.is_finite() => Some(*n),
            Self::Num(_) => None,
            Self::Str(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        }
    }

    pub(crate) fn as_u64(&self) -> Option<u64> {
        match self {
            Self::Str(s) => s
                .trim()
                .parse::<u64>()
                .ok()
                .or_else(|| self.as_f64().filter(|n| *n >= 0.0).map(|n| n as u64)),
            Self::Num(_) => self.as_f64().filter(|n| *n >= 0.0).map(|n| n as u64),
        }
    }
}

/// Direct extractor for a platform
pub fn build_extractor(
    kind: PlatformKind,
    fetcher: Arc<dyn HttpFetcher>,
    config: &ResolverConfig,
) -> Arc<dyn MediaExtractor> {
    match kind {
        PlatformKind::YouTube => Arc::new(YouTubeExtractor::new(fetcher, config)),
        PlatformKind::TikTok => Arc::new(TikTokExtractor::new(fetcher, config)),
        PlatformKind::Twitter => Arc::new(TwitterExtractor::new(fetcher, config)),
        PlatformKind::Reddit => Arc::new(RedditExtractor::new(fetcher, config)),
        PlatformKind::Vimeo => Arc::new(VimeoExtractor::new(fetcher, config)),
        PlatformKind::Instagram | PlatformKind::Facebook => Arc::new(UnsupportedExtractor::new(kind)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loose_number() {
        let n: LooseNumber = serde_json::from_str("\"1048576\"").unwrap();
        assert_eq!(n.as_u64(), Some(1_048_576));
        let n: LooseNumber = serde_json::from_str("12.5").unwrap();
        assert_eq!(n.as_f64(), Some(12.5));
        assert_eq!(n.as_u64(), Some(12));
        let n: LooseNumber = serde_json::from_str("-3").unwrap();
        assert_eq!(n.as_u64(), None);
        let n: LooseNumber = serde_json::from_str("\"n/a\"").unwrap();
        assert_eq!(n.as_f64(), None);
    }

    #[test]
    fn test_every_platform_has_an_extractor() {
        let fetcher: Arc<dyn HttpFetcher> = Arc::new(crate::resolver::http::mock::MockFetcher::new());
        let config = ResolverConfig::default();
        for kind in PlatformKind::ALL {
            let extractor = build_extractor(kind, fetcher.clone(), &config);
            assert_eq!(extractor.name(), kind.name());
        }
    }
}
