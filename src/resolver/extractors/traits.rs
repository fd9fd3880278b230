// MediaExtractor trait - one implementation per platform

use async_trait::async_trait;
use regex::Regex;

use crate::resolver::errors::ResolveError;
use crate::resolver::models::RawMedia;

/// Turns a URL of one platform into raw media data
#[async_trait]
pub trait MediaExtractor: Send + Sync {
    /// Name of the extractor (for logging)
    fn name(&self) -> &'static str;

    /// Pull the platform's media identifier out of the URL. Pure, no I/O.
    fn media_id(&self, url: &str) -> Result<String, ResolveError>;

    /// Query the upstream(s) and collect every downloadable variant
    async fn extract(&self, url: &str, media_id: &str) -> Result<RawMedia, ResolveError>;
}

/// First capture group of the first pattern that matches `url`
pub(crate) fn capture_id(patterns: &[&Regex], url: &str) -> Result<String, ResolveError> {
    patterns
        .iter()
        .find_map(|re| re.captures(url.trim()))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| ResolveError::InvalidUrl(url.trim().to_string()))
}
