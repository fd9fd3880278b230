// Platforms without a public, unauthenticated upstream
//
// These fail deterministically before any network call is made.

use async_trait::async_trait;

use super::traits::MediaExtractor;
use crate::resolver::errors::ResolveError;
use crate::resolver::models::RawMedia;
use crate::resolver::platforms::PlatformKind;

pub struct UnsupportedExtractor {
    platform: PlatformKind,
}

impl UnsupportedExtractor {
    pub fn new(platform: PlatformKind) -> Self {
        Self { platform }
    }

    fn error(&self) -> ResolveError {
        ResolveError::UnsupportedPlatform(format!(
            "{} requires a logged-in session; public downloads are not available",
            self.platform
        ))
    }
}

#[async_trait]
impl MediaExtractor for UnsupportedExtractor {
    fn name(&self) -> &'static str {
        self.platform.name()
    }

    fn media_id(&self, _url: &str) -> Result<String, ResolveError> {
        Err(self.error())
    }

    async fn extract(&self, _url: &str, _media_id: &str) -> Result<RawMedia, ResolveError> {
        Err(self.error())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::errors::ErrorKind;

    #[tokio::test]
    async fn test_always_unsupported() {
        let ex = UnsupportedExtractor::new(PlatformKind::Instagram);
        let err = ex.media_id("https://www.instagram.com/reel/abc/").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedPlatform);
        assert!(err.to_string().contains("Instagram"));

        let err = ex.extract("https://www.instagram.com/reel/abc/", "abc").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedPlatform);
    }
}
