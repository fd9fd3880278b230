// Mirror coordinator - sequential fallback across equivalent hosts
//
// Endpoints are tried in the configured order, one bounded request each,
// no retries and no backoff. Individual failures are only logged; the
// caller sees a single `AllMirrorsFailed` once the list is exhausted.

use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

use super::errors::{FetchError, ResolveError};
use super::http::HttpFetcher;

/// Join a base URL and a path with exactly one `/` between them
pub fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// Ordered list of interchangeable upstream hosts
pub struct MirrorPool<'a> {
    name: &'a str,
    endpoints: &'a [String],
}

impl<'a> MirrorPool<'a> {
    pub fn new(name: &'a str, endpoints: &'a [String]) -> Self {
        Self { name, endpoints }
    }

    /// Return the body of the first mirror that answers with a 2xx status
    pub async fn try_mirrors(
        &self,
        fetcher: &dyn HttpFetcher,
        path: &str,
        per_attempt: Duration,
    ) -> Result<String, ResolveError> {
        self.try_mirrors_with(fetcher, path, per_attempt, |body| Ok(body))
            .await
    }

    /// Like `try_mirrors`, but a mirror whose body does not parse as `T`
    /// also counts as failed and the next one is tried
    pub async fn try_mirrors_json<T: DeserializeOwned + Send>(
        &self,
        fetcher: &dyn HttpFetcher,
        path: &str,
        per_attempt: Duration,
    ) -> Result<T, ResolveError> {
        self.try_mirrors_with(fetcher, path, per_attempt, |body| {
            ResolveError::parse_json::<T>(&body)
        })
        .await
    }

    async fn try_mirrors_with<T, F>(
        &self,
        fetcher: &dyn HttpFetcher,
        path: &str,
        per_attempt: Duration,
        accept: F,
    ) -> Result<T, ResolveError>
    where
        T: Send,
        F: Fn(String) -> Result<T, ResolveError> + Send,
    {
        let mut attempts = 0;
        let mut last_error = String::from("no mirrors configured");

        for base in self.endpoints {
            attempts += 1;
            let url = join_url(base, path);
            debug!("[Mirrors] {} attempt {}: {}", self.name, attempts, url);

            let outcome = match tokio::time::timeout(per_attempt, fetcher.get(&url, per_attempt)).await {
                Ok(Ok(body)) => accept(body),
                Ok(Err(e)) => Err(ResolveError::Upstream(e)),
                Err(_) => Err(ResolveError::Upstream(FetchError::Timeout)),
            };

            match outcome {
                Ok(value) => {
                    debug!("[Mirrors] {} answered by {}", self.name, base);
                    return Ok(value);
                }
                Err(e) => {
                    warn!("[Mirrors] {} mirror {} failed: {}", self.name, base, e);
                    last_error = e.to_string();
                }
            }
        }

        Err(ResolveError::AllMirrorsFailed {
            attempts,
            last_error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::errors::ErrorKind;
    use crate::resolver::http::mock::MockFetcher;

    fn endpoints(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("https://m{}.example/", i)).collect()
    }

    #[test]
    fn test_join_url() {
        assert_eq!(join_url("https://a.example/", "/streams/x"), "https://a.example/streams/x");
        assert_eq!(join_url("https://a.example", "streams/x"), "https://a.example/streams/x");
    }

    #[tokio::test]
    async fn test_stops_at_first_success() {
        let fetcher = MockFetcher::new()
            .fail("https://m1.example/streams/x", FetchError::Status(502))
            .fail("https://m2.example/streams/x", FetchError::Timeout)
            .ok("https://m3.example/streams/x", "third")
            .ok("https://m4.example/streams/x", "fourth");
        let list = endpoints(4);
        let pool = MirrorPool::new("test", &list);

        let body = pool
            .try_mirrors(&fetcher, "/streams/x", Duration::from_secs(1))
            .await
            .unwrap();

        assert_eq!(body, "third");
        assert_eq!(fetcher.call_count(), 3);
        assert_eq!(
            fetcher.calls(),
            vec![
                "https://m1.example/streams/x",
                "https://m2.example/streams/x",
                "https://m3.example/streams/x",
            ]
        );
    }

    #[tokio::test]
    async fn test_all_mirrors_fail() {
        let fetcher = MockFetcher::new()
            .fail("https://m1.example/p", FetchError::Status(500))
            .fail("https://m2.example/p", FetchError::Connection("refused".into()))
            .fail("https://m3.example/p", FetchError::Status(429));
        let list = endpoints(3);
        let pool = MirrorPool::new("test", &list);

        let err = pool
            .try_mirrors(&fetcher, "p", Duration::from_secs(1))
            .await
            .unwrap_err();

        assert_eq!(fetcher.call_count(), 3);
        assert_eq!(err.kind(), ErrorKind::UpstreamUnavailable);
        match err {
            ResolveError::AllMirrorsFailed { attempts, last_error } => {
                assert_eq!(attempts, 3);
                assert!(last_error.contains("429"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_pool() {
        let fetcher = MockFetcher::new();
        let list: Vec<String> = Vec::new();
        let err = MirrorPool::new("empty", &list)
            .try_mirrors(&fetcher, "p", Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::AllMirrorsFailed { attempts: 0, .. }));
        assert_eq!(fetcher.call_count(), 0);
    }

    #[tokio::test]
    async fn test_unparseable_body_moves_to_next_mirror() {
        let fetcher = MockFetcher::new()
            .ok("https://m1.example/api", "<html>maintenance</html>")
            .ok("https://m2.example/api", r#"{"ok": true}"#);
        let list = endpoints(2);
        let pool = MirrorPool::new("json", &list);

        let value: serde_json::Value = pool
            .try_mirrors_json(&fetcher, "/api", Duration::from_secs(1))
            .await
            .unwrap();

        assert_eq!(value["ok"], true);
        assert_eq!(fetcher.call_count(), 2);
    }

    struct HangingFetcher;

    #[async_trait::async_trait]
    impl HttpFetcher for HangingFetcher {
        async fn get(&self, _url: &str, _timeout: Duration) -> Result<String, FetchError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(String::new())
        }
    }

    #[tokio::test]
    async fn test_hanging_mirror_is_bounded() {
        let list = endpoints(2);
        let err = MirrorPool::new("slow", &list)
            .try_mirrors(&HangingFetcher, "p", Duration::from_millis(20))
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::AllMirrorsFailed { attempts: 2, .. }));
    }
}
