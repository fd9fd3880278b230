// HTTP access for extractors
//
// Every upstream call goes through `HttpFetcher`, so the reqwest client can
// be swapped for a recording fake in tests.

use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

use super::config::ResolverConfig;
use super::errors::FetchError;

/// Minimal GET-only HTTP client used by every extractor
#[async_trait]
pub trait HttpFetcher: Send + Sync {
    /// GET `url` and return the body of a 2xx response
    async fn get(&self, url: &str, timeout: Duration) -> Result<String, FetchError>;
}

/// `HttpFetcher` backed by a shared reqwest client
pub struct ReqwestFetcher {
    client: reqwest::Client,
}

impl ReqwestFetcher {
    pub fn new(config: &ResolverConfig) -> Result<Self, FetchError> {
        let mut builder = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .connect_timeout(config.mirror_timeout());

        if let Some(proxy_url) = config.proxy.as_deref() {
            match reqwest::Proxy::all(proxy_url) {
                Ok(proxy) => {
                    debug!("[Http] Using proxy: {}", proxy_url);
                    builder = builder.proxy(proxy);
                }
                Err(e) => {
                    // Direct connection still works for most upstreams
                    warn!("[Http] Invalid proxy URL {}: {}", proxy_url, e);
                }
            }
        }

        let client = builder
            .build()
            .map_err(|e| FetchError::Connection(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpFetcher for ReqwestFetcher {
    async fn get(&self, url: &str, timeout: Duration) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .timeout(timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        response.text().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout
            } else {
                FetchError::Body(e.to_string())
            }
        })
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashMap;

    /// Serves canned responses by exact URL and records every request
    #[derive(Default)]
    pub struct MockFetcher {
        responses: Mutex<HashMap<String, Result<String, FetchError>>>,
        calls: Mutex<Vec<String>>,
    }

    impl MockFetcher {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn ok(self, url: &str, body: &str) -> Self {
            self.responses
                .lock()
                .insert(url.to_string(), Ok(body.to_string()));
            self
        }

        pub fn fail(self, url: &str, error: FetchError) -> Self {
            self.responses.lock().insert(url.to_string(), Err(error));
            self
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().clone()
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().len()
        }
    }

    #[async_trait]
    impl HttpFetcher for MockFetcher {
        async fn get(&self, url: &str, _timeout: Duration) -> Result<String, FetchError> {
            self.calls.lock().push(url.to_string());
            self.responses
                .lock()
                .get(url)
                .cloned()
                .unwrap_or_else(|| Err(FetchError::Connection(format!("no route to {}", url))))
        }
    }
}
