// Resolution facade - detect, extract, normalize, cache

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::cache::MediaCache;
use super::config::{ResolverConfig, Strategy};
use super::errors::{ErrorKind, ResolutionError, ResolveError};
use super::extractors::{build_extractor, BackendExtractor, MediaExtractor};
use super::format_selector::FormatSelector;
use super::http::{HttpFetcher, ReqwestFetcher};
use super::models::{MediaInfo, RawMedia};
use super::platforms::{detect, Platform, PlatformKind};

/// Entry point: turns a pasted URL into a `MediaInfo`
///
/// Safe to share between tasks behind an `Arc`; nothing but the optional
/// cache is mutated during a resolution.
pub struct MediaResolver {
    config: ResolverConfig,
    extractors: HashMap<PlatformKind, Arc<dyn MediaExtractor>>,
    backend: Option<BackendExtractor>,
    cache: Option<Arc<MediaCache>>,
}

impl MediaResolver {
    /// Resolver talking to the real upstreams through reqwest
    pub fn new(config: ResolverConfig) -> Result<Self, ResolveError> {
        let fetcher = Arc::new(ReqwestFetcher::new(&config)?);
        Ok(Self::with_fetcher(config, fetcher))
    }

    pub fn with_fetcher(config: ResolverConfig, fetcher: Arc<dyn HttpFetcher>) -> Self {
        let extractors = PlatformKind::ALL
            .iter()
            .map(|&kind| (kind, build_extractor(kind, fetcher.clone(), &config)))
            .collect();

        let backend = config
            .backend_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(|u| BackendExtractor::new(fetcher.clone(), u, config.request_timeout()));

        let cache = config.cache.enabled.then(|| {
            Arc::new(MediaCache::new(
                config.cache.capacity,
                Duration::from_secs(config.cache.ttl_secs),
            ))
        });

        Self {
            config,
            extractors,
            backend,
            cache,
        }
    }

    /// Share a cache between several resolvers
    pub fn with_cache(mut self, cache: Arc<MediaCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn without_cache(mut self) -> Self {
        self.cache = None;
        self
    }

    /// Replace the direct extractor of one platform
    pub fn with_extractor(mut self, kind: PlatformKind, extractor: Arc<dyn MediaExtractor>) -> Self {
        self.extractors.insert(kind, extractor);
        self
    }

    pub fn cache(&self) -> Option<&Arc<MediaCache>> {
        self.cache.as_ref()
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub async fn resolve_media(&self, url: &str) -> Result<MediaInfo, ResolutionError> {
        let url = url.trim();

        let platform = detect(url).ok_or_else(|| {
            debug!("[Resolver] No platform matches {:?}", url);
            ResolutionError::new(
                None,
                ResolveError::UnsupportedPlatform(format!("no supported platform matches '{}'", url)),
            )
        })?;
        let fail = |source: ResolveError| ResolutionError::new(Some(platform.kind), source);

        let extractor = self.extractors.get(&platform.kind).ok_or_else(|| {
            fail(ResolveError::UnsupportedPlatform(format!(
                "no resolver registered for {}",
                platform.name()
            )))
        })?;

        let strategies = self.config.strategies_for(platform.kind);

        // The backend identifies media itself, so a platform the direct
        // extractor refuses can still go through it keyed by URL.
        let media_id = match extractor.media_id(url) {
            Ok(id) => id,
            Err(e) if e.kind() == ErrorKind::UnsupportedPlatform && self.backend_enabled(&strategies) => {
                url.to_string()
            }
            Err(e) => return Err(fail(e)),
        };

        let cache_key = MediaCache::key(platform.name(), &media_id);
        if let Some(cache) = &self.cache {
            if let Some(info) = cache.get(&cache_key) {
                info!("[Resolver] Cache hit for {}", cache_key);
                return Ok(info);
            }
        }

        let deadline = self.config.request_timeout();
        let run = self.run_strategies(platform, extractor.as_ref(), &strategies, url, &media_id);
        let raw = match tokio::time::timeout(deadline, run).await {
            Ok(result) => result.map_err(fail)?,
            Err(_) => {
                warn!("[Resolver] {} did not resolve within {:?}", cache_key, deadline);
                return Err(fail(ResolveError::Timeout(deadline)));
            }
        };

        let info = FormatSelector::finalize(platform, url, raw).map_err(fail)?;

        if let Some(cache) = &self.cache {
            cache.insert(cache_key, info.clone());
        }
        info!(
            "[Resolver] ✓ {} resolved with {} option(s)",
            platform.name(),
            info.download_options.len()
        );
        Ok(info)
    }

    fn backend_enabled(&self, strategies: &[Strategy]) -> bool {
        self.backend.is_some() && strategies.contains(&Strategy::Backend)
    }

    /// Only an unreachable upstream or a refused platform is worth another strategy
    fn should_fall_back(error: &ResolveError) -> bool {
        matches!(
            error.kind(),
            ErrorKind::UpstreamUnavailable | ErrorKind::UnsupportedPlatform
        )
    }

    async fn run_strategies(
        &self,
        platform: &Platform,
        extractor: &dyn MediaExtractor,
        strategies: &[Strategy],
        url: &str,
        media_id: &str,
    ) -> Result<RawMedia, ResolveError> {
        let mut last_error = None;

        for strategy in strategies {
            let attempt = match strategy {
                Strategy::Backend => match &self.backend {
                    Some(backend) => {
                        info!("[Resolver] Trying backend for {}", platform.name());
                        backend.extract(url, url).await
                    }
                    None => {
                        warn!(
                            "[Resolver] Backend strategy listed for {} but no backend_url is set, skipping",
                            platform.name()
                        );
                        continue;
                    }
                },
                Strategy::Direct => {
                    info!("[Resolver] Trying {} directly", extractor.name());
                    extractor.extract(url, media_id).await
                }
            };

            match attempt {
                Ok(raw) => return Ok(raw),
                Err(e) if Self::should_fall_back(&e) => {
                    warn!("[Resolver] ✗ {:?} failed for {}: {}", strategy, platform.name(), e);
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or_else(|| {
            ResolveError::UnsupportedPlatform(format!("no usable strategy for {}", platform.name()))
        }))
    }
}
