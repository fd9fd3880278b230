// Resolver configuration
//
// Loaded once at startup from TOML; everything here is static for the
// lifetime of a `MediaResolver`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use super::platforms::PlatformKind;

pub const ENV_PROXY: &str = "MEDIA_RESOLVER_PROXY";
pub const ENV_BACKEND: &str = "MEDIA_RESOLVER_BACKEND";

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// One way of resolving a URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Ask the configured backend service for the finished record
    Backend,
    /// Call the platform's public upstream(s) directly
    Direct,
}

/// Response cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    pub ttl_secs: u64,
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: 300,
            capacity: 128,
        }
    }
}

/// Configuration for media resolution
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Deadline for a whole resolution, all upstream calls included
    pub request_timeout_secs: u64,
    /// Deadline for one request to one mirror or upstream
    pub mirror_timeout_secs: u64,
    /// SOCKS5/HTTP proxy URL (e.g. "socks5://127.0.0.1:1080")
    pub proxy: Option<String>,
    pub user_agent: String,
    /// Base URL of an optional resolution backend
    pub backend_url: Option<String>,
    pub piped_instances: Vec<String>,
    pub invidious_instances: Vec<String>,
    pub fxtwitter_instances: Vec<String>,
    pub tikwm_endpoint: String,
    /// Ordered strategies keyed by lowercase platform name; platforms not
    /// listed use `[direct]`
    pub strategies: HashMap<String, Vec<Strategy>>,
    pub cache: CacheConfig,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 20,
            // every default YouTube mirror must fit inside the overall deadline
            mirror_timeout_secs: 2,
            proxy: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            backend_url: None,
            piped_instances: vec![
                "https://pipedapi.kavin.rocks".to_string(),
                "https://pipedapi.adminforge.de".to_string(),
                "https://api.piped.private.coffee".to_string(),
                "https://pipedapi.r4fo.com".to_string(),
            ],
            invidious_instances: vec![
                "https://inv.nadeko.net".to_string(),
                "https://invidious.nerdvpn.de".to_string(),
                "https://yewtu.be".to_string(),
            ],
            fxtwitter_instances: vec![
                "https://api.fxtwitter.com".to_string(),
                "https://api.fixupx.com".to_string(),
            ],
            tikwm_endpoint: "https://www.tikwm.com".to_string(),
            strategies: HashMap::new(),
            cache: CacheConfig::default(),
        }
    }
}

impl ResolverConfig {
    pub fn with_proxy(mut self, proxy: Option<String>) -> Self {
        self.proxy = proxy;
        self
    }

    pub fn with_backend_url(mut self, url: Option<String>) -> Self {
        self.backend_url = url;
        self
    }

    pub fn with_timeouts(mut self, request_secs: u64, mirror_secs: u64) -> Self {
        self.request_timeout_secs = request_secs;
        self.mirror_timeout_secs = mirror_secs;
        self
    }

    pub fn with_strategies(mut self, platform: PlatformKind, strategies: Vec<Strategy>) -> Self {
        self.strategies.insert(Self::strategy_key(platform), strategies);
        self
    }

    pub fn with_cache_enabled(mut self, enabled: bool) -> Self {
        self.cache.enabled = enabled;
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn mirror_timeout(&self) -> Duration {
        Duration::from_secs(self.mirror_timeout_secs.max(1))
    }

    /// Strategies for a platform, in the order they should be tried
    pub fn strategies_for(&self, platform: PlatformKind) -> Vec<Strategy> {
        match self.strategies.get(&Self::strategy_key(platform)) {
            Some(list) if !list.is_empty() => list.clone(),
            _ => vec![Strategy::Direct],
        }
    }

    fn strategy_key(platform: PlatformKind) -> String {
        platform.name().to_lowercase()
    }

    /// Default config file location (`<config dir>/media-resolver/config.toml`)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("media-resolver").join("config.toml"))
    }

    pub fn from_toml_str(content: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load from `path`, or from the default location when it exists, or
    /// fall back to defaults; environment overrides are applied last.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let candidate = match path {
            Some(p) => Some(p.to_path_buf()),
            None => Self::default_path().filter(|p| p.exists()),
        };

        let config = match candidate {
            Some(path) => {
                let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
                    path: path.clone(),
                    source,
                })?;
                info!("[Config] Loaded {}", path.display());
                Self::from_toml_str(&content, &path)?
            }
            None => {
                debug!("[Config] No config file, using defaults");
                Self::default()
            }
        };

        Ok(config.apply_env())
    }

    fn apply_env(self) -> Self {
        self.apply_overrides(
            std::env::var(ENV_PROXY).ok(),
            std::env::var(ENV_BACKEND).ok(),
        )
    }

    fn apply_overrides(mut self, proxy: Option<String>, backend: Option<String>) -> Self {
        if let Some(proxy) = proxy.filter(|p| !p.trim().is_empty()) {
            self.proxy = Some(proxy);
        }
        if let Some(backend) = backend.filter(|b| !b.trim().is_empty()) {
            self.backend_url = Some(backend);
        }
        self
    }
}
