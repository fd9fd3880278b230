// Resolver module - URL in, ranked downloadable media out

pub mod errors;
pub mod platforms;
pub mod models;
pub mod format_selector;
pub mod config;
pub mod http;
pub mod mirrors;
pub mod cache;
pub mod extractors;
pub mod orchestrator;

pub use cache::MediaCache;
pub use config::{CacheConfig, ConfigError, ResolverConfig, Strategy};
pub use errors::{ErrorKind, FetchError, ResolutionError, ResolveError};
pub use extractors::MediaExtractor;
pub use format_selector::FormatSelector;
pub use http::{HttpFetcher, ReqwestFetcher};
pub use models::{DownloadOption, MediaInfo};
pub use orchestrator::MediaResolver;
pub use platforms::{detect, Platform, PlatformKind};
