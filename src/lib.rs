pub mod resolver;

pub use resolver::{
    detect, ErrorKind, MediaInfo, MediaResolver, PlatformKind, ResolutionError, ResolverConfig,
};
