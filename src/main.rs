// media-resolver CLI - resolve one URL and print the result as JSON

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use media_resolver::{MediaResolver, ResolverConfig};

#[derive(Parser)]
#[command(name = "media-resolver", version)]
#[command(about = "Resolve a video or post link into directly downloadable media options")]
struct Cli {
    /// Link to a video or post
    url: String,

    /// Config file (default: <config dir>/media-resolver/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Proxy for upstream requests, e.g. socks5://127.0.0.1:1080
    #[arg(long)]
    proxy: Option<String>,

    /// Base URL of a resolution backend
    #[arg(long)]
    backend: Option<String>,

    /// Skip the in-memory response cache
    #[arg(long)]
    no_cache: bool,

    /// Single-line JSON output
    #[arg(long)]
    compact: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("media_resolver=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = ResolverConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    if cli.proxy.is_some() {
        config = config.with_proxy(cli.proxy);
    }
    if cli.backend.is_some() {
        config = config.with_backend_url(cli.backend);
    }
    if cli.no_cache {
        config = config.with_cache_enabled(false);
    }

    let resolver = MediaResolver::new(config).context("failed to set up HTTP client")?;

    match resolver.resolve_media(&cli.url).await {
        Ok(info) => {
            let json = if cli.compact {
                serde_json::to_string(&info)?
            } else {
                serde_json::to_string_pretty(&info)?
            };
            println!("{}", json);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("{}", e.kind().suggestion());
            Ok(ExitCode::FAILURE)
        }
    }
}
