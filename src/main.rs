use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use favicon_resolver::{
    config::Config,
    services::{FaviconResolver, ResultCache},
    web::WebServer,
};

#[derive(Parser)]
#[command(name = "favicon-resolver")]
#[command(version)]
#[command(about = "Favicon resolution service with letter-avatar fallback")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Listening IP address
    #[arg(short = 'H', long, value_name = "IP")]
    host: Option<String>,

    /// Listening port
    #[arg(short, long, value_name = "PORT")]
    port: Option<u16>,

    /// Log level
    #[arg(short = 'v', long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging with specified level
    let log_filter = if cli.log_level == "trace" {
        format!("favicon_resolver={},tower_http=trace", cli.log_level)
    } else {
        format!("favicon_resolver={}", cli.log_level)
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Favicon Resolver v{}", env!("CARGO_PKG_VERSION"));

    let mut config = Config::load_from_file(&cli.config)?;
    info!("Configuration loaded from: {}", cli.config);

    // Override config with CLI arguments
    if let Some(host) = cli.host {
        config.web.host = host;
    }
    if let Some(port) = cli.port {
        config.web.port = port;
    }

    let resolver = FaviconResolver::builder(config.resolver.clone())
        .cache(ResultCache::from_config(&config.cache))
        .build()?;
    info!(
        "Resolver ready: fetch timeout {:?}, cache capacity {}, {} aggregators",
        config.resolver.fetch_timeout,
        config.cache.capacity,
        config.resolver.aggregators.len()
    );

    let web_server = WebServer::new(config, Arc::new(resolver))?;

    info!(
        "Starting web server on {}:{}",
        web_server.host(),
        web_server.port()
    );
    let (ready_tx, ready_rx) = tokio::sync::oneshot::channel();
    let server = tokio::spawn(web_server.serve_with_signal(ready_tx));
    if let Ok(Ok(())) = ready_rx.await {
        info!("Web server listening");
    }

    server.await??;
    info!("Favicon Resolver stopped");
    Ok(())
}
