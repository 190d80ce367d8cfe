mod cache;
mod config;
mod placeholder;
mod server;

use clap::Parser;
use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "placeholderd")]
#[command(about = "A caching REST gateway in front of the JSONPlaceholder demo API")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/placeholderd/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Address to listen on, overriding the config file
  #[arg(short, long)]
  bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("placeholderd=info")),
    )
    .init();

  let args = Args::parse();

  // Load configuration
  let mut config = config::Config::load(args.config.as_deref())?;

  // Override bind address if specified on command line
  if let Some(bind) = args.bind {
    config.server.bind = bind;
  }

  if config.cache.enabled {
    info!("response cache enabled, ttl {}s", config.cache.ttl_secs);
    let storage = cache::SqliteStorage::open(config.cache.path.as_deref())?;
    serve(config, storage).await
  } else {
    info!("response cache disabled");
    serve(config, cache::NoopStorage).await
  }
}

async fn serve<S: cache::CacheStorage + 'static>(config: config::Config, storage: S) -> Result<()> {
  let fetcher = placeholder::CachedPlaceholderClient::new(&config, storage)?;
  let app = server::router(&config.server, server::AppState::new(fetcher));

  let listener = tokio::net::TcpListener::bind(&config.server.bind)
    .await
    .map_err(|e| eyre!("Failed to bind {}: {}", config.server.bind, e))?;
  info!("listening on http://{}", listener.local_addr()?);

  axum::serve(listener, app.into_make_service())
    .await
    .map_err(|e| eyre!("Server error: {}", e))?;

  Ok(())
}
