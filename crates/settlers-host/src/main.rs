//! Settlers game host: JSON-lines requests on stdin, responses on stdout.

use settlers_host::{server, GameHost, HostConfig, InMemoryGameStore};
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = HostConfig::from_env()?;

    // Logs go to stderr; stdout carries protocol only
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.log_filter))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!(
        option_ttl_secs = config.option_ttl.as_secs(),
        idle_game_secs = config.idle_game_timeout.as_secs(),
        option_limit = config.option_limit,
        "Starting settlers host..."
    );

    let host = GameHost::new(InMemoryGameStore::new(), config);
    let input = BufReader::new(tokio::io::stdin());

    tokio::select! {
        result = server::run(&host, input, tokio::io::stdout()) => result,
        _ = tokio::signal::ctrl_c() => {
            info!("interrupted, shutting down");
            Ok(())
        }
    }
}
