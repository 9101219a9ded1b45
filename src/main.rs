use tracing_subscriber::EnvFilter;

mod client;
mod config;
mod game;
mod protocol;
mod relay;
mod transport;

use config::{Config, Mode};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // The client owns stdout for the board, so logs go to stderr.
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .with_writer(std::io::stderr)
    .init();

  let config = Config::from_env()?;
  tracing::debug!(?config, "loaded configuration");

  match config.mode {
    Mode::Relay => relay::run_relay_mode(&config).await,
    Mode::Client => client::run_client_mode(&config).await,
  }
}
