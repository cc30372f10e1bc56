use clap::Parser;

pub mod backend;
pub mod certificate;
pub mod cli;
pub mod config;
pub mod models;

pub use crate::config::AppConfig;

pub async fn run() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Loads `.env` first so clap's `env` fallbacks see it.
    let config = AppConfig::from_env()?;
    let cli = cli::Cli::parse();

    cli::execute(cli, config).await
}
