mod cli;
mod commands;
mod ingest;

use anyhow::Result;
use clap::Parser;
use discstats_config::Config;
use discstats_storage::{StoreLayout, UploadStore};
use tracing::debug;

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; `raw` writes data to stdout
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = cli::Cli::parse();
    let config = Config::load()?;

    let root = cli.root.unwrap_or(config.data_root);
    debug!(root = %root.display(), "using data root");
    let store = UploadStore::new(StoreLayout::new(root));

    match cli.command {
        cli::Commands::Init => commands::init::handle(&store).await,
        cli::Commands::Import { path, name } => commands::import::handle(&store, path, name).await,
        cli::Commands::List { json } => commands::list::handle(&store, json).await,
        cli::Commands::Show { id, rows } => {
            commands::show::handle(&store, id, rows.unwrap_or(config.preview.rows)).await
        }
        cli::Commands::Raw { id } => commands::raw::handle(&store, id).await,
    }
}
