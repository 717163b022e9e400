use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "discstats")]
#[command(about = "Store and inspect disc golf scorecard exports", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Data directory (overrides `data_root` from the config file)
    #[arg(long, global = true, env = "DISCSTATS_ROOT")]
    pub root: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the catalog and uploads directory
    Init,

    /// Store a scorecard CSV export
    Import {
        /// Path to the CSV file
        path: PathBuf,

        /// Filename to record instead of the file's own name
        #[arg(long)]
        name: Option<String>,
    },

    /// List stored uploads, most recent first
    List {
        /// Print records as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show an upload and preview its rounds
    Show {
        /// Upload ID
        id: i64,

        /// Number of rows to preview (default from config: 5)
        #[arg(long)]
        rows: Option<usize>,
    },

    /// Write the originally uploaded bytes to stdout
    Raw {
        /// Upload ID
        id: i64,
    },
}
