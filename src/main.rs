//! Task store command line.
//!
//! Thin wrapper over [`taskstore::engine::Engine`] for inspecting and
//! maintaining a store from the shell. The library is the primary
//! interface; this binary covers the operational commands.

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use tracing::debug;

use taskstore::config::Config;
use taskstore::engine::{Engine, Envelope};
use taskstore::logging;

#[derive(Parser)]
#[command(name = "taskstore", version, about = "Local-first task and project store")]
struct Cli {
    /// Path to the SQLite database file.
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    /// Enable debug logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print aggregate task statistics.
    Stats,
    /// Check store integrity and report the schema version.
    Health,
    /// Full-text search across tasks.
    Search {
        query: String,
        /// Maximum number of results.
        #[arg(long)]
        limit: Option<i64>,
    },
    /// List tasks past their due date.
    Overdue,
    /// Compact the database file.
    Vacuum,
    /// Refresh query planner statistics.
    Analyze,
    /// Print the schema version of the store.
    SchemaVersion,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose)?;

    let db_path = match cli.database {
        Some(path) => path,
        None => {
            let config = Config::load_or_default();
            config.ensure_data_dir()?;
            config.db_path()
        }
    };
    debug!(path = %db_path.display(), "opening store");
    let engine = Engine::open(&db_path)?;

    match cli.command {
        Command::Stats => render(engine.statistics()),
        Command::Health => render(engine.health_check()),
        Command::Search { query, limit } => render(engine.search_tasks(&query, limit)),
        Command::Overdue => render(engine.tasks_overdue()),
        Command::Vacuum => render(engine.vacuum()),
        Command::Analyze => render(engine.analyze()),
        Command::SchemaVersion => render(engine.schema_version()),
    }
}

/// Print the payload of a successful envelope as pretty JSON, or fail
/// with its error message.
fn render<T: Serialize>(envelope: Envelope<T>) -> Result<()> {
    if !envelope.success {
        bail!(
            envelope
                .error
                .unwrap_or_else(|| "operation failed".to_string())
        );
    }
    if let Some(data) = envelope.data {
        println!("{}", serde_json::to_string_pretty(&data)?);
    }
    Ok(())
}
