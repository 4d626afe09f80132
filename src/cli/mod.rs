use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, EnvFilter};

use crate::app::Session;
use crate::config::themes::system_prefers_dark;
use crate::config::{AppConfig, ConfigLoader};
use crate::highlight::HighlightMarker;
use crate::notes::SystemClock;
use crate::storage::{KeyValueStore, MemoryStore, NoteGateway, SqliteStore};

pub mod commands;

use self::commands::{AddArgs, EditArgs, ListArgs, PositionArgs, ThemeArgs};

#[derive(Parser, Debug)]
#[command(
    name = "scribbly",
    version,
    about = "Pinned, searchable notes kept in local storage"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Override the config file location (takes precedence over SCRIBBLY_CONFIG)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override the data directory (takes precedence over SCRIBBLY_DATA)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Minimum log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Add a note
    Add(AddArgs),
    /// List notes, optionally filtered by a search query
    List(ListArgs),
    /// Replace the text of the note at a list position
    Edit(EditArgs),
    /// Pin the note at a list position
    Pin(PositionArgs),
    /// Unpin the note at a list position
    Unpin(PositionArgs),
    /// Delete the note at a list position
    Delete(PositionArgs),
    /// Show or toggle the colour theme
    Theme(ThemeArgs),
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = &cli.config {
        env::set_var("SCRIBBLY_CONFIG", path);
    }
    if let Some(path) = &cli.data_dir {
        env::set_var("SCRIBBLY_DATA", path);
    }

    init_tracing(&cli.log_level)
        .with_context(|| format!("initialising logging at level {}", cli.log_level))?;
    let loader = ConfigLoader::discover()?;
    let config = loader.load_or_init()?;

    let mut session = open_session(&config);
    if atty::is(atty::Stream::Stdout) {
        session = session.with_marker(HighlightMarker::ansi());
    }

    let result = match cli.command {
        Commands::Add(args) => commands::add(&mut session, args),
        Commands::List(args) => commands::list(&mut session, args),
        Commands::Edit(args) => commands::edit(&mut session, args),
        Commands::Pin(args) => commands::set_pinned(&mut session, args, true),
        Commands::Unpin(args) => commands::set_pinned(&mut session, args, false),
        Commands::Delete(args) => commands::delete(&mut session, args),
        Commands::Theme(args) => commands::theme(&mut session, args),
    };
    for message in session.toasts_mut().drain() {
        eprintln!("{message}");
    }
    result
}

/// Falls back to an in-memory store when the database can't be opened, so a
/// broken data directory never blocks the session.
pub fn open_session(config: &AppConfig) -> Session {
    let store: Box<dyn KeyValueStore> =
        match SqliteStore::open(&config.storage.database_path, &config.storage) {
            Ok(store) => Box::new(store),
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    path = %config.storage.database_path.display(),
                    "could not open note storage; changes will not persist"
                );
                Box::new(MemoryStore::new())
            }
        };
    let gateway = NoteGateway::from_options(store, &config.storage);
    Session::open(
        config,
        gateway,
        Arc::new(SystemClock),
        system_prefers_dark(config.prefer_dark),
    )
}

fn init_tracing(level: &str) -> Result<()> {
    static INIT: OnceCell<()> = OnceCell::new();
    INIT.get_or_try_init(|| {
        let env_filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"));
        fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .try_init()
            .map_err(|err| anyhow::anyhow!(err))
    })
    .map(|_| ())
}
