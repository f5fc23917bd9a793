//! Cycloops command-line host.
//!
//! # Responsibility
//! - Drive the core note flows (add, list, export) from a terminal.
//! - Provide the host-side list surface and geolocation source.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cycloops_core::{
    export_to_dir, init_logging, AppConfig, AppState, Coordinates, FixedLocation,
    GeolocationProvider, IntersectionObserver, ListEntry, ListReactor, ListSurface,
    LiveNoteStore, NoLocation, NoteId, NoteService, Runtime, StoreBridge, VisibilityTracker,
};
use futures::executor::block_on;
use std::path::PathBuf;
use std::rc::Rc;

#[derive(Parser)]
#[command(name = "cycloops")]
#[command(about = "Offline notebook of location-tagged notes")]
struct Cli {
    /// Directory holding the note database and logs
    #[arg(long, env = "CYCLOOPS_DATA_DIR", default_value = ".cycloops")]
    data_dir: PathBuf,

    /// trace|debug|info|warn|error
    #[arg(long, env = "CYCLOOPS_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a note stamped with the current time
    Add {
        /// Note text (may be empty)
        #[arg(default_value = "")]
        text: String,

        /// Latitude in decimal degrees
        #[arg(long, requires = "lon", allow_negative_numbers = true)]
        lat: Option<f64>,

        /// Longitude in decimal degrees
        #[arg(long, requires = "lat", allow_negative_numbers = true)]
        lon: Option<f64>,
    },

    /// Print notes newest first with time and distance between them
    List,

    /// Write every note as GeoJSON
    Export {
        /// Output directory
        #[arg(short, long, default_value = ".")]
        out: PathBuf,
    },
}

/// Prints the rendered rows once the reactor has built them.
struct StdoutList;

impl ListSurface for StdoutList {
    fn replace_all(&self, entries: &[ListEntry]) {
        for entry in entries {
            match entry {
                ListEntry::Note { id, text } => println!("#{id} {text}"),
                ListEntry::Delta(delta) => println!("    {}", delta.label),
            }
        }
    }
}

/// A terminal has no viewport; nothing is ever observed.
struct NoViewport;

impl IntersectionObserver for NoViewport {
    fn observe(&self, _id: NoteId) {}

    fn unobserve(&self, _id: NoteId) {}
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::from_data_dir(&cli.data_dir)?;
    if let Some(level) = cli.log_level.as_deref() {
        config = config.with_log_level(level)?;
    }
    init_logging(config.log_level, &config.log_dir).map_err(anyhow::Error::msg)?;

    let store = Rc::new(
        LiveNoteStore::open(&config.db_path)
            .with_context(|| format!("opening {}", config.db_path.display()))?,
    );

    match cli.command {
        Commands::Add { text, lat, lon } => match lat.zip(lon) {
            Some((lat, lon)) => add_note(store, FixedLocation(Coordinates::new(lat, lon)), text),
            None => add_note(store, NoLocation, text),
        },
        Commands::List => {
            list_notes(store);
            Ok(())
        }
        Commands::Export { out } => {
            let path = export_to_dir(&store, &out)?;
            println!("exported {}", path.display());
            Ok(())
        }
    }
}

fn add_note<G: GeolocationProvider>(
    store: Rc<LiveNoteStore>,
    geolocation: G,
    text: String,
) -> Result<()> {
    let runtime = Runtime::new();
    let (_state, writers) = AppState::new(&runtime);
    let service = NoteService::new(store, geolocation, writers.submitting);
    service.set_draft(text);
    let id = block_on(service.submit())?;
    println!("added #{id}");
    Ok(())
}

fn list_notes(store: Rc<LiveNoteStore>) {
    let runtime = Runtime::new();
    let (state, writers) = AppState::new(&runtime);
    let tracker = Rc::new(VisibilityTracker::new(NoViewport, writers.visible));
    // Mount before connecting so the render effect sees the first delivery.
    let _list = ListReactor::mount(&runtime, &state, tracker, Rc::new(StdoutList));
    let _bridge = StoreBridge::connect(store, writers.notes);
    if state.notes.get_untracked().is_empty() {
        println!("no notes yet");
    }
}
