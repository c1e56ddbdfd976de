//! # Media Organizer - Main Entry Point
//!
//! Questo è il punto di ingresso principale dell'applicazione.
//!
//! ## Responsabilità:
//! - Parsing degli argomenti della command line con `clap`
//! - Inizializzazione del sistema di logging con `tracing`
//! - Costruzione della configurazione (file JSON + override da CLI)
//! - Avvio dell'organizer o della pulizia metadati
//!
//! ## Flusso di esecuzione (`organize`):
//! 1. Parsa gli argomenti CLI
//! 2. Configura il logging (INFO o DEBUG, su stderr in modalità JSON)
//! 3. Carica l'eventuale file di configurazione e applica gli override
//! 4. Collega Ctrl-C al canale di cancellazione
//! 5. Esegue la run e stampa il riepilogo
//!
//! ## Esempio di utilizzo:
//! ```bash
//! media-organizer organize ~/Downloads/dump /archive --max-per-folder 1000 --strip-metadata --workers 8
//! media-organizer strip /archive/0003 --extensions .jpg,.png --no-recursive
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use media_organizer::{
    json_output::{JsonMessage, JsonReporter},
    progress::ProgressManager,
    DirectorySanitizer, FileOrganizer, OrganizerConfig, ProgressObserver, SanitizeOptions,
};

#[derive(Parser)]
#[command(name = "media-organizer")]
#[command(about = "Move files into numbered, capacity-bounded folders and remove their metadata")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Emit one JSON event per line on stdout
    #[arg(long, global = true)]
    json: bool,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Number and move every file of SOURCE into DESTINATION/NNNN/MMMMMM.ext
    Organize {
        /// Directory holding the files to ingest (not recursive)
        source: PathBuf,

        /// Root of the numbered folders
        destination: PathBuf,

        /// Maximum number of files per folder
        #[arg(short, long)]
        max_per_folder: Option<usize>,

        /// First identity to assign (default: continue from DESTINATION)
        #[arg(short, long)]
        start: Option<u64>,

        /// Remove EXIF/XMP/ICC and PDF document info after moving
        #[arg(long)]
        strip_metadata: bool,

        /// Reset file timestamps to the Unix epoch after moving
        #[arg(long)]
        wipe_timestamps: bool,

        /// Number of parallel workers
        #[arg(short, long)]
        workers: Option<usize>,

        /// Load settings from a JSON file (command line flags win)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Save the effective settings to a JSON file
        #[arg(long)]
        save_config: Option<PathBuf>,
    },

    /// Remove metadata in place from the files of a directory
    Strip {
        directory: PathBuf,

        /// Only the top level of DIRECTORY
        #[arg(long)]
        no_recursive: bool,

        /// Extensions to process, comma separated (default: all supported)
        #[arg(short, long, value_delimiter = ',')]
        extensions: Vec<String>,

        /// Number of parallel workers
        #[arg(short, long)]
        workers: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose, args.json)?;

    let outcome = match args.command {
        Command::Organize {
            source,
            destination,
            max_per_folder,
            start,
            strip_metadata,
            wipe_timestamps,
            workers,
            config,
            save_config,
        } => {
            let mut settings = match config {
                Some(ref path) => OrganizerConfig::from_file(path)
                    .await
                    .with_context(|| format!("Failed to load config {}", path.display()))?,
                None => OrganizerConfig::default(),
            };
            settings.source_dir = source;
            settings.destination_dir = destination;
            if let Some(max) = max_per_folder {
                settings.max_files_per_folder = max;
            }
            if start.is_some() {
                settings.start_identity = start;
            }
            settings.strip_metadata |= strip_metadata;
            settings.wipe_timestamps |= wipe_timestamps;
            if let Some(workers) = workers {
                settings.workers = workers;
            }

            if let Some(ref path) = save_config {
                settings
                    .save_to_file(path)
                    .await
                    .with_context(|| format!("Failed to save config {}", path.display()))?;
                info!("Configuration saved to {}", path.display());
            }

            organize(settings, args.json).await
        }
        Command::Strip {
            directory,
            no_recursive,
            extensions,
            workers,
        } => {
            let mut options = SanitizeOptions {
                recursive: !no_recursive,
                extensions,
                ..Default::default()
            };
            if let Some(workers) = workers {
                options.workers = workers;
            }
            strip(&directory, options, args.json).await
        }
    };

    if let Err(ref e) = outcome {
        if args.json {
            JsonMessage::error(e.to_string(), e.chain().nth(1).map(|s| s.to_string())).emit();
        }
    }
    outcome
}

fn init_logging(verbose: bool, json: bool) -> Result<()> {
    let builder = tracing_subscriber::fmt().with_max_level(if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    });

    // In modalità JSON stdout è riservato agli eventi
    if json {
        tracing::subscriber::set_global_default(builder.with_writer(std::io::stderr).finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}

async fn organize(config: OrganizerConfig, json: bool) -> Result<()> {
    let observer: Arc<dyn ProgressObserver> = if json {
        Arc::new(JsonReporter::new(&config))
    } else {
        Arc::new(ProgressManager::new(0))
    };

    let (stop_sender, stop_receiver) = FileOrganizer::create_cancellation_channel(1);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, waiting for in-flight files to finish");
            let _ = stop_sender.send(());
        }
    });

    let mut organizer =
        FileOrganizer::new_with_cancellation(config, stop_receiver)?.with_observer(observer);
    // Il riepilogo finale arriva dall'observer
    organizer.run().await?;
    Ok(())
}

async fn strip(directory: &Path, options: SanitizeOptions, json: bool) -> Result<()> {
    let stats = DirectorySanitizer::new(options).run(directory).await?;

    if json {
        JsonMessage::sanitize_complete(directory.to_path_buf(), &stats).emit();
    } else {
        println!("{}", stats.format_summary());
    }
    Ok(())
}
