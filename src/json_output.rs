//! # JSON Output Module
//!
//! Output strutturato in JSON (una riga per evento su stdout) per chi pilota il binario
//! da un altro processo.
//!
//! ## Tipi di messaggi:
//! - `start`: Inizio della run con la configurazione effettiva
//! - `file_complete`: Esito di un singolo file
//! - `progress`: Contatori correnti dopo ogni file
//! - `complete`: Statistiche finali
//! - `sanitize_complete`: Statistiche finali del comando `strip`
//! - `error`: Errore fatale

use crate::{
    config::OrganizerConfig,
    organizer::{ProcessingResult, ProgressObserver},
    progress::Statistics,
    sanitizer::SanitizeStats,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Tipo di messaggio JSON
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum JsonMessage {
    #[serde(rename = "start")]
    Start {
        source_dir: PathBuf,
        destination_dir: PathBuf,
        total_files: usize,
        config: JsonConfig,
    },

    #[serde(rename = "file_complete")]
    FileComplete {
        path: PathBuf,
        identity: u64,
        destination: Option<PathBuf>,
        metadata_stripped: bool,
        timestamps_wiped: bool,
        success: bool,
        error: Option<String>,
    },

    #[serde(rename = "progress")]
    Progress {
        current: usize,
        total: usize,
        percentage: f64,
        succeeded: usize,
        failed: usize,
    },

    #[serde(rename = "complete")]
    Complete {
        total_scanned: usize,
        dispatched: usize,
        succeeded: usize,
        failed: usize,
        metadata_stripped: usize,
        timestamps_wiped: usize,
        folders_created: usize,
        duration_seconds: f64,
        cancelled: bool,
    },

    #[serde(rename = "sanitize_complete")]
    SanitizeComplete {
        directory: PathBuf,
        total_files: usize,
        stripped: usize,
        skipped: usize,
        errors: usize,
    },

    #[serde(rename = "error")]
    Error {
        message: String,
        details: Option<String>,
    },
}

/// Configurazione per output JSON
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonConfig {
    pub max_files_per_folder: usize,
    pub start_identity: Option<u64>,
    pub strip_metadata: bool,
    pub wipe_timestamps: bool,
    pub workers: usize,
}

impl From<&OrganizerConfig> for JsonConfig {
    fn from(config: &OrganizerConfig) -> Self {
        Self {
            max_files_per_folder: config.max_files_per_folder,
            start_identity: config.start_identity,
            strip_metadata: config.strip_metadata,
            wipe_timestamps: config.wipe_timestamps,
            workers: config.workers,
        }
    }
}

impl JsonMessage {
    /// Emette il messaggio JSON su stdout
    pub fn emit(&self) {
        if let Ok(json) = serde_json::to_string(self) {
            println!("{}", json);
        }
    }

    pub fn start(config: &OrganizerConfig, total_files: usize) -> Self {
        Self::Start {
            source_dir: config.source_dir.clone(),
            destination_dir: config.destination_dir.clone(),
            total_files,
            config: JsonConfig::from(config),
        }
    }

    pub fn file_complete(result: &ProcessingResult) -> Self {
        Self::FileComplete {
            path: result.source.clone(),
            identity: result.identity,
            destination: result.destination.clone(),
            metadata_stripped: result.metadata_stripped,
            timestamps_wiped: result.timestamps_wiped,
            success: result.success,
            error: result.error.clone(),
        }
    }

    pub fn progress(current: usize, total: usize, succeeded: usize, failed: usize) -> Self {
        let percentage = if total > 0 {
            (current as f64 / total as f64) * 100.0
        } else {
            0.0
        };
        Self::Progress {
            current,
            total,
            percentage,
            succeeded,
            failed,
        }
    }

    pub fn complete(statistics: &Statistics) -> Self {
        Self::Complete {
            total_scanned: statistics.total_scanned,
            dispatched: statistics.dispatched,
            succeeded: statistics.succeeded,
            failed: statistics.failed,
            metadata_stripped: statistics.metadata_stripped,
            timestamps_wiped: statistics.timestamps_wiped,
            folders_created: statistics.folders_created,
            duration_seconds: statistics.elapsed.as_secs_f64(),
            cancelled: statistics.cancelled,
        }
    }

    pub fn sanitize_complete(directory: PathBuf, stats: &SanitizeStats) -> Self {
        Self::SanitizeComplete {
            directory,
            total_files: stats.total_files,
            stripped: stats.stripped,
            skipped: stats.skipped,
            errors: stats.errors,
        }
    }

    pub fn error(message: String, details: Option<String>) -> Self {
        Self::Error { message, details }
    }
}

/// Observer che traduce gli eventi della run in righe JSON
pub struct JsonReporter {
    config: OrganizerConfig,
    succeeded: AtomicUsize,
    failed: AtomicUsize,
}

impl JsonReporter {
    pub fn new(config: &OrganizerConfig) -> Self {
        Self {
            config: config.clone(),
            succeeded: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
        }
    }
}

impl ProgressObserver for JsonReporter {
    fn on_start(&self, total: usize) {
        JsonMessage::start(&self.config, total).emit();
    }

    fn on_file_complete(&self, result: &ProcessingResult, completed: usize, total: usize) {
        if result.success {
            self.succeeded.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed.fetch_add(1, Ordering::Relaxed);
        }
        JsonMessage::file_complete(result).emit();
        JsonMessage::progress(
            completed,
            total,
            self.succeeded.load(Ordering::Relaxed),
            self.failed.load(Ordering::Relaxed),
        )
        .emit();
    }

    fn on_finish(&self, statistics: &Statistics) {
        JsonMessage::complete(statistics).emit();
    }
}
