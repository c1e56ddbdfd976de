//! # Progress Tracking and Statistics Module
//!
//! Questo modulo gestisce il feedback visivo e le statistiche di una run.
//!
//! ## Responsabilità:
//! - Progress bar visual con `indicatif` per feedback real-time (solo CLI)
//! - Statistiche aggregate della run (`Statistics`)
//! - Riepilogo testuale finale
//!
//! ## Statistiche tracciate:
//! - **total_scanned**: File trovati nella sorgente
//! - **dispatched**: File che hanno ricevuto un'identità
//! - **succeeded** / **failed**: Esito dello spostamento
//! - **metadata_stripped**: File con metadati effettivamente rimossi
//! - **timestamps_wiped**: File con date azzerate
//! - **folders_created**: Cartelle numerate create durante la run
//! - **elapsed**: Durata complessiva
//! - **cancelled**: Run interrotta prima di esaurire la coda
//!
//! ## Visual feedback:
//! ```text
//! ⠋ [00:02:15] [========================================] 150/150 (100%) [OK] photo.jpg -> 0003/000151.jpg
//! ```

use crate::organizer::{ProcessingResult, ProgressObserver};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Manages progress reporting on the terminal
#[derive(Clone)]
pub struct ProgressManager {
    bar: ProgressBar,
}

impl ProgressManager {
    /// Create a new progress manager
    pub fn new(total_files: u64) -> Self {
        let bar = ProgressBar::new(total_files);

        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
        {
            bar.set_style(style.progress_chars("=>-"));
        }

        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// Update progress with a message
    pub fn update(&self, message: &str) {
        self.bar.inc(1);
        self.bar.set_message(message.to_string());
    }

    /// Finish with a final message
    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }
}

impl ProgressObserver for ProgressManager {
    fn on_start(&self, total: usize) {
        self.bar.set_length(total as u64);
    }

    fn on_file_complete(&self, result: &ProcessingResult, _completed: usize, _total: usize) {
        let name = result
            .source
            .file_name()
            .unwrap_or_default()
            .to_string_lossy();

        let message = match (&result.destination, &result.error) {
            (Some(destination), None) => format!("[OK] {} -> {}", name, short_destination(destination)),
            (_, Some(error)) => format!("[ERROR] {}: {}", name, error),
            (None, None) => format!("[ERROR] {}", name),
        };
        self.update(&message);
    }

    fn on_finish(&self, statistics: &Statistics) {
        self.finish(&statistics.format_summary());
    }
}

/// `NNNN/MMMMMM.ext` invece del path completo
fn short_destination(path: &std::path::Path) -> String {
    let mut parts: Vec<String> = path
        .iter()
        .rev()
        .take(2)
        .map(|part| part.to_string_lossy().into_owned())
        .collect();
    parts.reverse();
    parts.join("/")
}

/// Statistics for one organizer run
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Statistics {
    pub total_scanned: usize,
    pub dispatched: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub metadata_stripped: usize,
    pub timestamps_wiped: usize,
    pub folders_created: usize,
    pub elapsed: Duration,
    pub cancelled: bool,
}

impl Statistics {
    pub fn new(total_scanned: usize) -> Self {
        Self {
            total_scanned,
            ..Default::default()
        }
    }

    /// Aggiunge l'esito di un file
    pub fn record(&mut self, result: &ProcessingResult) {
        if result.success {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
        if result.metadata_stripped {
            self.metadata_stripped += 1;
        }
        if result.timestamps_wiped {
            self.timestamps_wiped += 1;
        }
    }

    /// File completati (con successo o meno)
    pub fn completed(&self) -> usize {
        self.succeeded + self.failed
    }

    pub fn format_summary(&self) -> String {
        let mut summary = format!(
            "Scanned: {} | Moved: {} | Failed: {} | Metadata stripped: {} | Timestamps wiped: {} | Folders created: {} | {:.2}s",
            self.total_scanned,
            self.succeeded,
            self.failed,
            self.metadata_stripped,
            self.timestamps_wiped,
            self.folders_created,
            self.elapsed.as_secs_f64()
        );
        if self.cancelled {
            summary.push_str(" | cancelled");
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn result(success: bool, stripped: bool, wiped: bool) -> ProcessingResult {
        ProcessingResult {
            source: PathBuf::from("/in/a.jpg"),
            identity: 1,
            destination: success.then(|| PathBuf::from("/out/0001/000001.jpg")),
            metadata_stripped: stripped,
            timestamps_wiped: wiped,
            success,
            error: (!success).then(|| "boom".to_string()),
        }
    }

    #[test]
    fn test_record_counts_independent_outcomes() {
        let mut stats = Statistics::new(4);
        stats.record(&result(true, true, true));
        stats.record(&result(true, false, true));
        stats.record(&result(false, false, false));

        assert_eq!(stats.succeeded, 2);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.metadata_stripped, 1);
        assert_eq!(stats.timestamps_wiped, 2);
        assert_eq!(stats.completed(), 3);
    }

    #[test]
    fn test_summary_mentions_cancellation() {
        let mut stats = Statistics::new(2);
        assert!(!stats.format_summary().contains("cancelled"));
        stats.cancelled = true;
        assert!(stats.format_summary().contains("cancelled"));
    }

    #[test]
    fn test_short_destination() {
        assert_eq!(
            short_destination(std::path::Path::new("/archive/0003/000151.jpg")),
            "0003/000151.jpg"
        );
    }
}
