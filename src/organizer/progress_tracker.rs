//! # Progress Tracking Module
//!
//! Tracker thread-safe condiviso da tutti i worker.
//! Le statistiche vivono dietro un unico `Mutex`; la presentazione (progress bar,
//! eventi JSON) è delegata a un `ProgressObserver` opzionale, così la libreria non
//! scrive mai direttamente sul terminale.

use crate::{organizer::task_pipeline::ProcessingResult, progress::Statistics};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Riceve gli eventi di avanzamento di una run.
///
/// `completed` è il numero di file terminati, non la posizione nella coda:
/// i worker finiscono in ordine arbitrario.
pub trait ProgressObserver: Send + Sync {
    fn on_start(&self, _total: usize) {}

    fn on_file_complete(&self, _result: &ProcessingResult, _completed: usize, _total: usize) {}

    fn on_finish(&self, _statistics: &Statistics) {}
}

/// Tracker progress unificato
#[derive(Clone)]
pub struct ProgressTracker {
    pub total_files: usize,
    statistics: Arc<Mutex<Statistics>>,
    observer: Option<Arc<dyn ProgressObserver>>,
}

impl ProgressTracker {
    pub fn new(total_files: usize, observer: Option<Arc<dyn ProgressObserver>>) -> Self {
        if let Some(observer) = &observer {
            observer.on_start(total_files);
        }
        Self {
            total_files,
            statistics: Arc::new(Mutex::new(Statistics::new(total_files))),
            observer,
        }
    }

    /// Un file ha ricevuto un'identità ed è stato affidato a un worker
    pub async fn record_dispatch(&self) {
        self.statistics.lock().await.dispatched += 1;
    }

    /// Registra l'esito di un file e notifica l'observer
    pub async fn record(&self, result: &ProcessingResult) {
        let completed = {
            let mut statistics = self.statistics.lock().await;
            statistics.record(result);
            statistics.completed()
        };

        if let Some(observer) = &self.observer {
            observer.on_file_complete(result, completed, self.total_files);
        }
    }

    pub async fn mark_cancelled(&self) {
        self.statistics.lock().await.cancelled = true;
    }

    /// Chiude la run con i dati che solo l'orchestratore conosce
    pub async fn finish(&self, folders_created: usize, elapsed: Duration) -> Statistics {
        let statistics = {
            let mut statistics = self.statistics.lock().await;
            statistics.folders_created = folders_created;
            statistics.elapsed = elapsed;
            statistics.clone()
        };

        if let Some(observer) = &self.observer {
            observer.on_finish(&statistics);
        }
        statistics
    }
}
