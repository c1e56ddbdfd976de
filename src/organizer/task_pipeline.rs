//! # Task Pipeline Module
//!
//! Worker per l'elaborazione di un singolo file già numerato.
//! Separato dall'orchestratore: riceve un `WorkItem` e la sua `Allocation` e
//! non conosce né la coda né gli altri worker.
//!
//! ## Sequenza per file (mai riordinata):
//! 1. Path desiderato `NNNN/MMMMMM.ext`
//! 2. Prenotazione del nome (suffisso `_k` se occupato)
//! 3. Spostamento (la sorgente resta intatta finché la destinazione non è confermata)
//! 4. Rimozione metadati (opzionale)
//! 5. Azzeramento date (opzionale)
//!
//! Un errore in qualunque step diventa un `ProcessingResult` fallito: nulla risale
//! all'orchestratore e gli altri worker proseguono.

use crate::{
    config::OrganizerConfig,
    error::Result,
    file_manager::{FileManager, WorkItem},
    metadata::{MetadataStripper, StripOutcome},
    organizer::{allocator::Allocation, conflict::ConflictResolver, path_resolver::PathResolver},
    platform::TimestampWiper,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

/// Esito di un singolo file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessingResult {
    pub source: PathBuf,
    pub identity: u64,
    pub destination: Option<PathBuf>,
    pub metadata_stripped: bool,
    pub timestamps_wiped: bool,
    pub success: bool,
    pub error: Option<String>,
}

impl ProcessingResult {
    pub fn moved(source: PathBuf, identity: u64, destination: PathBuf) -> Self {
        Self {
            source,
            identity,
            destination: Some(destination),
            metadata_stripped: false,
            timestamps_wiped: false,
            success: true,
            error: None,
        }
    }

    pub fn failed(source: PathBuf, identity: u64, error: impl Into<String>) -> Self {
        Self {
            source,
            identity,
            destination: None,
            metadata_stripped: false,
            timestamps_wiped: false,
            success: false,
            error: Some(error.into()),
        }
    }
}

/// Pipeline condivisa da tutti i worker
#[derive(Clone)]
pub struct TaskPipeline {
    config: Arc<OrganizerConfig>,
    stripper: Arc<dyn MetadataStripper>,
    wiper: Arc<dyn TimestampWiper>,
}

impl TaskPipeline {
    pub fn new(
        config: Arc<OrganizerConfig>,
        stripper: Arc<dyn MetadataStripper>,
        wiper: Arc<dyn TimestampWiper>,
    ) -> Self {
        Self {
            config,
            stripper,
            wiper,
        }
    }

    /// Processa un singolo file; non fallisce mai, l'errore finisce nel risultato
    pub async fn process(&self, item: &WorkItem, allocation: &Allocation) -> ProcessingResult {
        match self.try_process(item, allocation).await {
            Ok(result) => result,
            Err(e) => {
                warn!(
                    "[ERROR] {} (identity {}): {}",
                    item.path.display(),
                    allocation.identity,
                    e
                );
                ProcessingResult::failed(item.path.clone(), allocation.identity, e.to_string())
            }
        }
    }

    async fn try_process(&self, item: &WorkItem, allocation: &Allocation) -> Result<ProcessingResult> {
        let desired =
            PathResolver::destination_path(&allocation.folder, allocation.identity, &item.path);
        let destination = ConflictResolver::reserve(&desired).await?;
        if destination != desired {
            debug!(
                "Name collision on {}, using {}",
                desired.display(),
                destination.display()
            );
        }

        if let Err(e) = FileManager::relocate(&item.path, &destination).await {
            // Il segnaposto non deve sopravvivere a uno spostamento fallito
            let _ = tokio::fs::remove_file(&destination).await;
            return Err(e.into());
        }
        debug!("{} -> {}", item.path.display(), destination.display());

        let mut result =
            ProcessingResult::moved(item.path.clone(), allocation.identity, destination.clone());

        if self.config.strip_metadata {
            result.metadata_stripped = self.strip(destination.clone()).await;
        }

        if self.config.wipe_timestamps {
            result.timestamps_wiped = self.wipe(destination).await;
        }

        Ok(result)
    }

    /// Riscrive il file in place, fuori dal runtime async
    async fn strip(&self, path: PathBuf) -> bool {
        let stripper = Arc::clone(&self.stripper);
        let target = path.clone();
        match tokio::task::spawn_blocking(move || stripper.strip(&target, &target)).await {
            Ok(StripOutcome::Stripped) => true,
            Ok(StripOutcome::Unsupported) => false,
            Ok(StripOutcome::Failed(reason)) => {
                warn!("Metadata kept on {}: {}", path.display(), reason);
                false
            }
            Err(e) => {
                warn!("Metadata removal task failed for {}: {}", path.display(), e);
                false
            }
        }
    }

    async fn wipe(&self, path: PathBuf) -> bool {
        let wiper = Arc::clone(&self.wiper);
        let target = path.clone();
        match tokio::task::spawn_blocking(move || wiper.wipe(&target)).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                warn!("Timestamps kept on {}: {}", path.display(), e);
                false
            }
            Err(e) => {
                warn!("Timestamp task failed for {}: {}", path.display(), e);
                false
            }
        }
    }
}
