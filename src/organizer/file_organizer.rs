//! # File Organizer Main Orchestrator
//!
//! Orchestratore principale: scansiona la sorgente, ordina il lavoro e lo distribuisce
//! su un pool di worker a dimensione fissa.
//!
//! ## Flusso di esecuzione:
//! 1. **Validazione**: sorgente esistente, directory, diversa dalla destinazione
//! 2. **Scansione**: file immediati della sorgente ordinati per (mtime, nome)
//! 3. **Resume**: l'`IdentityAllocator` riparte dallo stato della destinazione
//! 4. **Dispatch**: per ogni file si attende un permesso del semaforo, si assegna
//!    l'identità e si lancia il worker; l'assegnazione avviene qui, in ordine,
//!    quindi l'ordine della coda coincide con l'ordine delle identità
//! 5. **Drain**: si attendono i worker in volo, un panic diventa un risultato fallito
//! 6. **Report**: statistiche aggregate + risultati per file ordinati per identità
//!
//! ## Cancellazione:
//! Un segnale sul canale broadcast ferma il dispatch; i worker già lanciati terminano
//! normalmente e nessun file oltre quelli in volo viene toccato.
//!
//! ## Errori fatali:
//! Configurazione non valida o destinazione non scrivibile. Nel primo caso nulla viene
//! toccato; se la rotazione delle cartelle fallisce a metà run il dispatch si ferma,
//! i worker in volo vengono attesi e l'errore risale al chiamante.

use crate::{
    config::OrganizerConfig,
    error::{OrganizeError, Result},
    file_manager::{FileManager, WorkItem},
    metadata::{MediaMetadataStripper, MetadataStripper},
    organizer::{
        allocator::{Allocation, IdentityAllocator},
        progress_tracker::{ProgressObserver, ProgressTracker},
        task_pipeline::{ProcessingResult, TaskPipeline},
    },
    platform::{self, TimestampWiper},
    progress::Statistics,
};
use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{broadcast, Semaphore};
use tracing::{debug, error, info, warn};

/// Esito completo di una run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub statistics: Statistics,
    /// Un risultato per file affidato a un worker, in ordine di identità
    pub results: Vec<ProcessingResult>,
}

/// Orchestratore principale
pub struct FileOrganizer {
    config: Arc<OrganizerConfig>,
    stripper: Arc<dyn MetadataStripper>,
    wiper: Arc<dyn TimestampWiper>,
    observer: Option<Arc<dyn ProgressObserver>>,
    stop_receiver: Option<broadcast::Receiver<()>>,
}

impl FileOrganizer {
    /// Crea l'orchestratore con le capability di default della piattaforma
    pub fn new(config: OrganizerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config: Arc::new(config),
            stripper: Arc::new(MediaMetadataStripper),
            wiper: platform::timestamp_wiper(),
            observer: None,
            stop_receiver: None,
        })
    }

    /// Come `new`, ma interrompibile tramite il canale di cancellazione.
    ///
    /// ```rust,ignore
    /// let (stop_sender, stop_receiver) = FileOrganizer::create_cancellation_channel(1);
    /// let mut organizer = FileOrganizer::new_with_cancellation(config, stop_receiver)?;
    ///
    /// // Da un altro task:
    /// let _ = stop_sender.send(());
    /// ```
    pub fn new_with_cancellation(
        config: OrganizerConfig,
        stop_receiver: broadcast::Receiver<()>,
    ) -> Result<Self> {
        let mut organizer = Self::new(config)?;
        organizer.stop_receiver = Some(stop_receiver);
        Ok(organizer)
    }

    pub fn with_stripper(mut self, stripper: Arc<dyn MetadataStripper>) -> Self {
        self.stripper = stripper;
        self
    }

    pub fn with_timestamp_wiper(mut self, wiper: Arc<dyn TimestampWiper>) -> Self {
        self.wiper = wiper;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Creates a broadcast channel for cancellation signals
    pub fn create_cancellation_channel(
        capacity: usize,
    ) -> (broadcast::Sender<()>, broadcast::Receiver<()>) {
        broadcast::channel(capacity)
    }

    /// Checks if a stop signal has been received.
    fn should_stop(&mut self) -> bool {
        if let Some(ref mut receiver) = self.stop_receiver {
            match receiver.try_recv() {
                Ok(_) => return true,
                Err(broadcast::error::TryRecvError::Empty) => return false,
                // Segnale inviato ma perso: equivale a uno stop
                Err(broadcast::error::TryRecvError::Lagged(_)) => return true,
                // Sender droppato: si continua
                Err(broadcast::error::TryRecvError::Closed) => return false,
            }
        }
        false
    }

    /// Esegue l'intera run
    pub async fn run(&mut self) -> Result<RunReport> {
        let start_time = Instant::now();
        let config = Arc::clone(&self.config);

        config.check_paths()?;

        let items = FileManager::scan_source(&config.source_dir);
        self.log_configuration(items.len());

        let tracker = ProgressTracker::new(items.len(), self.observer.clone());

        if items.is_empty() {
            info!("No files to organize in {}", config.source_dir.display());
            let statistics = tracker.finish(0, start_time.elapsed()).await;
            return Ok(RunReport {
                statistics,
                results: Vec::new(),
            });
        }

        let allocator = IdentityAllocator::resume(
            &config.destination_dir,
            config.max_files_per_folder,
            config.start_identity,
        )
        .await?;

        let pipeline = TaskPipeline::new(
            Arc::clone(&config),
            Arc::clone(&self.stripper),
            Arc::clone(&self.wiper),
        );

        let (results, fatal) = self
            .dispatch(items, &allocator, &pipeline, &tracker)
            .await;

        let folders_created = allocator.folders_created().await;
        let statistics = tracker.finish(folders_created, start_time.elapsed()).await;

        if let Some(e) = fatal {
            error!("Run aborted: {}", e);
            return Err(e);
        }

        info!("{}", statistics.format_summary());
        Ok(RunReport {
            statistics,
            results,
        })
    }

    /// Distribuisce i file sui worker e attende quelli in volo
    async fn dispatch(
        &mut self,
        items: Vec<WorkItem>,
        allocator: &IdentityAllocator,
        pipeline: &TaskPipeline,
        tracker: &ProgressTracker,
    ) -> (Vec<ProcessingResult>, Option<OrganizeError>) {
        let semaphore = Arc::new(Semaphore::new(self.config.workers));
        let mut in_flight = FuturesUnordered::new();
        let mut results = Vec::with_capacity(items.len());
        let mut fatal = None;

        for item in items {
            if self.should_stop() {
                info!("Stop requested, no further files will be dispatched");
                tracker.mark_cancelled().await;
                break;
            }

            let permit = match Arc::clone(&semaphore).acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    warn!("Worker pool closed: {}", e);
                    break;
                }
            };

            // Il segnale può arrivare mentre si attende un worker libero
            if self.should_stop() {
                info!("Stop requested, no further files will be dispatched");
                tracker.mark_cancelled().await;
                break;
            }

            let allocation = match allocator.allocate().await {
                Ok(allocation) => allocation,
                Err(e) => {
                    fatal = Some(e);
                    break;
                }
            };
            tracker.record_dispatch().await;
            debug!(
                "Dispatching {} as identity {} (folder {})",
                item.path.display(),
                allocation.identity,
                allocation.folder_index
            );

            let source = item.path.clone();
            let identity = allocation.identity;
            let worker = Self::spawn_worker(item, allocation, pipeline.clone(), tracker.clone(), permit);
            in_flight.push(worker.map(move |joined| (source, identity, joined)));
        }

        while let Some((source, identity, joined)) = in_flight.next().await {
            match joined {
                Ok(result) => results.push(result),
                Err(e) => {
                    error!("Worker for {} panicked: {}", source.display(), e);
                    let result = ProcessingResult::failed(source, identity, format!("worker panicked: {}", e));
                    tracker.record(&result).await;
                    results.push(result);
                }
            }
        }

        results.sort_by_key(|result| result.identity);
        (results, fatal)
    }

    fn spawn_worker(
        item: WorkItem,
        allocation: Allocation,
        pipeline: TaskPipeline,
        tracker: ProgressTracker,
        permit: tokio::sync::OwnedSemaphorePermit,
    ) -> tokio::task::JoinHandle<ProcessingResult> {
        tokio::spawn(async move {
            let _permit = permit;
            let result = pipeline.process(&item, &allocation).await;
            tracker.record(&result).await;
            result
        })
    }

    fn log_configuration(&self, file_count: usize) {
        let config = &self.config;
        info!(
            "Organizing {} -> {}",
            config.source_dir.display(),
            config.destination_dir.display()
        );
        info!(
            "Max files per folder: {}, workers: {}",
            config.max_files_per_folder, config.workers
        );
        if let Some(start) = config.start_identity {
            info!("Explicit start identity: {}", start);
        }
        if config.strip_metadata {
            info!("Metadata removal enabled");
        }
        if config.wipe_timestamps {
            info!("Timestamp reset enabled ({})", self.wiper.name());
        }
        info!("Found {} files to organize", file_count);
    }
}
