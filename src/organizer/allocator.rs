//! # Identity Allocator Module
//!
//! Unica fonte di verità per la numerazione dei file e per la rotazione delle cartelle.
//!
//! ## Responsabilità:
//! - Emette identità strettamente crescenti, senza buchi né duplicati
//! - Decide in quale cartella numerata finisce la prossima identità
//! - Ruota su una nuova cartella quando quella attiva raggiunge la capienza
//! - Riprende la numerazione da una destinazione prodotta da run precedenti
//!
//! ## Concorrenza:
//! Contatori e rotazione vivono dietro un unico `Mutex`: la decisione sulla capienza e
//! l'emissione dell'identità avvengono nella stessa sezione critica. Dentro il lock si
//! crea al massimo una cartella, mai copie o trasformazioni.

use crate::{
    error::{OrganizeError, Result},
    organizer::path_resolver::PathResolver,
};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Identità assegnata ad un file insieme alla sua cartella
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    pub identity: u64,
    pub folder_index: u32,
    pub folder: PathBuf,
}

#[derive(Debug)]
struct AllocationState {
    next_identity: u64,
    current_folder_index: u32,
    current_folder_entry_count: usize,
    folders_created: usize,
}

/// Allocatore thread-safe di identità e cartelle
#[derive(Debug)]
pub struct IdentityAllocator {
    destination: PathBuf,
    max_files_per_folder: usize,
    state: Mutex<AllocationState>,
}

impl IdentityAllocator {
    /// Inizializza lo stato ispezionando la destinazione.
    ///
    /// - `start_identity` esplicito vince sempre
    /// - altrimenti: massimo stem numerico + 1, cercato dall'ultima cartella all'indietro
    ///   fino alla prima che ne contiene uno (1 se nessuna)
    /// - la numerazione cartelle riparte dall'ultima cartella esistente, creando `0001` se assente
    /// - se l'ultima cartella è già piena si ruota subito
    pub async fn resume(
        destination: &Path,
        max_files_per_folder: usize,
        start_identity: Option<u64>,
    ) -> Result<Self> {
        tokio::fs::create_dir_all(destination)
            .await
            .map_err(|source| OrganizeError::Destination {
                path: destination.to_path_buf(),
                source,
            })?;

        let folders = numbered_folders(destination).await?;
        let mut folders_created = 0;
        let current_folder_index = match folders.first() {
            Some(&index) => index,
            None => {
                let first = PathResolver::folder_path(destination, 1);
                create_folder(&first).await?;
                info!("Created first folder: {}", first.display());
                folders_created += 1;
                1
            }
        };

        let folder = PathResolver::folder_path(destination, current_folder_index);
        let current_folder_entry_count = count_entries(&folder).await?;
        let next_identity = match start_identity {
            Some(start) => start,
            None => resume_identity(destination, &folders).await?,
        };

        debug!(
            "Resuming at identity {} in folder {} ({} entries)",
            next_identity,
            folder.display(),
            current_folder_entry_count
        );

        let allocator = Self {
            destination: destination.to_path_buf(),
            max_files_per_folder,
            state: Mutex::new(AllocationState {
                next_identity,
                current_folder_index,
                current_folder_entry_count,
                folders_created,
            }),
        };

        {
            let mut state = allocator.state.lock().await;
            while state.current_folder_entry_count >= allocator.max_files_per_folder {
                allocator.rotate(&mut state).await?;
            }
        }

        Ok(allocator)
    }

    /// Emette la prossima identità e la cartella che la ospiterà
    pub async fn allocate(&self) -> Result<Allocation> {
        let mut state = self.state.lock().await;

        while state.current_folder_entry_count >= self.max_files_per_folder {
            self.rotate(&mut state).await?;
        }

        let identity = state.next_identity;
        state.next_identity = identity
            .checked_add(1)
            .ok_or_else(|| OrganizeError::Validation("identity space exhausted".to_string()))?;
        state.current_folder_entry_count += 1;

        Ok(Allocation {
            identity,
            folder_index: state.current_folder_index,
            folder: PathResolver::folder_path(&self.destination, state.current_folder_index),
        })
    }

    /// Prossima identità che verrà emessa
    pub async fn next_identity(&self) -> u64 {
        self.state.lock().await.next_identity
    }

    /// Indice della cartella attiva
    pub async fn current_folder_index(&self) -> u32 {
        self.state.lock().await.current_folder_index
    }

    /// Cartelle create durante questa run
    pub async fn folders_created(&self) -> usize {
        self.state.lock().await.folders_created
    }

    async fn rotate(&self, state: &mut AllocationState) -> Result<()> {
        let index = state
            .current_folder_index
            .checked_add(1)
            .ok_or_else(|| OrganizeError::Validation("folder numbering exhausted".to_string()))?;
        let folder = PathResolver::folder_path(&self.destination, index);

        let entry_count = match tokio::fs::create_dir(&folder).await {
            Ok(()) => {
                info!("Created new folder: {}", folder.display());
                state.folders_created += 1;
                0
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => count_entries(&folder).await?,
            Err(source) => return Err(OrganizeError::Destination { path: folder, source }),
        };

        state.current_folder_index = index;
        state.current_folder_entry_count = entry_count;
        Ok(())
    }
}

async fn create_folder(folder: &Path) -> Result<()> {
    tokio::fs::create_dir_all(folder)
        .await
        .map_err(|source| OrganizeError::Destination {
            path: folder.to_path_buf(),
            source,
        })
}

/// Indici delle sottocartelle numerate, dal più alto al più basso
async fn numbered_folders(destination: &Path) -> Result<Vec<u32>> {
    let mut entries = read_dir(destination).await?;
    let mut indices = Vec::new();

    while let Some(entry) = next_entry(destination, &mut entries).await? {
        let is_dir = entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false);
        if !is_dir {
            continue;
        }
        if let Some(index) = PathResolver::parse_folder_index(&entry.file_name().to_string_lossy()) {
            indices.push(index);
        }
    }

    indices.sort_unstable_by(|a, b| b.cmp(a));
    Ok(indices)
}

/// Prima identità libera: l'ultima cartella può essere vuota (rotazione senza
/// file spostati), quindi si scende finché una cartella ha uno stem numerico
async fn resume_identity(destination: &Path, folders: &[u32]) -> Result<u64> {
    for &index in folders {
        let max = max_identity_in(&PathResolver::folder_path(destination, index)).await?;
        if max > 0 {
            return max.checked_add(1).ok_or_else(|| {
                OrganizeError::Validation("identity space exhausted".to_string())
            });
        }
    }
    Ok(1)
}

/// Numero di voci già presenti in una cartella
async fn count_entries(folder: &Path) -> Result<usize> {
    let mut entries = read_dir(folder).await?;
    let mut count = 0;
    while next_entry(folder, &mut entries).await?.is_some() {
        count += 1;
    }
    Ok(count)
}

/// Identità massima tra i file con stem numerico (0 se nessuno)
async fn max_identity_in(folder: &Path) -> Result<u64> {
    let mut entries = read_dir(folder).await?;
    let mut max = 0;

    while let Some(entry) = next_entry(folder, &mut entries).await? {
        let is_file = entry.file_type().await.map(|t| t.is_file()).unwrap_or(false);
        if !is_file {
            continue;
        }
        let path = entry.path();
        let identity = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .and_then(PathResolver::parse_identity);
        if let Some(identity) = identity {
            max = max.max(identity);
        }
    }

    Ok(max)
}

async fn read_dir(path: &Path) -> Result<tokio::fs::ReadDir> {
    tokio::fs::read_dir(path)
        .await
        .map_err(|source| OrganizeError::Destination {
            path: path.to_path_buf(),
            source,
        })
}

async fn next_entry(
    path: &Path,
    entries: &mut tokio::fs::ReadDir,
) -> Result<Option<tokio::fs::DirEntry>> {
    entries
        .next_entry()
        .await
        .map_err(|source| OrganizeError::Destination {
            path: path.to_path_buf(),
            source,
        })
}
