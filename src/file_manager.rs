//! # File Management Module
//!
//! Questo modulo gestisce tutte le operazioni sui file usate dalla pipeline.
//!
//! ## Responsabilità:
//! - Scansione non ricorsiva della sorgente e ordinamento dei `WorkItem`
//! - Discovery ricorsiva per la rimozione metadati in-place
//! - Spostamento sicuro: la sorgente resta intatta finché la destinazione non è confermata
//! - Scrittura atomica (file temporaneo + rename) per le riscritture in-place
//!
//! ## Ordinamento:
//! I file vengono ordinati per `(data di modifica crescente, nome minuscolo crescente)`:
//! l'ordine decide chi riceve le identità più basse, non l'ordine di completamento dei worker.

use std::cmp::Ordering;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::fs;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Un file della sorgente catturato al momento della scansione
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    pub path: PathBuf,
    pub modified: SystemTime,
    pub name_lower: String,
}

impl WorkItem {
    pub fn new(path: PathBuf, modified: SystemTime) -> Self {
        let name_lower = path
            .file_name()
            .map(|name| name.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        Self {
            path,
            modified,
            name_lower,
        }
    }

    /// Ordine di elaborazione: data di modifica, poi nome
    pub fn processing_order(&self, other: &Self) -> Ordering {
        self.modified
            .cmp(&other.modified)
            .then_with(|| self.name_lower.cmp(&other.name_lower))
    }
}

/// Manages file operations and discovery
pub struct FileManager;

impl FileManager {
    /// Elenca i file immediati della sorgente, già ordinati per l'elaborazione
    pub fn scan_source(source: &Path) -> Vec<WorkItem> {
        let mut items: Vec<WorkItem> = WalkDir::new(source)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("Skipping unreadable entry in {}: {}", source.display(), e);
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| {
                let modified = entry
                    .metadata()
                    .ok()
                    .and_then(|metadata| metadata.modified().ok())
                    .unwrap_or(SystemTime::UNIX_EPOCH);
                WorkItem::new(entry.into_path(), modified)
            })
            .collect();

        items.sort_by(WorkItem::processing_order);
        items
    }

    /// Find all files in a directory, optionally descending into subdirectories.
    ///
    /// Returns the files and the number of entries that could not be read.
    pub fn find_files(dir: &Path, recursive: bool) -> (Vec<PathBuf>, usize) {
        let walker = if recursive {
            WalkDir::new(dir)
        } else {
            WalkDir::new(dir).max_depth(1)
        };

        let mut unreadable = 0;
        let files: Vec<PathBuf> = walker
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("Skipping unreadable entry in {}: {}", dir.display(), e);
                    unreadable += 1;
                    None
                }
            })
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .collect();

        (files, unreadable)
    }

    /// Lowercased extension with leading dot (`"IMG.JPG" -> ".jpg"`)
    pub fn dotted_extension(path: &Path) -> Option<String> {
        path.extension()
            .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
    }

    /// Sposta `source` su `target`.
    ///
    /// Prima tenta un rename atomico; se fallisce (es. volumi diversi) copia,
    /// verifica la dimensione e solo allora elimina la sorgente.
    pub async fn relocate(source: &Path, target: &Path) -> io::Result<()> {
        match fs::rename(source, target).await {
            Ok(()) => Ok(()),
            Err(e) => {
                debug!(
                    "Rename {} -> {} failed ({}), falling back to copy",
                    source.display(),
                    target.display(),
                    e
                );
                Self::copy_then_remove(source, target).await
            }
        }
    }

    async fn copy_then_remove(source: &Path, target: &Path) -> io::Result<()> {
        let expected = fs::metadata(source).await?.len();
        let copied = fs::copy(source, target).await?;

        if copied != expected {
            let _ = fs::remove_file(target).await;
            return Err(io::Error::new(
                io::ErrorKind::Other,
                format!("short copy: {} of {} bytes", copied, expected),
            ));
        }

        if let Err(e) = fs::remove_file(source).await {
            // La sorgente resta l'unica copia valida
            let _ = fs::remove_file(target).await;
            return Err(e);
        }

        Ok(())
    }

    /// Scrive `bytes` su `target` passando da un file temporaneo nella stessa cartella
    pub fn write_atomically(target: &Path, bytes: &[u8]) -> io::Result<()> {
        let name = target
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let temp = target.with_file_name(format!(".{}.partial", name));

        if let Err(e) = std::fs::write(&temp, bytes).and_then(|_| std::fs::rename(&temp, target)) {
            let _ = std::fs::remove_file(&temp);
            return Err(e);
        }
        Ok(())
    }

    /// Copia byte per byte, no-op se sorgente e destinazione coincidono
    pub fn copy_unchanged(source: &Path, target: &Path) -> io::Result<()> {
        if source == target {
            return Ok(());
        }
        std::fs::copy(source, target).map(|_| ())
    }
}
