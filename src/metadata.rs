//! # Metadata Stripping Module
//!
//! Capability di rimozione metadati usata dalla pipeline e dal comando `strip`.
//!
//! ## Responsabilità:
//! - Definisce il trait `MetadataStripper` (punto di iniezione per i test)
//! - Classifica i file per estensione (immagine, PDF, altro)
//! - Garantisce che la destinazione esista sempre dopo lo step, anche in caso di errore
//!
//! ## Esiti:
//! - `Stripped`: metadati rimossi
//! - `Unsupported`: tipo non gestito, file copiato invariato (esito atteso, non un errore)
//! - `Failed`: file corrotto o illeggibile, copia invariata come fallback

use crate::{
    document_processor, error::OrganizeError, file_manager::FileManager, image_processor,
};
use std::path::Path;
use tracing::{debug, warn};

/// Estensioni immagine con rimozione metadati
pub const IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".tiff", ".bmp", ".webp"];

/// Tutte le estensioni supportate
pub const SUPPORTED_EXTENSIONS: &[&str] =
    &[".jpg", ".jpeg", ".png", ".tiff", ".bmp", ".webp", ".pdf"];

/// Tipo di file dichiarato dall'estensione
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Image,
    Pdf,
    Other,
}

impl FileKind {
    pub fn from_path(path: &Path) -> Self {
        match FileManager::dotted_extension(path).as_deref() {
            Some(".pdf") => Self::Pdf,
            Some(ext) if IMAGE_EXTENSIONS.contains(&ext) => Self::Image,
            _ => Self::Other,
        }
    }
}

/// Esito della rimozione metadati per un singolo file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StripOutcome {
    Stripped,
    Unsupported,
    Failed(String),
}

impl StripOutcome {
    pub fn is_stripped(&self) -> bool {
        matches!(self, Self::Stripped)
    }
}

/// Rimuove i metadati da `source` scrivendo in `target` (i due path possono coincidere)
pub trait MetadataStripper: Send + Sync {
    fn strip(&self, source: &Path, target: &Path) -> StripOutcome;
}

/// Implementazione di default: filtri per contenitore immagine + `lopdf` per i PDF
#[derive(Debug, Default, Clone, Copy)]
pub struct MediaMetadataStripper;

impl MetadataStripper for MediaMetadataStripper {
    fn strip(&self, source: &Path, target: &Path) -> StripOutcome {
        let result = match FileKind::from_path(source) {
            FileKind::Image => image_processor::strip_image_file(source, target),
            FileKind::Pdf => document_processor::strip_pdf_file(source, target),
            FileKind::Other => Err(OrganizeError::UnsupportedFormat(source.display().to_string())),
        };

        let error = match result {
            Ok(()) => {
                debug!("Metadata removed: {}", target.display());
                return StripOutcome::Stripped;
            }
            Err(e) => e,
        };

        if let Err(copy_error) = FileManager::copy_unchanged(source, target) {
            return StripOutcome::Failed(format!("{}; fallback copy failed: {}", error, copy_error));
        }

        match error {
            OrganizeError::UnsupportedFormat(_) => {
                debug!("No metadata removal for {}", source.display());
                StripOutcome::Unsupported
            }
            other => {
                warn!("Metadata removal failed for {}: {}", source.display(), other);
                StripOutcome::Failed(other.to_string())
            }
        }
    }
}
