//! # Error Types Module
//!
//! Questo modulo definisce tutti i tipi di errore custom della libreria.
//!
//! ## Responsabilità:
//! - Definisce `OrganizeError` enum per categorizzare tutti gli errori possibili
//! - Distingue errori fatali (configurazione, destinazione) da errori per singolo file
//! - Integra con `thiserror` per automatic error conversion
//!
//! ## Categorie di errori:
//! - `SourceMissing` / `SourceNotDirectory` / `SameSourceAndDestination`: configurazione non valida
//! - `Destination`: cartella di destinazione non creabile (fatale, la rotazione non può procedere)
//! - `Validation`: parametri di configurazione fuori range
//! - `Io`: Errori di I/O sul singolo file
//! - `Image` / `Pdf`: file corrotti durante la rimozione metadata
//! - `UnsupportedFormat`: tipo di file senza rimozione metadata
//! - `InvalidContainer`: struttura JPEG/PNG/WebP non valida
//!
//! ## Esempio:
//! ```rust,ignore
//! if !config.source_dir.exists() {
//!     return Err(OrganizeError::SourceMissing(config.source_dir.clone()));
//! }
//! ```

use std::path::PathBuf;

/// Custom error types for file organization
#[derive(thiserror::Error, Debug)]
pub enum OrganizeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("PDF processing error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("Source directory does not exist: {}", .0.display())]
    SourceMissing(PathBuf),

    #[error("Source path is not a directory: {}", .0.display())]
    SourceNotDirectory(PathBuf),

    #[error("Source and destination are the same directory: {}", .0.display())]
    SameSourceAndDestination(PathBuf),

    #[error("Cannot prepare destination folder {}: {source}", path.display())]
    Destination {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Validation(String),

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid {kind} container: {reason}")]
    InvalidContainer {
        kind: &'static str,
        reason: String,
    },
}

impl OrganizeError {
    /// Errori che interrompono l'intera esecuzione
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::SourceMissing(_)
                | Self::SourceNotDirectory(_)
                | Self::SameSourceAndDestination(_)
                | Self::Destination { .. }
                | Self::Validation(_)
        )
    }

    pub(crate) fn invalid(kind: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidContainer {
            kind,
            reason: reason.into(),
        }
    }
}

pub type Result<T, E = OrganizeError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(OrganizeError::SourceMissing(PathBuf::from("/nope")).is_fatal());
        assert!(OrganizeError::Validation("workers".into()).is_fatal());
        assert!(!OrganizeError::UnsupportedFormat("txt".into()).is_fatal());
        assert!(!OrganizeError::invalid("JPEG", "truncated").is_fatal());
    }

    #[test]
    fn test_error_messages() {
        let err = OrganizeError::SameSourceAndDestination(PathBuf::from("/media"));
        assert_eq!(err.to_string(), "Source and destination are the same directory: /media");

        let err = OrganizeError::invalid("PNG", "missing signature");
        assert_eq!(err.to_string(), "Invalid PNG container: missing signature");
    }
}
