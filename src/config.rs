//! # Configuration Management Module
//!
//! Questo modulo gestisce la configurazione di una esecuzione dell'organizer.
//!
//! ## Responsabilità:
//! - Definisce la struct `OrganizerConfig` con tutti i parametri di una run
//! - Fornisce validazione dei parametri numerici e dei percorsi
//! - Supporta caricamento/salvataggio configurazione da/verso file JSON
//! - Fornisce valori di default sensati per tutti i parametri
//!
//! ## Parametri di configurazione:
//! - `source_dir`: Directory "discarica" da cui prelevare i file (non ricorsiva)
//! - `destination_dir`: Radice delle cartelle numerate `NNNN/`
//! - `max_files_per_folder`: Capienza massima di ogni cartella (default: 5000)
//! - `start_identity`: Numero iniziale esplicito (default: None = dedotto dalla destinazione)
//! - `strip_metadata`: Rimuove EXIF/XMP/ICC e info PDF dopo lo spostamento (default: false)
//! - `wipe_timestamps`: Azzera le date del file system (default: false)
//! - `workers`: Numero di worker paralleli (default: parallelismo disponibile)
//!
//! ## Validazione:
//! - `validate()`: capienza e workers devono essere > 0
//! - `check_paths()`: la sorgente deve esistere, essere una directory e differire dalla destinazione
//!
//! ## Esempio:
//! ```rust,ignore
//! let config = OrganizerConfig {
//!     source_dir: "/downloads".into(),
//!     destination_dir: "/archive".into(),
//!     max_files_per_folder: 1000,
//!     ..Default::default()
//! };
//! config.validate()?;
//! ```

use crate::error::{OrganizeError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default folder capacity used by the archive layout
pub const DEFAULT_MAX_FILES_PER_FOLDER: usize = 5000;

/// Configuration for one organizer run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OrganizerConfig {
    /// Directory holding the unordered batch of files
    pub source_dir: PathBuf,
    /// Root of the numbered folder hierarchy
    pub destination_dir: PathBuf,
    /// Maximum number of entries in a single numbered folder
    pub max_files_per_folder: usize,
    /// Explicit first identity (None = resume from the destination tree)
    pub start_identity: Option<u64>,
    /// Strip embedded metadata after relocation
    pub strip_metadata: bool,
    /// Reset filesystem timestamps to the sentinel epoch
    pub wipe_timestamps: bool,
    /// Number of parallel workers
    pub workers: usize,
}

impl Default for OrganizerConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::new(),
            destination_dir: PathBuf::new(),
            max_files_per_folder: DEFAULT_MAX_FILES_PER_FOLDER,
            start_identity: None,
            strip_metadata: false,
            wipe_timestamps: false,
            workers: default_workers(),
        }
    }
}

/// Worker count derived from the available parallelism
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

impl OrganizerConfig {
    pub fn new(source_dir: impl Into<PathBuf>, destination_dir: impl Into<PathBuf>) -> Self {
        Self {
            source_dir: source_dir.into(),
            destination_dir: destination_dir.into(),
            ..Default::default()
        }
    }

    /// Validate numeric configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.max_files_per_folder == 0 {
            return Err(OrganizeError::Validation(
                "Max files per folder must be greater than 0".to_string(),
            ));
        }

        if self.workers == 0 {
            return Err(OrganizeError::Validation(
                "Number of workers must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Validate source/destination before any file is touched
    pub fn check_paths(&self) -> Result<()> {
        let source = &self.source_dir;
        if !source.exists() {
            return Err(OrganizeError::SourceMissing(source.clone()));
        }
        if !source.is_dir() {
            return Err(OrganizeError::SourceNotDirectory(source.clone()));
        }

        // Una destinazione inesistente non può coincidere con una sorgente esistente
        if self.destination_dir.exists() && same_directory(source, &self.destination_dir)? {
            return Err(OrganizeError::SameSourceAndDestination(source.clone()));
        }

        Ok(())
    }

    /// Load configuration from file
    pub async fn from_file(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path).await?;
        let config: OrganizerConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save_to_file(&self, path: &Path) -> anyhow::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }
}

fn same_directory(a: &Path, b: &Path) -> Result<bool> {
    Ok(a.canonicalize()? == b.canonicalize()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_validation() {
        let mut config = OrganizerConfig::default();
        assert!(config.validate().is_ok());

        config.max_files_per_folder = 0;
        assert!(config.validate().is_err());

        config.max_files_per_folder = 10;
        config.workers = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_default() {
        let config = OrganizerConfig::default();
        assert_eq!(config.max_files_per_folder, 5000);
        assert_eq!(config.start_identity, None);
        assert!(!config.strip_metadata);
        assert!(!config.wipe_timestamps);
        assert!(config.workers >= 1);
    }

    #[test]
    fn test_check_paths() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("inbox");
        let destination = temp_dir.path().join("archive");

        let config = OrganizerConfig::new(&source, &destination);
        assert!(matches!(config.check_paths(), Err(OrganizeError::SourceMissing(_))));

        std::fs::write(&source, b"not a dir").unwrap();
        assert!(matches!(config.check_paths(), Err(OrganizeError::SourceNotDirectory(_))));

        std::fs::remove_file(&source).unwrap();
        std::fs::create_dir(&source).unwrap();
        assert!(config.check_paths().is_ok());

        let same = OrganizerConfig::new(&source, source.join("."));
        assert!(matches!(same.check_paths(), Err(OrganizeError::SameSourceAndDestination(_))));
    }

    #[tokio::test]
    async fn test_config_save_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");

        let original_config = OrganizerConfig {
            source_dir: PathBuf::from("/downloads"),
            destination_dir: PathBuf::from("/archive"),
            max_files_per_folder: 250,
            start_identity: Some(1200),
            strip_metadata: true,
            wipe_timestamps: true,
            workers: 3,
        };

        original_config.save_to_file(&config_path).await.unwrap();
        let loaded_config = OrganizerConfig::from_file(&config_path).await.unwrap();

        assert_eq!(loaded_config, original_config);
    }

    #[tokio::test]
    async fn test_partial_config_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        tokio::fs::write(&config_path, r#"{ "max_files_per_folder": 42 }"#)
            .await
            .unwrap();

        let config = OrganizerConfig::from_file(&config_path).await.unwrap();
        assert_eq!(config.max_files_per_folder, 42);
        assert_eq!(config.start_identity, None);
    }
}
