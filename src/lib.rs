//! # Media Organizer Library
//!
//! Questo è il modulo principale della libreria che espone tutte le API pubbliche.
//!
//! ## Responsabilità:
//! - Definisce la struttura modulare dell'applicazione
//! - Espone i tipi e le funzioni principali tramite re-exports
//! - Fornisce un'interfaccia pulita per il main.rs e per altri consumatori
//!
//! ## Architettura dei moduli:
//! - `config`: Configurazione immutabile della run e validazione
//! - `error`: Tipi di errore custom
//! - `file_manager`: Scansione, ordinamento e spostamento sicuro dei file
//! - `organizer`: Allocazione identità, pipeline per file e orchestratore
//! - `metadata`: Capability di rimozione metadati
//! - `image_processor`: Filtri metadati per JPEG/PNG/WebP, re-encode TIFF/BMP
//! - `document_processor`: Rimozione metadati dai PDF
//! - `platform`: Azzeramento date dei file per piattaforma
//! - `sanitizer`: Rimozione metadati in-place su una directory
//! - `progress`: Progress bar e statistiche
//! - `json_output`: Eventi JSON per l'integrazione con altri processi
//!
//! ## Utilizzo:
//! ```rust,ignore
//! use media_organizer::{FileOrganizer, OrganizerConfig};
//!
//! let mut config = OrganizerConfig::new("/inbox", "/archive");
//! config.strip_metadata = true;
//! let report = FileOrganizer::new(config)?.run().await?;
//! println!("{}", report.statistics.format_summary());
//! ```

pub mod config;
pub mod document_processor;
pub mod error;
pub mod file_manager;
pub mod image_processor;
pub mod json_output;
pub mod metadata;
pub mod organizer;
pub mod platform;
pub mod progress;
pub mod sanitizer;

#[cfg(test)]
mod testutils;

pub use config::OrganizerConfig;
pub use error::OrganizeError;
pub use metadata::{MediaMetadataStripper, MetadataStripper, StripOutcome};
pub use organizer::{FileOrganizer, ProcessingResult, ProgressObserver, RunReport};
pub use platform::TimestampWiper;
pub use progress::Statistics;
pub use sanitizer::{DirectorySanitizer, SanitizeOptions, SanitizeStats};
