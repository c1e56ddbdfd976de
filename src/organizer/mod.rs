//! # Organizer Module
//!
//! Separa le responsabilità in sottomoduli:
//! - `file_organizer`: Orchestratore principale
//! - `task_pipeline`: Worker per singoli file
//! - `allocator`: Identità e cartelle condivise tra i worker
//! - `conflict`: Disambiguazione dei nomi già occupati
//! - `progress_tracker`: Statistiche e notifiche di avanzamento
//! - `path_resolver`: Logica di calcolo path centralizzata

pub mod allocator;
pub mod conflict;
pub mod file_organizer;
pub mod path_resolver;
pub mod progress_tracker;
pub mod task_pipeline;

pub use allocator::{Allocation, IdentityAllocator};
pub use conflict::ConflictResolver;
pub use file_organizer::{FileOrganizer, RunReport};
pub use path_resolver::PathResolver;
pub use progress_tracker::{ProgressObserver, ProgressTracker};
pub use task_pipeline::{ProcessingResult, TaskPipeline};
