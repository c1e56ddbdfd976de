//! # Directory Sanitizer Module
//!
//! Rimozione metadati in-place su un intero albero di directory (comando `strip`).
//!
//! ## Responsabilità:
//! - Discovery dei file (ricorsiva o meno)
//! - Selezione delle estensioni: solo quelle supportate, le altre richieste vengono ignorate
//! - Elaborazione concorrente limitata a `workers` file alla volta
//!
//! Nessuno spostamento né rinomina: ogni file viene riscritto nella sua posizione.

use crate::{
    error::{OrganizeError, Result},
    file_manager::FileManager,
    metadata::{MediaMetadataStripper, MetadataStripper, StripOutcome, SUPPORTED_EXTENSIONS},
};
use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Contatori di una passata di pulizia
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SanitizeStats {
    pub total_files: usize,
    pub stripped: usize,
    pub skipped: usize,
    pub errors: usize,
}

impl SanitizeStats {
    pub fn format_summary(&self) -> String {
        format!(
            "Files: {} | Stripped: {} | Skipped: {} | Errors: {}",
            self.total_files, self.stripped, self.skipped, self.errors
        )
    }
}

#[derive(Debug, Clone)]
pub struct SanitizeOptions {
    pub recursive: bool,
    /// Estensioni richieste (`.jpg`, `png`, ...); vuoto = tutte le supportate
    pub extensions: Vec<String>,
    pub workers: usize,
}

impl Default for SanitizeOptions {
    fn default() -> Self {
        Self {
            recursive: true,
            extensions: Vec::new(),
            workers: crate::config::default_workers(),
        }
    }
}

pub struct DirectorySanitizer {
    options: SanitizeOptions,
    stripper: Arc<dyn MetadataStripper>,
}

impl DirectorySanitizer {
    pub fn new(options: SanitizeOptions) -> Self {
        Self {
            options,
            stripper: Arc::new(MediaMetadataStripper),
        }
    }

    pub fn with_stripper(mut self, stripper: Arc<dyn MetadataStripper>) -> Self {
        self.stripper = stripper;
        self
    }

    /// Intersezione tra estensioni richieste e supportate
    pub fn selected_extensions(requested: &[String]) -> Vec<&'static str> {
        if requested.is_empty() {
            return SUPPORTED_EXTENSIONS.to_vec();
        }

        let normalized: Vec<String> = requested
            .iter()
            .map(|ext| {
                let ext = ext.trim().to_lowercase();
                if ext.starts_with('.') {
                    ext
                } else {
                    format!(".{}", ext)
                }
            })
            .collect();

        for ext in &normalized {
            if !SUPPORTED_EXTENSIONS.contains(&ext.as_str()) {
                warn!("Ignoring unsupported extension: {}", ext);
            }
        }

        SUPPORTED_EXTENSIONS
            .iter()
            .copied()
            .filter(|ext| normalized.iter().any(|requested| requested == ext))
            .collect()
    }

    pub async fn run(&self, directory: &Path) -> Result<SanitizeStats> {
        if !directory.exists() {
            return Err(OrganizeError::SourceMissing(directory.to_path_buf()));
        }
        if !directory.is_dir() {
            return Err(OrganizeError::SourceNotDirectory(directory.to_path_buf()));
        }
        if self.options.workers == 0 {
            return Err(OrganizeError::Validation(
                "Number of workers must be greater than 0".to_string(),
            ));
        }

        let selected = Self::selected_extensions(&self.options.extensions);
        let (files, unreadable) = FileManager::find_files(directory, self.options.recursive);
        info!(
            "Removing metadata from {} files in {} ({})",
            files.len(),
            directory.display(),
            selected.join(", ")
        );

        let mut stats = SanitizeStats {
            total_files: files.len(),
            errors: unreadable,
            ..Default::default()
        };

        let (targets, skipped): (Vec<PathBuf>, Vec<PathBuf>) = files.into_iter().partition(|path| {
            FileManager::dotted_extension(path)
                .map(|ext| selected.contains(&ext.as_str()))
                .unwrap_or(false)
        });
        stats.skipped += skipped.len();

        let mut outcomes = stream::iter(targets)
            .map(|path| {
                let stripper = Arc::clone(&self.stripper);
                async move {
                    let target = path.clone();
                    let outcome = tokio::task::spawn_blocking(move || stripper.strip(&target, &target))
                        .await
                        .unwrap_or_else(|e| StripOutcome::Failed(e.to_string()));
                    (path, outcome)
                }
            })
            .buffer_unordered(self.options.workers);

        while let Some((path, outcome)) = outcomes.next().await {
            match outcome {
                StripOutcome::Stripped => {
                    debug!("[OK] {}", path.display());
                    stats.stripped += 1;
                }
                StripOutcome::Unsupported => stats.skipped += 1,
                StripOutcome::Failed(reason) => {
                    warn!("[ERROR] {}: {}", path.display(), reason);
                    stats.errors += 1;
                }
            }
        }

        info!("{}", stats.format_summary());
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutils;
    use tempfile::TempDir;

    fn options(recursive: bool, extensions: &[&str]) -> SanitizeOptions {
        SanitizeOptions {
            recursive,
            extensions: extensions.iter().map(|ext| ext.to_string()).collect(),
            workers: 2,
        }
    }

    fn fixture() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        std::fs::write(dir.join("a.jpg"), testutils::jpeg_with_metadata()).unwrap();
        std::fs::write(dir.join("notes.txt"), b"notes").unwrap();
        std::fs::write(dir.join("broken.pdf"), b"%PDF-1.4 nope").unwrap();
        std::fs::create_dir(dir.join("sub")).unwrap();
        std::fs::write(dir.join("sub/b.png"), testutils::png_with_text_chunk()).unwrap();
        temp_dir
    }

    #[test]
    fn test_extension_selection() {
        let all = DirectorySanitizer::selected_extensions(&[]);
        assert_eq!(all, SUPPORTED_EXTENSIONS.to_vec());

        let requested = vec!["JPG".to_string(), ".png".to_string(), ".mp4".to_string()];
        assert_eq!(DirectorySanitizer::selected_extensions(&requested), vec![".jpg", ".png"]);
    }

    #[tokio::test]
    async fn test_recursive_pass_counts_outcomes() {
        let temp_dir = fixture();
        let stats = DirectorySanitizer::new(options(true, &[]))
            .run(temp_dir.path())
            .await
            .unwrap();

        assert_eq!(
            stats,
            SanitizeStats {
                total_files: 4,
                stripped: 2,
                skipped: 1,
                errors: 1,
            }
        );
        // Il PDF corrotto resta invariato
        assert_eq!(std::fs::read(temp_dir.path().join("broken.pdf")).unwrap(), b"%PDF-1.4 nope");
    }

    #[tokio::test]
    async fn test_non_recursive_with_selection() {
        let temp_dir = fixture();
        let original_png = std::fs::read(temp_dir.path().join("sub/b.png")).unwrap();

        let stats = DirectorySanitizer::new(options(false, &[".jpg"]))
            .run(temp_dir.path())
            .await
            .unwrap();

        assert_eq!(stats.total_files, 3);
        assert_eq!(stats.stripped, 1);
        assert_eq!(stats.skipped, 2);
        assert_eq!(std::fs::read(temp_dir.path().join("sub/b.png")).unwrap(), original_png);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_unreadable_subdirectory_counts_as_error() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = fixture();
        let sub = temp_dir.path().join("sub");
        std::fs::set_permissions(&sub, std::fs::Permissions::from_mode(0o000)).unwrap();
        // root legge comunque la cartella
        let readable = std::fs::read_dir(&sub).is_ok();

        let stats = DirectorySanitizer::new(options(true, &[]))
            .run(temp_dir.path())
            .await
            .unwrap();
        std::fs::set_permissions(&sub, std::fs::Permissions::from_mode(0o755)).unwrap();

        if readable {
            return;
        }
        assert_eq!(stats.total_files, 3);
        assert_eq!(stats.stripped, 1);
        assert_eq!(stats.errors, 2);
    }

    #[tokio::test]
    async fn test_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let result = DirectorySanitizer::new(options(true, &[]))
            .run(&temp_dir.path().join("missing"))
            .await;
        assert!(matches!(result, Err(OrganizeError::SourceMissing(_))));
    }
}
