//! # Conflict Resolution Module
//!
//! Evita di sovrascrivere file già presenti nella destinazione aggiungendo un
//! suffisso `_1`, `_2`, … prima dell'estensione.

use crate::organizer::path_resolver::PathResolver;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Risolve collisioni di nomi nella destinazione
pub struct ConflictResolver;

impl ConflictResolver {
    /// Primo path libero a partire da `desired` (deterministico per uno stato del disco)
    pub async fn resolve(desired: &Path) -> std::io::Result<PathBuf> {
        let mut candidate = desired.to_path_buf();
        let mut counter = 0;

        while tokio::fs::try_exists(&candidate).await? {
            counter += 1;
            candidate = PathResolver::with_suffix(desired, counter);
        }

        Ok(candidate)
    }

    /// Come `resolve`, ma riserva il nome creando il file in modo esclusivo.
    ///
    /// Il placeholder vuoto appartiene al chiamante, che lo sovrascrive con lo
    /// spostamento o lo rimuove se lo spostamento fallisce.
    pub async fn reserve(desired: &Path) -> std::io::Result<PathBuf> {
        let mut candidate = desired.to_path_buf();
        let mut counter = 0;

        loop {
            let created = tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&candidate)
                .await;

            match created {
                Ok(_) => return Ok(candidate),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    counter += 1;
                    candidate = PathResolver::with_suffix(desired, counter);
                    debug!("Name taken, trying {}", candidate.display());
                }
                Err(e) => return Err(e),
            }
        }
    }
}
