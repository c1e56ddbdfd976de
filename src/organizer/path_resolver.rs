//! # Path Resolution Module
//!
//! Centralizza tutta la logica di naming delle cartelle numerate e dei file rinominati.
//! Usato sia dall'allocatore (resume) sia dalla pipeline dei worker.
//!
//! Layout prodotto: `destination/NNNN/MMMMMM.ext` con suffisso opzionale `_k`.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

/// Larghezza del nome cartella (`0001`)
pub const FOLDER_WIDTH: usize = 4;
/// Larghezza del nome file (`000001`)
pub const IDENTITY_WIDTH: usize = 6;

/// Utility per calcolare i path di destinazione in modo centralizzato
pub struct PathResolver;

impl PathResolver {
    /// Nome della cartella numerata, es. `7 -> "0007"`
    pub fn folder_name(index: u32) -> String {
        format!("{:0width$}", index, width = FOLDER_WIDTH)
    }

    /// Path della cartella numerata sotto la radice di destinazione
    pub fn folder_path(destination: &Path, index: u32) -> PathBuf {
        destination.join(Self::folder_name(index))
    }

    /// Nome file per una identità, conservando l'estensione originale (case incluso)
    pub fn file_name(identity: u64, source: &Path) -> OsString {
        Self::compose(
            &format!("{:0width$}", identity, width = IDENTITY_WIDTH),
            source.extension(),
        )
    }

    /// Path desiderato per un file dentro la sua cartella
    pub fn destination_path(folder: &Path, identity: u64, source: &Path) -> PathBuf {
        folder.join(Self::file_name(identity, source))
    }

    /// Inserisce il suffisso di disambiguazione `_k` prima dell'estensione
    pub fn with_suffix(desired: &Path, counter: u32) -> PathBuf {
        let stem = desired
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let name = Self::compose(&format!("{}_{}", stem, counter), desired.extension());
        desired.with_file_name(name)
    }

    /// Estrae l'identità da uno stem numerico, ignorando un suffisso `_k`.
    ///
    /// `"000042" -> Some(42)`, `"000042_3" -> Some(42)`, `"IMG_001" -> None`
    pub fn parse_identity(stem: &str) -> Option<u64> {
        let (number, suffix) = match stem.split_once('_') {
            Some((number, suffix)) => (number, Some(suffix)),
            None => (stem, None),
        };

        if !is_ascii_number(number) {
            return None;
        }
        if let Some(suffix) = suffix {
            if !is_ascii_number(suffix) {
                return None;
            }
        }

        number.parse().ok()
    }

    /// Indice di una cartella numerata (`"0012" -> Some(12)`)
    pub fn parse_folder_index(name: &str) -> Option<u32> {
        if is_ascii_number(name) {
            name.parse().ok()
        } else {
            None
        }
    }

    fn compose(stem: &str, extension: Option<&OsStr>) -> OsString {
        let mut name = OsString::from(stem);
        if let Some(ext) = extension {
            name.push(".");
            name.push(ext);
        }
        name
    }
}

fn is_ascii_number(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}
