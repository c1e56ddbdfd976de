//! # Document Processing Module
//!
//! Rimozione dei metadati dai PDF con `lopdf`.
//!
//! Il documento viene riscritto senza il dizionario `Info` del trailer (autore,
//! producer, date) e senza lo stream XMP `Metadata` del catalogo; gli oggetti rimasti
//! orfani vengono eliminati prima del salvataggio. Le pagine restano invariate.

use crate::error::{OrganizeError, Result};
use crate::file_manager::FileManager;
use lopdf::{Document, Object};
use std::path::Path;
use tracing::debug;

/// Riscrive `source` in `target` senza metadati del documento
pub fn strip_pdf_file(source: &Path, target: &Path) -> Result<()> {
    let bytes = std::fs::read(source)?;
    let stripped = strip_pdf_bytes(&bytes)?;
    FileManager::write_atomically(target, &stripped)?;
    Ok(())
}

pub fn strip_pdf_bytes(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut doc = Document::load_mem(bytes)?;

    if doc.trailer.remove(b"Info").is_some() {
        debug!("Removed document information dictionary");
    }

    let root = doc.trailer.get(b"Root").and_then(Object::as_reference);
    if let Ok(root_id) = root {
        if let Ok(catalog) = doc.get_object_mut(root_id).and_then(Object::as_dict_mut) {
            catalog.remove(b"Metadata");
        }
    }

    let pruned = doc.prune_objects();
    debug!("Pruned {} unreferenced objects", pruned.len());

    let mut out = Vec::with_capacity(bytes.len());
    doc.save_to(&mut out)
        .map_err(|e| OrganizeError::invalid("PDF", e.to_string()))?;
    Ok(out)
}
