//! # Image Processing Module
//!
//! Questo modulo rimuove i metadati incorporati nelle immagini lasciando intatti i pixel.
//!
//! ## Strategia per formato
//!
//! | Formato | Strategia | Blocchi rimossi |
//! |---------|-----------|-----------------|
//! | JPEG    | filtro dei segmenti (lossless) | APP1–APP13, APP15 (EXIF, XMP, ICC, IPTC), COM |
//! | PNG     | filtro dei chunk (lossless)   | eXIf, tEXt, zTXt, iTXt, iCCP, tIME |
//! | WebP    | filtro dei chunk RIFF         | EXIF, XMP, ICCP (+ flag in VP8X) |
//! | TIFF    | decodifica + ricodifica con `image` | tutti i tag non essenziali |
//! | BMP     | decodifica + ricodifica con `image` | - |
//!
//! JPEG, PNG e WebP non vengono mai ricompressi: i dati dell'immagine sono copiati
//! byte per byte, quindi una seconda passata produce esattamente lo stesso file.
//! APP0 (JFIF) e APP14 (Adobe) restano perché servono al decoder.
//!
//! Il formato reale viene rilevato dai magic bytes con `image::guess_format`, non
//! dall'estensione: un `.jpg` che in realtà è un PNG viene filtrato come PNG.

use crate::error::{OrganizeError, Result};
use crate::file_manager::FileManager;
use image::ImageFormat;
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
const PNG_METADATA_CHUNKS: &[&[u8]] = &[b"eXIf", b"tEXt", b"zTXt", b"iTXt", b"iCCP", b"tIME"];
const WEBP_METADATA_CHUNKS: &[&[u8]] = &[b"EXIF", b"XMP ", b"ICCP"];

// Flag VP8X: ICC (bit 5), EXIF (bit 3), XMP (bit 2)
const VP8X_METADATA_FLAGS: u8 = 0x20 | 0x08 | 0x04;

/// Rimuove i metadati da `source` e scrive il risultato in `target` (anche in-place)
pub fn strip_image_file(source: &Path, target: &Path) -> Result<()> {
    let bytes = std::fs::read(source)?;
    let stripped = strip_image_bytes(&bytes)?;
    debug!(
        "Stripped {} -> {} bytes: {}",
        bytes.len(),
        stripped.len(),
        source.display()
    );
    FileManager::write_atomically(target, &stripped)?;
    Ok(())
}

/// Versione in memoria di `strip_image_file`
pub fn strip_image_bytes(bytes: &[u8]) -> Result<Vec<u8>> {
    match image::guess_format(bytes)? {
        ImageFormat::Jpeg => strip_jpeg(bytes),
        ImageFormat::Png => strip_png(bytes),
        ImageFormat::WebP => strip_webp(bytes),
        format @ (ImageFormat::Tiff | ImageFormat::Bmp) => reencode(bytes, format),
        other => Err(OrganizeError::UnsupportedFormat(format!("{:?} image", other))),
    }
}

fn strip_jpeg(bytes: &[u8]) -> Result<Vec<u8>> {
    if bytes.len() < 4 || bytes[0] != 0xFF || bytes[1] != 0xD8 {
        return Err(OrganizeError::invalid("JPEG", "missing SOI marker"));
    }

    let mut out = Vec::with_capacity(bytes.len());
    out.extend_from_slice(&bytes[..2]);
    let mut pos = 2;

    loop {
        if pos >= bytes.len() {
            return Err(OrganizeError::invalid("JPEG", "no scan data"));
        }
        if bytes[pos] != 0xFF {
            return Err(OrganizeError::invalid(
                "JPEG",
                format!("expected marker at offset {}", pos),
            ));
        }
        // Byte di riempimento 0xFF prima del marker
        while pos < bytes.len() && bytes[pos] == 0xFF {
            pos += 1;
        }
        let Some(&marker) = bytes.get(pos) else {
            return Err(OrganizeError::invalid("JPEG", "truncated marker"));
        };
        pos += 1;

        match marker {
            // Start of scan / end of image: il resto è copiato così com'è
            0xDA | 0xD9 => {
                out.extend_from_slice(&[0xFF, marker]);
                out.extend_from_slice(&bytes[pos..]);
                return Ok(out);
            }
            0x01 | 0xD0..=0xD7 => {
                out.extend_from_slice(&[0xFF, marker]);
                continue;
            }
            _ => {}
        }

        if pos + 2 > bytes.len() {
            return Err(OrganizeError::invalid("JPEG", "truncated segment length"));
        }
        let length = u16::from_be_bytes([bytes[pos], bytes[pos + 1]]) as usize;
        let end = pos + length;
        if length < 2 || end > bytes.len() {
            return Err(OrganizeError::invalid(
                "JPEG",
                format!("segment 0x{:02X} overruns file", marker),
            ));
        }

        if !is_jpeg_metadata_marker(marker) {
            out.extend_from_slice(&[0xFF, marker]);
            out.extend_from_slice(&bytes[pos..end]);
        }
        pos = end;
    }
}

fn is_jpeg_metadata_marker(marker: u8) -> bool {
    matches!(marker, 0xE1..=0xED | 0xEF | 0xFE)
}

fn strip_png(bytes: &[u8]) -> Result<Vec<u8>> {
    if !bytes.starts_with(&PNG_SIGNATURE) {
        return Err(OrganizeError::invalid("PNG", "missing signature"));
    }

    let mut out = Vec::with_capacity(bytes.len());
    out.extend_from_slice(&PNG_SIGNATURE);
    let mut pos = PNG_SIGNATURE.len();

    loop {
        if pos + 12 > bytes.len() {
            return Err(OrganizeError::invalid("PNG", "missing IEND chunk"));
        }
        let length = u32::from_be_bytes([bytes[pos], bytes[pos + 1], bytes[pos + 2], bytes[pos + 3]]);
        let chunk_type = &bytes[pos + 4..pos + 8];
        // lunghezza + tipo + dati + CRC
        let end = (length as usize)
            .checked_add(pos + 12)
            .filter(|&end| end <= bytes.len())
            .ok_or_else(|| OrganizeError::invalid("PNG", "chunk overruns file"))?;

        if !PNG_METADATA_CHUNKS.contains(&chunk_type) {
            out.extend_from_slice(&bytes[pos..end]);
        }
        pos = end;

        if chunk_type == b"IEND" {
            return Ok(out);
        }
    }
}

fn strip_webp(bytes: &[u8]) -> Result<Vec<u8>> {
    if bytes.len() < 12 || &bytes[..4] != b"RIFF" || &bytes[8..12] != b"WEBP" {
        return Err(OrganizeError::invalid("WebP", "missing RIFF/WEBP header"));
    }
    let declared = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]) as usize;
    let riff_end = 8 + declared;
    if riff_end > bytes.len() {
        return Err(OrganizeError::invalid("WebP", "RIFF size exceeds file"));
    }

    let mut body = Vec::with_capacity(declared);
    body.extend_from_slice(b"WEBP");
    let mut pos = 12;

    while pos < riff_end {
        if pos + 8 > riff_end {
            return Err(OrganizeError::invalid("WebP", "truncated chunk header"));
        }
        let fourcc = &bytes[pos..pos + 4];
        let size = u32::from_le_bytes([bytes[pos + 4], bytes[pos + 5], bytes[pos + 6], bytes[pos + 7]]) as usize;
        let data_end = pos + 8 + size;
        if data_end > riff_end {
            return Err(OrganizeError::invalid("WebP", "chunk overruns file"));
        }
        // I chunk sono allineati a 2 byte; l'ultimo può mancare del padding
        let chunk_end = (data_end + (size & 1)).min(riff_end);

        if !WEBP_METADATA_CHUNKS.contains(&fourcc) {
            let start = body.len();
            body.extend_from_slice(&bytes[pos..chunk_end]);
            if fourcc == b"VP8X" && size > 0 {
                body[start + 8] &= !VP8X_METADATA_FLAGS;
            }
        }
        pos = chunk_end;
    }

    let riff_size = u32::try_from(body.len())
        .map_err(|_| OrganizeError::invalid("WebP", "file too large"))?;
    let mut out = Vec::with_capacity(body.len() + 8);
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&riff_size.to_le_bytes());
    out.extend_from_slice(&body);
    Ok(out)
}

/// Formati senza filtro lossless: ricodifica dei soli pixel
fn reencode(bytes: &[u8], format: ImageFormat) -> Result<Vec<u8>> {
    let image = image::load_from_memory_with_format(bytes, format)?;
    let mut out = Cursor::new(Vec::with_capacity(bytes.len()));
    image.write_to(&mut out, format)?;
    Ok(out.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutils;

    fn contains(haystack: &[u8], needle: &[u8]) -> bool {
        haystack.windows(needle.len()).any(|w| w == needle)
    }

    #[test]
    fn test_jpeg_exif_and_comment_removed_pixels_untouched() {
        let original = testutils::jpeg_with_metadata();
        assert!(contains(&original, b"Exif\0\0"));
        assert!(contains(&original, b"camera serial"));

        let stripped = strip_image_bytes(&original).unwrap();
        assert!(!contains(&stripped, b"Exif\0\0"));
        assert!(!contains(&stripped, b"camera serial"));
        assert!(stripped.len() < original.len());

        let before = image::load_from_memory(&original).unwrap().to_rgb8();
        let after = image::load_from_memory(&stripped).unwrap().to_rgb8();
        assert_eq!(before.as_raw(), after.as_raw());
    }

    #[test]
    fn test_restrip_is_idempotent() {
        let once = strip_image_bytes(&testutils::jpeg_with_metadata()).unwrap();
        let twice = strip_image_bytes(&once).unwrap();
        assert_eq!(once, twice);

        let png_once = strip_image_bytes(&testutils::png_with_text_chunk()).unwrap();
        let png_twice = strip_image_bytes(&png_once).unwrap();
        assert_eq!(png_once, png_twice);
    }

    #[test]
    fn test_webp_restrip_is_idempotent() {
        let once = strip_image_bytes(&testutils::webp_with_exif()).unwrap();
        let twice = strip_image_bytes(&once).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_png_text_chunk_removed() {
        let original = testutils::png_with_text_chunk();
        assert!(contains(&original, b"tEXt"));

        let stripped = strip_image_bytes(&original).unwrap();
        assert!(!contains(&stripped, b"tEXt"));
        assert!(stripped.ends_with(&[0xAE, 0x42, 0x60, 0x82]));

        let before = image::load_from_memory(&original).unwrap().to_rgba8();
        let after = image::load_from_memory(&stripped).unwrap().to_rgba8();
        assert_eq!(before.as_raw(), after.as_raw());
    }

    #[test]
    fn test_webp_metadata_chunks_removed() {
        let original = testutils::webp_with_exif();
        let stripped = strip_image_bytes(&original).unwrap();

        assert!(!contains(&stripped, b"EXIF"));
        assert!(contains(&stripped, b"VP8L"));
        assert_eq!(stripped[12..16], *b"VP8X");
        assert_eq!(stripped[20] & VP8X_METADATA_FLAGS, 0);

        let riff_size = u32::from_le_bytes([stripped[4], stripped[5], stripped[6], stripped[7]]);
        assert_eq!(riff_size as usize, stripped.len() - 8);
    }

    #[test]
    fn test_bmp_reencoded() {
        let original = testutils::bmp_image();
        let stripped = strip_image_bytes(&original).unwrap();

        let before = image::load_from_memory(&original).unwrap().to_rgb8();
        let after = image::load_from_memory(&stripped).unwrap().to_rgb8();
        assert_eq!(before.as_raw(), after.as_raw());
    }

    #[test]
    fn test_tiff_reencoded() {
        let original = testutils::tiff_image();
        assert_eq!(image::guess_format(&original).unwrap(), ImageFormat::Tiff);
        let stripped = strip_image_bytes(&original).unwrap();

        let before = image::load_from_memory(&original).unwrap().to_rgb8();
        let after = image::load_from_memory(&stripped).unwrap().to_rgb8();
        assert_eq!(before.as_raw(), after.as_raw());

        let again = strip_image_bytes(&stripped).unwrap();
        assert_eq!(stripped, again);
    }

    #[test]
    fn test_truncated_jpeg_rejected() {
        let original = testutils::jpeg_with_metadata();
        let truncated = &original[..10];
        assert!(matches!(
            strip_image_bytes(truncated),
            Err(OrganizeError::InvalidContainer { .. })
        ));
    }

    #[test]
    fn test_not_an_image_rejected() {
        assert!(strip_image_bytes(b"plain text, no magic").is_err());
    }
}
