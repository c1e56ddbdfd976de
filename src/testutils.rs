//! Fixture condivise dai test: immagini con metadati, PDF con dizionario Info.

use image::{DynamicImage, ImageOutputFormat, Rgb, RgbImage};
use lopdf::{dictionary, Document, Object, Stream};
use std::io::Cursor;
use std::path::Path;
use std::time::{Duration, SystemTime};

fn gradient() -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(16, 16, |x, y| {
        Rgb([(x * 16) as u8, (y * 16) as u8, 128])
    }))
}

fn encode(image: &DynamicImage, format: ImageOutputFormat) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    image.write_to(&mut out, format).unwrap();
    out.into_inner()
}

fn jpeg_segment(marker: u8, payload: &[u8]) -> Vec<u8> {
    let mut segment = vec![0xFF, marker];
    segment.extend_from_slice(&((payload.len() + 2) as u16).to_be_bytes());
    segment.extend_from_slice(payload);
    segment
}

fn crc32(bytes: &[u8]) -> u32 {
    let mut crc = 0xFFFF_FFFFu32;
    for &byte in bytes {
        crc ^= byte as u32;
        for _ in 0..8 {
            let mask = (crc & 1).wrapping_neg();
            crc = (crc >> 1) ^ (0xEDB8_8320 & mask);
        }
    }
    !crc
}

fn png_chunk(chunk_type: &[u8; 4], data: &[u8]) -> Vec<u8> {
    let mut chunk = (data.len() as u32).to_be_bytes().to_vec();
    let mut body = chunk_type.to_vec();
    body.extend_from_slice(data);
    chunk.extend_from_slice(&body);
    chunk.extend_from_slice(&crc32(&body).to_be_bytes());
    chunk
}

/// Plain PNG without ancillary chunks
pub fn png_image() -> Vec<u8> {
    encode(&gradient(), ImageOutputFormat::Png)
}

/// JPEG con segmento APP1 EXIF e commento COM subito dopo SOI
pub fn jpeg_with_metadata() -> Vec<u8> {
    let plain = encode(&gradient(), ImageOutputFormat::Jpeg(90));

    let mut exif = b"Exif\0\0MM\0*\0\0\0\x08".to_vec();
    exif.extend_from_slice(&[0u8; 16]);

    let mut out = plain[..2].to_vec();
    out.extend(jpeg_segment(0xE1, &exif));
    out.extend(jpeg_segment(0xFE, b"camera serial 0042"));
    out.extend_from_slice(&plain[2..]);
    out
}

/// PNG con chunk tEXt inserito dopo IHDR
pub fn png_with_text_chunk() -> Vec<u8> {
    let plain = png_image();
    // firma (8) + IHDR (4 + 4 + 13 + 4)
    let ihdr_end = 8 + 25;

    let mut out = plain[..ihdr_end].to_vec();
    out.extend(png_chunk(b"tEXt", b"Author\0Somebody"));
    out.extend_from_slice(&plain[ihdr_end..]);
    out
}

/// WebP sintetico: VP8X con flag EXIF, VP8L fittizio e chunk EXIF
pub fn webp_with_exif() -> Vec<u8> {
    let mut vp8x = vec![0x08 | 0x10, 0, 0, 0];
    vp8x.extend_from_slice(&[15, 0, 0, 15, 0, 0]);

    let mut body = b"WEBP".to_vec();
    for (fourcc, data) in [
        (b"VP8X", vp8x),
        (b"VP8L", vec![0x2F, 1, 2, 3, 4]),
        (b"EXIF", b"MM\0*\0\0\0\x08".to_vec()),
    ] {
        body.extend_from_slice(fourcc);
        body.extend_from_slice(&(data.len() as u32).to_le_bytes());
        body.extend_from_slice(&data);
        if data.len() % 2 == 1 {
            body.push(0);
        }
    }

    let mut out = b"RIFF".to_vec();
    out.extend_from_slice(&(body.len() as u32).to_le_bytes());
    out.extend(body);
    out
}

pub fn bmp_image() -> Vec<u8> {
    encode(&gradient(), ImageOutputFormat::Bmp)
}

/// TIFF senza metadati aggiuntivi
pub fn tiff_image() -> Vec<u8> {
    encode(&gradient(), ImageOutputFormat::Tiff)
}

/// PDF di una pagina con dizionario Info (autore e producer)
pub fn pdf_with_info() -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let content_id = doc.add_object(Stream::new(dictionary! {}, b"BT ET".to_vec()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    let info_id = doc.add_object(dictionary! {
        "Author" => Object::string_literal("Jane Roe"),
        "Producer" => Object::string_literal("Office Scanner 3000"),
    });
    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

/// Scrive un file e ne fissa la data di modifica a `offset` secondi dall'epoch
pub fn write_with_mtime(path: &Path, contents: &[u8], offset: u64) {
    std::fs::write(path, contents).unwrap();
    let mtime = SystemTime::UNIX_EPOCH + Duration::from_secs(1_600_000_000 + offset);
    filetime::set_file_mtime(path, filetime::FileTime::from_system_time(mtime)).unwrap();
}
