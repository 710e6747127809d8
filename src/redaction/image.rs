//! Image redaction: strip EXIF/XMP metadata segments, leave pixel data
//! untouched (spec §4.9's third row). New module; no teacher analog. JPEG
//! and PNG get real segment/chunk surgery (both containers are simple
//! enough to parse by hand without a dependency neither the teacher nor
//! the pack carries); other metadata-capable image extensions fall back to
//! `RedactionUnsupported` and are copied unchanged, same as PDF.

use std::path::Path;

use crate::error::{FerretError, Result};

const JPEG_SOI: [u8; 2] = [0xFF, 0xD8];
const APP1: u8 = 0xE1; // EXIF / XMP
const APP13: u8 = 0xED; // Photoshop IRB (IPTC)

pub fn redact_file(path: &Path, output_path: &Path) -> Result<()> {
    let bytes = std::fs::read(path).map_err(|source| FerretError::Io { path: path.to_path_buf(), source })?;

    let stripped = if bytes.starts_with(&JPEG_SOI) {
        strip_jpeg_metadata(&bytes)
    } else if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        strip_png_metadata(&bytes)
    } else {
        return Err(FerretError::RedactionUnsupported {
            path: path.to_path_buf(),
            reason: "no metadata-stripping support for this image container".to_string(),
        });
    };

    if let Some(parent) = output_path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| FerretError::Io { path: parent.to_path_buf(), source })?;
    }
    std::fs::write(output_path, stripped).map_err(|source| FerretError::Io {
        path: output_path.to_path_buf(),
        source,
    })
}

/// Walks JPEG markers, dropping `APP1`/`APP13` segments (EXIF/XMP/IPTC)
/// and passing everything else — including the compressed scan data —
/// through byte-for-byte.
fn strip_jpeg_metadata(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len());
    out.extend_from_slice(&JPEG_SOI);
    let mut i = 2;

    while i + 4 <= bytes.len() {
        if bytes[i] != 0xFF {
            // Entropy-coded scan data or trailing bytes: copy the rest verbatim.
            out.extend_from_slice(&bytes[i..]);
            return out;
        }
        let marker = bytes[i + 1];
        if marker == 0xD8 || marker == 0xD9 || (0xD0..=0xD7).contains(&marker) {
            out.extend_from_slice(&bytes[i..i + 2]);
            i += 2;
            continue;
        }
        if marker == 0xDA {
            // Start of scan: header plus all following compressed data.
            out.extend_from_slice(&bytes[i..]);
            return out;
        }

        let len = u16::from_be_bytes([bytes[i + 2], bytes[i + 3]]) as usize;
        let segment_end = (i + 2 + len).min(bytes.len());
        if marker != APP1 && marker != APP13 {
            out.extend_from_slice(&bytes[i..segment_end]);
        }
        i = segment_end;
    }

    if i < bytes.len() {
        out.extend_from_slice(&bytes[i..]);
    }
    out
}

/// Drops PNG ancillary text chunks (`tEXt`, `zTXt`, `iTXt`) that carry
/// free-form metadata, keeping every critical/image chunk untouched.
fn strip_png_metadata(bytes: &[u8]) -> Vec<u8> {
    const SIGNATURE_LEN: usize = 8;
    let mut out = Vec::with_capacity(bytes.len());
    out.extend_from_slice(&bytes[..SIGNATURE_LEN.min(bytes.len())]);

    let mut i = SIGNATURE_LEN;
    while i + 8 <= bytes.len() {
        let length = u32::from_be_bytes([bytes[i], bytes[i + 1], bytes[i + 2], bytes[i + 3]]) as usize;
        let chunk_type = &bytes[i + 4..i + 8];
        let chunk_end = (i + 8 + length + 4).min(bytes.len()); // +4 CRC

        let drop = matches!(chunk_type, b"tEXt" | b"zTXt" | b"iTXt");
        if !drop {
            out.extend_from_slice(&bytes[i..chunk_end]);
        }
        if chunk_type == b"IEND" {
            break;
        }
        i = chunk_end;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn jpeg_with_app1(payload: &[u8]) -> Vec<u8> {
        let mut bytes = vec![0xFF, 0xD8]; // SOI
        bytes.push(0xFF);
        bytes.push(APP1);
        let len = (payload.len() + 2) as u16;
        bytes.extend_from_slice(&len.to_be_bytes());
        bytes.extend_from_slice(payload);
        bytes.push(0xFF);
        bytes.push(0xDA); // SOS
        bytes.extend_from_slice(&[0x00, 0x02]); // minimal SOS header length
        bytes.extend_from_slice(b"\x00\x01\x02\x03"); // fake scan data
        bytes.push(0xFF);
        bytes.push(0xD9); // EOI
        bytes
    }

    #[test]
    fn strips_app1_exif_segment() {
        let input = jpeg_with_app1(b"Exif\0\0GPS data here");
        let out = strip_jpeg_metadata(&input);
        assert!(!contains_bytes(&out, b"GPS data here"));
        assert!(out.starts_with(&[0xFF, 0xD8]));
        assert!(out.ends_with(&[0xFF, 0xD9]));
    }

    #[test]
    fn round_trips_via_redact_file() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("a.jpg");
        let output = dir.path().join("out/a.jpg");
        std::fs::write(&input, jpeg_with_app1(b"Exif\0\0secret location data")).unwrap();

        redact_file(&input, &output).unwrap();
        let out_bytes = std::fs::read(&output).unwrap();
        assert!(!contains_bytes(&out_bytes, b"secret location data"));
    }

    fn contains_bytes(haystack: &[u8], needle: &[u8]) -> bool {
        haystack.windows(needle.len()).any(|w| w == needle)
    }
}
