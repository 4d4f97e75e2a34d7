//! Byte-order-mark aware text decoding for exported report files.
//!
//! The tester writes UTF-16 with a BOM; files re-saved by other tools are
//! usually UTF-8, with or without a BOM.

use crate::domain::error::ReconError;
use std::fs;
use std::path::Path;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
const UTF16_LE_BOM: &[u8] = &[0xFF, 0xFE];
const UTF16_BE_BOM: &[u8] = &[0xFE, 0xFF];

fn format_error(source_name: &str, reason: impl Into<String>) -> ReconError {
    ReconError::SourceFormat {
        source_name: source_name.to_string(),
        reason: reason.into(),
    }
}

fn decode_utf16(body: &[u8], source_name: &str, big_endian: bool) -> Result<String, ReconError> {
    if body.len() % 2 != 0 {
        return Err(format_error(source_name, "odd byte count in UTF-16 text"));
    }
    let units = body.chunks_exact(2).map(|pair| {
        if big_endian {
            u16::from_be_bytes([pair[0], pair[1]])
        } else {
            u16::from_le_bytes([pair[0], pair[1]])
        }
    });
    char::decode_utf16(units)
        .collect::<Result<String, _>>()
        .map_err(|e| format_error(source_name, e.to_string()))
}

/// Decodes `bytes`, honouring a leading BOM.
pub fn decode_text(bytes: &[u8], source_name: &str) -> Result<String, ReconError> {
    if let Some(body) = bytes.strip_prefix(UTF8_BOM) {
        return String::from_utf8(body.to_vec()).map_err(|e| format_error(source_name, e.to_string()));
    }
    if let Some(body) = bytes.strip_prefix(UTF16_LE_BOM) {
        return decode_utf16(body, source_name, false);
    }
    if let Some(body) = bytes.strip_prefix(UTF16_BE_BOM) {
        return decode_utf16(body, source_name, true);
    }
    String::from_utf8(bytes.to_vec()).map_err(|e| format_error(source_name, e.to_string()))
}

pub fn read_text(path: &Path) -> Result<String, ReconError> {
    let bytes = fs::read(path)?;
    decode_text(&bytes, &path.display().to_string())
}
