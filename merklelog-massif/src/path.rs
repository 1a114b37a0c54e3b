//! Bit-exact object-store key layout (spec §3.5, §4.2).

use crate::{Error, Result};

/// Which of the two key shapes a parsed path describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    /// `v2/merklelog/massifs/{h}/{logId}/{index:016x}.log`
    Massifs,
    /// `v2/merklelog/checkpoints/{h}/{logId}/{index:016x}.sth`
    Checkpoints,
}

impl PathKind {
    fn segment(self) -> &'static str {
        match self {
            PathKind::Massifs => "massifs",
            PathKind::Checkpoints => "checkpoints",
        }
    }

    fn extension(self) -> &'static str {
        match self {
            PathKind::Massifs => "log",
            PathKind::Checkpoints => "sth",
        }
    }
}

/// A parsed `v2/merklelog/...` storage path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoragePath {
    /// The log identifier segment, verbatim.
    pub log_id: String,
    /// 1-based massif height.
    pub massif_height: u8,
    /// Zero-based massif index.
    pub massif_index: u64,
    /// Whether this is a massif blob or a checkpoint.
    pub kind: PathKind,
}

/// Format a massif blob's storage path (spec §3.5).
pub fn massif_blob_path(log_id: &str, massif_height: u8, massif_index: u64) -> String {
    format_path(log_id, massif_height, massif_index, PathKind::Massifs)
}

/// Format a checkpoint's storage path (spec §3.5).
pub fn checkpoint_path(log_id: &str, massif_height: u8, massif_index: u64) -> String {
    format_path(log_id, massif_height, massif_index, PathKind::Checkpoints)
}

fn format_path(log_id: &str, massif_height: u8, massif_index: u64, kind: PathKind) -> String {
    format!(
        "v2/merklelog/{}/{}/{}/{:016x}.{}",
        kind.segment(),
        massif_height,
        log_id,
        massif_index,
        kind.extension(),
    )
}

/// Parse a storage path produced by [`massif_blob_path`] or
/// [`checkpoint_path`] (spec §4.2).
///
/// Fails with [`Error::UnrecognizedPath`] carrying a precise reason.
pub fn parse_storage_path(s: &str) -> Result<StoragePath> {
    let parts: Vec<&str> = s.split('/').collect();
    if parts.len() != 6 {
        return Err(Error::UnrecognizedPath(format!(
            "expected 6 path segments, got {}",
            parts.len()
        )));
    }
    if parts[0] != "v2" {
        return Err(Error::UnrecognizedPath(format!(
            "expected first segment 'v2', got '{}'",
            parts[0]
        )));
    }
    if parts[1] != "merklelog" {
        return Err(Error::UnrecognizedPath(format!(
            "expected second segment 'merklelog', got '{}'",
            parts[1]
        )));
    }
    let kind = match parts[2] {
        "massifs" => PathKind::Massifs,
        "checkpoints" => PathKind::Checkpoints,
        other => {
            return Err(Error::UnrecognizedPath(format!(
                "unrecognized kind segment '{other}', expected 'massifs' or 'checkpoints'"
            )));
        }
    };
    let massif_height: u8 = parts[3].parse().map_err(|_| {
        Error::UnrecognizedPath(format!("massif height '{}' is not a valid decimal u8", parts[3]))
    })?;
    let log_id = parts[4].to_string();
    let (index_part, extension) = parts[5].rsplit_once('.').ok_or_else(|| {
        Error::UnrecognizedPath(format!("filename '{}' has no extension", parts[5]))
    })?;
    if index_part.len() != 16 || !index_part.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(Error::UnrecognizedPath(
            "Massif index must be 16 hex digits".to_string(),
        ));
    }
    if index_part.bytes().any(|b| b.is_ascii_uppercase()) {
        return Err(Error::UnrecognizedPath(
            "Massif index must be 16 hex digits".to_string(),
        ));
    }
    let massif_index = u64::from_str_radix(index_part, 16)
        .map_err(|e| Error::BadHex(format!("massif index '{index_part}': {e}")))?;
    if extension != kind.extension() {
        return Err(Error::UnrecognizedPath(format!(
            "extension '.{extension}' does not match kind '{}' (expected '.{}')",
            parts[2],
            kind.extension()
        )));
    }
    Ok(StoragePath {
        log_id,
        massif_height,
        massif_index,
        kind,
    })
}
