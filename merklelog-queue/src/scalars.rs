//! Scalar types of spec §3.1.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque 16-byte identifier (UUID) for a log.
///
/// String form is the canonical hex form: 32 lowercase hex digits, no
/// hyphens (the Open Question decision recorded in `DESIGN.md` — the spec
/// names "canonical hex form" without picking between that and UUID's own
/// hyphenated rendering; hex form is what the storage-path and sharding
/// hash consume directly).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LogId([u8; 16]);

impl LogId {
    /// Wrap raw bytes.
    pub const fn new(bytes: [u8; 16]) -> Self {
        LogId(bytes)
    }

    /// Generate a random v4 log id.
    pub fn random() -> Self {
        LogId(*uuid::Uuid::new_v4().as_bytes())
    }

    /// The raw 16 bytes.
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// Parse a 32-character lowercase hex string.
    pub fn parse_hex(s: &str) -> Option<Self> {
        if s.len() != 32 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let mut bytes = [0u8; 16];
        hex::decode_to_slice(s, &mut bytes).ok()?;
        Some(LogId(bytes))
    }
}

impl fmt::Display for LogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl From<uuid::Uuid> for LogId {
    fn from(id: uuid::Uuid) -> Self {
        LogId(*id.as_bytes())
    }
}

/// 32-byte SHA-256 of a signed statement's bytes — the committed value in
/// the leaf table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    /// Wrap raw bytes.
    pub const fn new(bytes: [u8; 32]) -> Self {
        ContentHash(bytes)
    }

    /// The raw 32 bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl From<[u8; 32]> for ContentHash {
    fn from(bytes: [u8; 32]) -> Self {
        ContentHash(bytes)
    }
}

/// 64-bit big-endian, timestamp-sortable identifier assigned at enqueue
/// time; monotonically nondecreasing per shard.
///
/// This implementation assigns `IdTimestamp` from the caller-supplied
/// enqueue wall-clock time in milliseconds, which is nondecreasing by
/// construction and distinct from `seq` (strictly increasing, but not
/// itself timestamp-derived).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct IdTimestamp(u64);

impl IdTimestamp {
    /// Wrap a raw millisecond timestamp.
    pub const fn new(millis: u64) -> Self {
        IdTimestamp(millis)
    }

    /// The raw value.
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Big-endian bytes, matching the leaf record's on-disk encoding.
    pub fn to_be_bytes(self) -> [u8; 8] {
        self.0.to_be_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_id_hex_round_trips() {
        let id = LogId::random();
        let s = id.to_string();
        assert_eq!(LogId::parse_hex(&s), Some(id));
    }

    #[test]
    fn log_id_rejects_wrong_length() {
        assert_eq!(LogId::parse_hex("abcd"), None);
    }

    #[test]
    fn content_hash_displays_as_hex() {
        let hash = ContentHash::new([0xAB; 32]);
        assert_eq!(hash.to_string(), "ab".repeat(32));
    }
}
