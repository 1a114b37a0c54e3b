//! MMR node types and SHA-256 merge implementation.
//!
//! Hash domain separation:
//! - Leaf nodes:     `sha256(0x00 || value)`
//! - Internal nodes: `sha256(0x01 || left_hash || right_hash)`
//!
//! The 0x00/0x01 domain tags prevent second-preimage attacks where a crafted
//! value could produce the same hash as an internal merge.

use sha2::{Digest, Sha256};

use crate::{Error, Result};

/// Domain tag prepended to leaf hash inputs: `sha256(LEAF_TAG || value)`.
const LEAF_TAG: u8 = 0x00;
/// Domain tag prepended to internal merge inputs: `sha256(INTERNAL_TAG || left
/// || right)`.
const INTERNAL_TAG: u8 = 0x01;

/// An MMR node: leaf nodes carry the committed value, internal nodes carry
/// only the merged hash.
///
/// `PartialEq` and `Eq` compare only the `hash` field, because the proof
/// verifier compares nodes by equality and a leaf node (value = Some) must
/// equal an internal reconstruction (value = None) when their hashes match.
#[derive(Clone, Debug)]
pub struct MmrNode {
    hash: [u8; 32],
    value: Option<Vec<u8>>,
}

impl PartialEq for MmrNode {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash
    }
}

impl Eq for MmrNode {}

impl MmrNode {
    /// Create a leaf node: `hash = sha256(0x00 || value)`.
    ///
    /// `value` is the committed leaf value — the 32-byte `ContentHash` of a
    /// sequenced entry, at the call sites that build a massif.
    pub fn leaf(value: Vec<u8>) -> Self {
        let hash = leaf_hash(&value);
        MmrNode {
            hash,
            value: Some(value),
        }
    }

    /// Create an internal node (hash only, no value).
    pub fn internal(hash: [u8; 32]) -> Self {
        MmrNode { hash, value: None }
    }

    /// The 32-byte SHA-256 hash identifying this node.
    pub fn hash(&self) -> [u8; 32] {
        self.hash
    }

    /// The raw value for leaf nodes; `None` for internal (hash-only) nodes.
    pub fn value(&self) -> Option<&[u8]> {
        self.value.as_deref()
    }

    /// Consume this node and return the raw value, if any.
    pub fn into_value(self) -> Option<Vec<u8>> {
        self.value
    }

    /// Merge two sibling nodes into a parent: `sha256(0x01 || left.hash ||
    /// right.hash)`.
    ///
    /// Also used for bagging peaks when computing the MMR root.
    pub fn merge(left: &MmrNode, right: &MmrNode) -> MmrNode {
        MmrNode::internal(merge_hash(&left.hash, &right.hash))
    }

    /// The serialized size in bytes.
    ///
    /// Internal nodes: 33 bytes (1 flag + 32 hash).
    /// Leaf nodes: 37 + value length (1 flag + 32 hash + 4 length + value).
    pub fn serialized_size(&self) -> u64 {
        match &self.value {
            None => 33,
            Some(val) => 37 + val.len() as u64,
        }
    }

    /// Serialize this node to bytes.
    ///
    /// Format: `flag(1) + hash(32) [+ value_len(4 BE) + value_bytes]`
    /// - flag 0x00 = internal node (no value)
    /// - flag 0x01 = leaf node (hash = sha256(0x00 || value))
    pub fn serialize(&self) -> Result<Vec<u8>> {
        match &self.value {
            None => {
                let mut buf = Vec::with_capacity(33);
                buf.push(0x00);
                buf.extend_from_slice(&self.hash);
                Ok(buf)
            }
            Some(val) => {
                if val.len() > u32::MAX as usize {
                    return Err(Error::InvalidData(format!(
                        "MmrNode value length {} exceeds u32::MAX",
                        val.len()
                    )));
                }
                let mut buf = Vec::with_capacity(37 + val.len());
                buf.push(0x01);
                buf.extend_from_slice(&self.hash);
                buf.extend_from_slice(&(val.len() as u32).to_be_bytes());
                buf.extend_from_slice(val);
                Ok(buf)
            }
        }
    }

    /// Deserialize a node from bytes.
    pub fn deserialize(data: &[u8]) -> Result<Self> {
        if data.len() < 33 {
            return Err(Error::InvalidData("data too short for MmrNode".into()));
        }
        let flag = data[0];
        let hash: [u8; 32] = data[1..33]
            .try_into()
            .map_err(|_| Error::InvalidData("bad hash bytes".into()))?;
        match flag {
            0x00 => {
                if data.len() != 33 {
                    return Err(Error::InvalidData(format!(
                        "internal node has {} trailing bytes",
                        data.len() - 33
                    )));
                }
                Ok(MmrNode { hash, value: None })
            }
            0x01 => {
                if data.len() < 37 {
                    return Err(Error::InvalidData("truncated leaf value length".into()));
                }
                let val_len = u32::from_be_bytes(
                    data[33..37]
                        .try_into()
                        .map_err(|_| Error::InvalidData("bad value length".into()))?,
                ) as usize;
                if data.len() != 37 + val_len {
                    return Err(Error::InvalidData(format!(
                        "leaf node expected {} bytes, got {}",
                        37 + val_len,
                        data.len()
                    )));
                }
                let value = data[37..37 + val_len].to_vec();
                let expected_hash = leaf_hash(&value);
                if hash != expected_hash {
                    return Err(Error::InvalidData(
                        "leaf hash does not match sha256(0x00 || value)".into(),
                    ));
                }
                Ok(MmrNode {
                    hash,
                    value: Some(value),
                })
            }
            _ => Err(Error::InvalidData(format!("unknown flag: 0x{:02x}", flag))),
        }
    }
}

/// Compute the domain-separated leaf hash: `sha256(0x00 || value)`.
pub fn leaf_hash(value: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update([LEAF_TAG]);
    hasher.update(value);
    let digest = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    out
}

/// SHA-256 merge with domain separation: `sha256(0x01 || left || right)`.
pub fn merge_hash(left: &[u8; 32], right: &[u8; 32]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update([INTERNAL_TAG]);
    hasher.update(left);
    hasher.update(right);
    let digest = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    out
}
