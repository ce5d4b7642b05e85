//! Block Format Module
//!
//! The self-delimited on-disk units shared by the writer and reader.
//! A file is a sequence of blocks; the first is always a KVP block.
//!
//! ## File Format
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ KVP Block                                                    │
//! │   MAGIC0: u32 | MAGIC1: u32 | BLOCK_SIZE: u32 | KEY_SIZE: u32│
//! │   key: [KEY_SIZE] | body: [BLOCK_SIZE - 16 - KEY_SIZE - 4]   │
//! │   BACK_DISTANCE: u32                                         │
//! ├──────────────────────────────────────────────────────────────┤
//! │ Index Block                                                  │
//! │   MAGIC0: u32 | MAGIC1: u32 | BLOCK_SIZE: u32                │
//! │   content: [BLOCK_SIZE - 12 - 4]                             │
//! │   BACK_DISTANCE: u32                                         │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! `BLOCK_SIZE` covers the whole block, magic header and footer included.
//! `MAGIC1` is a per-block-type base plus the caller's `file_id`, so
//! applications can tell their files apart without changing the format.
//! The footer records the distance from its own first byte back to the
//! start of the nearest earlier Index block, or to the file start if no
//! index has been written yet.
//!
//! All integers are little-endian. `MAGIC0` spells "AOKV" when read as
//! LE bytes, so a byte-swapped file is recognizable at a glance.

mod codec;

use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

pub use codec::{
    decode_index_content, encode_index, encode_index_content, encode_kvp, kvp_body_size,
};

// =============================================================================
// Shared Constants (used by the codec, writer, and reader)
// =============================================================================

/// Fixed brand magic: the ASCII bytes "AOKV" read as a LE u32
pub const MAGIC0: u32 = 0x564B_4F41;

/// MAGIC1 base for KVP blocks (`+ file_id`)
pub const KVP_MAGIC_BASE: u32 = 0x93C1_AF97;

/// MAGIC1 base for Index blocks (`+ file_id`)
pub const INDEX_MAGIC_BASE: u32 = 0x93C1_AF98;

/// Inclusive upper bound of the MAGIC1 window reserved for file-id offsets.
/// Blocks whose MAGIC1 falls inside the window but matches neither base for
/// the reader's file id are skipped for forward compatibility.
pub const MAGIC_WINDOW_END: u32 = 0x93C1_B097;

/// Magic header size: MAGIC0 (4) + MAGIC1 (4) + BLOCK_SIZE (4) = 12 bytes
pub const MAGIC_HEADER_SIZE: u64 = 12;

/// KVP header size: magic header (12) + KEY_SIZE (4) = 16 bytes
pub const KVP_HEADER_SIZE: u64 = 16;

/// Index header size: just the magic header
pub const INDEX_HEADER_SIZE: u64 = 12;

/// Footer size: BACK_DISTANCE (4)
pub const FOOTER_SIZE: u64 = 4;

/// The largest fixed header; readers fetch this many bytes per block probe
pub const MAX_HEADER_SIZE: u64 = 16;

// =============================================================================
// Header Classification
// =============================================================================

/// What a block's magics say it is, relative to one reader's `file_id`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    /// A key-value record for this file id
    Kvp,
    /// An index snapshot for this file id
    Index,
    /// MAGIC1 inside the reserved window but for a different file id;
    /// sized, so it can be skipped
    ForeignInWindow,
    /// Not an AOKV block at all
    Foreign,
}

/// Classify a block's magic pair for the given `file_id`
pub fn classify_magic(magic0: u32, magic1: u32, file_id: u32) -> BlockKind {
    if magic0 != MAGIC0 {
        return BlockKind::Foreign;
    }
    if magic1 == KVP_MAGIC_BASE.wrapping_add(file_id) {
        BlockKind::Kvp
    } else if magic1 == INDEX_MAGIC_BASE.wrapping_add(file_id) {
        BlockKind::Index
    } else if (KVP_MAGIC_BASE..=MAGIC_WINDOW_END).contains(&magic1) {
        BlockKind::ForeignInWindow
    } else {
        BlockKind::Foreign
    }
}

/// Parse the three magic-header fields out of a raw buffer.
///
/// Returns `None` if the buffer holds fewer than 12 bytes.
pub fn parse_magic_header(buf: &[u8]) -> Option<(u32, u32, u32)> {
    if buf.len() < MAGIC_HEADER_SIZE as usize {
        return None;
    }
    let magic0 = u32::from_le_bytes(buf[0..4].try_into().unwrap());
    let magic1 = u32::from_le_bytes(buf[4..8].try_into().unwrap());
    let block_size = u32::from_le_bytes(buf[8..12].try_into().unwrap());
    Some((magic0, magic1, block_size))
}

// =============================================================================
// Index Entries
// =============================================================================

/// Location of one value body inside the file: `(size, absolute offset)`.
///
/// Persisted in index snapshots as a two-element JSON array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexEntry {
    /// Body size in bytes
    pub size: u32,
    /// Absolute byte offset of the body within the file
    pub offset: u64,
}

impl Serialize for IndexEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        (self.size, self.offset).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for IndexEntry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let (size, offset) = <(u32, u64)>::deserialize(deserializer)?;
        Ok(IndexEntry { size, offset })
    }
}

/// The in-memory index: key to body location, in first-insertion order
pub type KeyIndex = indexmap::IndexMap<String, IndexEntry>;
