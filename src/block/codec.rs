//! Block codec
//!
//! Wraps bodies and index content in complete on-disk blocks, and
//! round-trips the index snapshot JSON.

use crate::error::{AokvError, Result};

use super::{
    KeyIndex, FOOTER_SIZE, INDEX_HEADER_SIZE, INDEX_MAGIC_BASE, KVP_HEADER_SIZE, KVP_MAGIC_BASE,
    MAGIC0,
};

/// Encode one complete KVP block.
///
/// `since_last_index` is the writer's running byte count from the start of
/// the most recent Index block (zero if none exists yet); the footer adds
/// the header, key, and body on top of it so the back-distance reaches from
/// the footer's first byte to that index start (or the file start).
///
/// Both the size and footer fields are u32 on disk; a block or distance
/// that cannot fit is an error, never a truncated field a reader would
/// chase to a garbage offset.
pub fn encode_kvp(file_id: u32, key: &[u8], body: &[u8], since_last_index: u64) -> Result<Vec<u8>> {
    let block_size = KVP_HEADER_SIZE + key.len() as u64 + body.len() as u64 + FOOTER_SIZE;
    let back = since_last_index + (block_size - FOOTER_SIZE);
    let block_size_field =
        u32::try_from(block_size).map_err(|_| AokvError::BlockTooLarge(block_size))?;
    let back_field = u32::try_from(back).map_err(|_| AokvError::BackDistanceOverflow(back))?;

    let mut block = Vec::with_capacity(block_size as usize);
    block.extend_from_slice(&MAGIC0.to_le_bytes());
    block.extend_from_slice(&KVP_MAGIC_BASE.wrapping_add(file_id).to_le_bytes());
    block.extend_from_slice(&block_size_field.to_le_bytes());
    block.extend_from_slice(&(key.len() as u32).to_le_bytes());
    block.extend_from_slice(key);
    block.extend_from_slice(body);
    block.extend_from_slice(&back_field.to_le_bytes());
    Ok(block)
}

/// Encode one complete Index block around already-serialized content.
///
/// The footer points back to this block's own start, so a tail walk that
/// lands on the footer resolves straight to the index header. Content too
/// large for the u32 size field is an error.
pub fn encode_index(file_id: u32, content: &[u8]) -> Result<Vec<u8>> {
    let block_size = INDEX_HEADER_SIZE + content.len() as u64 + FOOTER_SIZE;
    let block_size_field =
        u32::try_from(block_size).map_err(|_| AokvError::BlockTooLarge(block_size))?;
    let back_field = block_size_field - FOOTER_SIZE as u32;

    let mut block = Vec::with_capacity(block_size as usize);
    block.extend_from_slice(&MAGIC0.to_le_bytes());
    block.extend_from_slice(&INDEX_MAGIC_BASE.wrapping_add(file_id).to_le_bytes());
    block.extend_from_slice(&block_size_field.to_le_bytes());
    block.extend_from_slice(content);
    block.extend_from_slice(&back_field.to_le_bytes());
    Ok(block)
}

/// Serialize an index snapshot as JSON: `{ key: [size, offset], ... }`.
///
/// Keys are emitted in map order, which the writer keeps in first-insertion
/// order, so readers reproduce enumeration order from the snapshot alone.
pub fn encode_index_content(index: &KeyIndex) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(index)?)
}

/// Parse index snapshot JSON back into an ordered key map
pub fn decode_index_content(content: &[u8]) -> Result<KeyIndex> {
    Ok(serde_json::from_slice(content)?)
}

/// Body size of a KVP block, derived from its header fields
pub fn kvp_body_size(block_size: u64, key_size: u64) -> Option<u64> {
    block_size.checked_sub(KVP_HEADER_SIZE + key_size + FOOTER_SIZE)
}
