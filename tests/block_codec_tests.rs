//! Tests for the block codec
//!
//! These tests verify:
//! - KVP and Index block layouts, field by field
//! - Footer back-distance arithmetic
//! - Magic classification across file ids and the reserved window
//! - Index content JSON order preservation

use aokv::block::{
    classify_magic, decode_index_content, encode_index, encode_index_content, encode_kvp,
    kvp_body_size, parse_magic_header, BlockKind, IndexEntry, KeyIndex, INDEX_MAGIC_BASE,
    KVP_MAGIC_BASE, MAGIC0, MAGIC_WINDOW_END,
};
use aokv::AokvError;

// =============================================================================
// Helper Functions
// =============================================================================

fn u32_at(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes(bytes[offset..offset + 4].try_into().unwrap())
}

// =============================================================================
// KVP Block Layout
// =============================================================================

#[test]
fn test_kvp_block_layout() {
    let block = encode_kvp(0, b"hello", b"body-bytes", 0).unwrap();

    // 16-byte header + 5-byte key + 10-byte body + 4-byte footer
    assert_eq!(block.len(), 16 + 5 + 10 + 4);
    assert_eq!(u32_at(&block, 0), MAGIC0);
    assert_eq!(u32_at(&block, 4), KVP_MAGIC_BASE);
    assert_eq!(u32_at(&block, 8), block.len() as u32);
    assert_eq!(u32_at(&block, 12), 5);
    assert_eq!(&block[16..21], b"hello");
    assert_eq!(&block[21..31], b"body-bytes");
}

#[test]
fn test_kvp_magic_carries_file_id() {
    let block = encode_kvp(42, b"k", b"v", 0).unwrap();
    assert_eq!(u32_at(&block, 4), KVP_MAGIC_BASE + 42);
}

#[test]
fn test_kvp_footer_reaches_back_over_accumulated_distance() {
    let since_last_index = 1000;
    let block = encode_kvp(0, b"key", b"value", since_last_index).unwrap();

    let footer = u32_at(&block, block.len() - 4) as u64;
    // Footer start sits at since_last_index + header + key + body from the
    // reference point, and that is exactly what it must record
    assert_eq!(footer, since_last_index + 16 + 3 + 5);
}

#[test]
fn test_kvp_empty_key_and_body() {
    let block = encode_kvp(0, b"", b"", 0).unwrap();
    assert_eq!(block.len(), 20);
    assert_eq!(u32_at(&block, 12), 0);
}

#[test]
fn test_kvp_footer_at_u32_boundary() {
    // header (16) + key (1) + body (1) on top of the accumulated distance
    // parks the footer exactly at u32::MAX, the last value that fits
    let since_last_index = u32::MAX as u64 - 18;
    let block = encode_kvp(0, b"k", b"v", since_last_index).unwrap();
    assert_eq!(u32_at(&block, block.len() - 4), u32::MAX);
}

#[test]
fn test_kvp_footer_overflow_is_an_error() {
    // One byte further and the footer field cannot hold the distance; a
    // truncated value would send the tail walk to a garbage offset
    let since_last_index = u32::MAX as u64 - 17;
    let result = encode_kvp(0, b"k", b"v", since_last_index);
    assert!(matches!(result, Err(AokvError::BackDistanceOverflow(_))));
}

#[test]
fn test_kvp_body_size_derivation() {
    assert_eq!(kvp_body_size(16 + 3 + 5 + 4, 3), Some(5));
    assert_eq!(kvp_body_size(20, 0), Some(0));
    // Header fields claiming more key than block cannot be satisfied
    assert_eq!(kvp_body_size(20, 1), None);
}

// =============================================================================
// Index Block Layout
// =============================================================================

#[test]
fn test_index_block_layout() {
    let content = br#"{"k":[5,16]}"#;
    let block = encode_index(0, content).unwrap();

    assert_eq!(block.len(), 12 + content.len() + 4);
    assert_eq!(u32_at(&block, 0), MAGIC0);
    assert_eq!(u32_at(&block, 4), INDEX_MAGIC_BASE);
    assert_eq!(u32_at(&block, 8), block.len() as u32);
    assert_eq!(&block[12..12 + content.len()], content);
}

#[test]
fn test_index_footer_points_to_own_start() {
    let block = encode_index(0, b"{}").unwrap();

    let footer_offset = block.len() - 4;
    let back = u32_at(&block, footer_offset) as u64;
    // A reader at the block's end computes end - 4 - back and must land on
    // the first magic byte
    assert_eq!(block.len() as u64 - 4 - back, 0);
}

// =============================================================================
// Magic Classification
// =============================================================================

#[test]
fn test_classify_for_matching_file_id() {
    assert_eq!(classify_magic(MAGIC0, KVP_MAGIC_BASE, 0), BlockKind::Kvp);
    assert_eq!(classify_magic(MAGIC0, INDEX_MAGIC_BASE, 0), BlockKind::Index);
    assert_eq!(
        classify_magic(MAGIC0, KVP_MAGIC_BASE + 9, 9),
        BlockKind::Kvp
    );
    assert_eq!(
        classify_magic(MAGIC0, INDEX_MAGIC_BASE + 9, 9),
        BlockKind::Index
    );
}

#[test]
fn test_classify_foreign_file_id_stays_in_window() {
    // Another application's file id: skippable, not ours
    assert_eq!(
        classify_magic(MAGIC0, KVP_MAGIC_BASE + 7, 0),
        BlockKind::ForeignInWindow
    );
    assert_eq!(
        classify_magic(MAGIC0, MAGIC_WINDOW_END, 0),
        BlockKind::ForeignInWindow
    );
}

#[test]
fn test_classify_out_of_window() {
    assert_eq!(
        classify_magic(MAGIC0, MAGIC_WINDOW_END + 1, 0),
        BlockKind::Foreign
    );
    assert_eq!(classify_magic(MAGIC0, 0x1234_5678, 0), BlockKind::Foreign);
}

#[test]
fn test_classify_wrong_brand_magic() {
    assert_eq!(
        classify_magic(0xDEAD_BEEF, KVP_MAGIC_BASE, 0),
        BlockKind::Foreign
    );
}

#[test]
fn test_parse_magic_header_short_buffer() {
    assert!(parse_magic_header(&[0u8; 11]).is_none());
    assert!(parse_magic_header(&[0u8; 12]).is_some());
}

// =============================================================================
// Index Content JSON
// =============================================================================

#[test]
fn test_index_content_roundtrip_preserves_order() {
    let mut index = KeyIndex::new();
    index.insert("zebra".to_string(), IndexEntry { size: 5, offset: 16 });
    index.insert("apple".to_string(), IndexEntry { size: 9, offset: 60 });
    index.insert("mango".to_string(), IndexEntry { size: 2, offset: 99 });

    let content = encode_index_content(&index).unwrap();
    // On-disk form is a JSON object of [size, offset] pairs
    assert_eq!(content[0], b'{');

    let decoded = decode_index_content(&content).unwrap();
    let keys: Vec<_> = decoded.keys().cloned().collect();
    assert_eq!(keys, vec!["zebra", "apple", "mango"]);
    assert_eq!(decoded["apple"], IndexEntry { size: 9, offset: 60 });
}

#[test]
fn test_index_content_entry_shape() {
    let mut index = KeyIndex::new();
    index.insert("k".to_string(), IndexEntry { size: 7, offset: 21 });

    let content = encode_index_content(&index).unwrap();
    assert_eq!(String::from_utf8(content).unwrap(), r#"{"k":[7,21]}"#);
}

#[test]
fn test_index_content_empty_map() {
    let index = KeyIndex::new();
    let content = encode_index_content(&index).unwrap();
    assert_eq!(content, b"{}");
    assert!(decode_index_content(&content).unwrap().is_empty());
}
