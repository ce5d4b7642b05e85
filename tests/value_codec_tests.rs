//! Tests for the value codec
//!
//! These tests verify:
//! - Body round trips for every value variant
//! - The compression probe-byte rule on encode and decode
//! - Decode failures for malformed descriptors
//! - Typed-array window fidelity

use std::io::Read;

use serde_json::json;

use aokv::value::{decode_body, encode_body, ElementKind, TypedArrayValue, Value};
use aokv::{AokvError, TransformFn};

// =============================================================================
// Helper Functions
// =============================================================================

fn gzip() -> TransformFn {
    Box::new(|bytes| {
        use flate2::write::GzEncoder;
        use flate2::Compression;
        use std::io::Write;
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(bytes)?;
        Ok(encoder.finish()?)
    })
}

fn gunzip() -> TransformFn {
    Box::new(|bytes| {
        let mut decoder = flate2::read::GzDecoder::new(bytes);
        let mut out = Vec::new();
        decoder.read_to_end(&mut out)?;
        Ok(out)
    })
}

fn roundtrip(value: &Value) -> Value {
    let body = encode_body(value, None).unwrap();
    decode_body(body, None).unwrap()
}

// =============================================================================
// Round Trips Per Variant
// =============================================================================

#[test]
fn test_json_scalar_roundtrip() {
    assert_eq!(roundtrip(&Value::json("world")), Value::json("world"));
    assert_eq!(roundtrip(&Value::json(42)), Value::json(42));
    assert_eq!(roundtrip(&Value::null()), Value::null());
    assert_eq!(roundtrip(&Value::json(true)), Value::json(true));
}

#[test]
fn test_json_object_roundtrip() {
    let value = Value::Json(json!({
        "name": "aokv",
        "nested": { "amazing": [3, 1, 4, 1] },
        "flag": false
    }));
    assert_eq!(roundtrip(&value), value);
}

#[test]
fn test_typed_array_roundtrip() {
    let value = Value::typed(TypedArrayValue::from_u8(&[1, 2, 3, 4, 5]));
    let decoded = roundtrip(&value);

    let array = decoded.as_typed().unwrap();
    assert_eq!(array.kind(), ElementKind::U8);
    assert_eq!(array.as_u8_vec().unwrap(), vec![1, 2, 3, 4, 5]);
}

#[test]
fn test_typed_array_all_kinds() {
    let arrays = vec![
        TypedArrayValue::from_u8(&[7, 8]),
        TypedArrayValue::from_u8_clamped(&[0, 255]),
        TypedArrayValue::from_i16(&[-3, 9]),
        TypedArrayValue::from_u16(&[3, 65535]),
        TypedArrayValue::from_i32(&[-70_000, 1]),
        TypedArrayValue::from_u32(&[4_000_000_000, 0]),
        TypedArrayValue::from_f32(&[1.5, -0.25]),
        TypedArrayValue::from_f64(&[std::f64::consts::PI]),
        TypedArrayValue::data_view(vec![0xDE, 0xAD]),
    ];

    for array in arrays {
        let value = Value::typed(array.clone());
        let decoded = roundtrip(&value);
        let back = decoded.as_typed().unwrap();
        assert_eq!(back.kind(), array.kind());
        assert_eq!(back.data(), array.data());
    }
}

#[test]
fn test_raw_bytes_roundtrip() {
    let value = Value::raw(vec![0u8, 1, 2, 0x7B, 0xFF]);
    assert_eq!(roundtrip(&value), value);
}

#[test]
fn test_empty_raw_bytes() {
    let value = Value::raw(Vec::new());
    let decoded = roundtrip(&value);
    assert_eq!(decoded.as_raw().unwrap(), &[] as &[u8]);
}

// =============================================================================
// Typed-Array Fidelity
// =============================================================================

#[test]
fn test_typed_array_preserves_window_only() {
    // A view over the middle of a larger buffer carries just the window
    let backing: Vec<u8> = (0..32).collect();
    let window = &backing[8..13];

    let value = Value::typed(TypedArrayValue::new(ElementKind::U8, window.to_vec()));
    let decoded = roundtrip(&value);

    let array = decoded.as_typed().unwrap();
    assert_eq!(array.data(), window);
    assert_eq!(array.len(), 5);
}

#[test]
fn test_typed_accessor_rejects_kind_mismatch() {
    let array = TypedArrayValue::from_i16(&[1, 2, 3]);
    assert!(array.as_u32_vec().is_none());
    assert_eq!(array.as_i16_vec().unwrap(), vec![1, 2, 3]);
}

#[test]
fn test_typed_accessor_rejects_ragged_window() {
    // Three bytes cannot be whole i16 elements
    let array = TypedArrayValue::new(ElementKind::I16, vec![1, 2, 3]);
    assert!(array.as_i16_vec().is_none());
    assert_eq!(array.len(), 1); // one whole element fits
}

// =============================================================================
// Compression Probe
// =============================================================================

#[test]
fn test_compression_adopted_when_shorter() {
    let compressible = Value::json("a".repeat(4096));
    let plain = encode_body(&compressible, None).unwrap();
    let stored = encode_body(&compressible, Some(&gzip())).unwrap();

    assert!(stored.len() < plain.len());
    assert_ne!(stored[4], b'{');

    let decoded = decode_body(stored, Some(&gunzip())).unwrap();
    assert_eq!(decoded, compressible);
}

#[test]
fn test_compression_skipped_when_longer() {
    // Tiny bodies inflate under gzip, so the plain form must survive
    let value = Value::json(7);
    let plain = encode_body(&value, None).unwrap();
    let stored = encode_body(&value, Some(&gzip())).unwrap();

    assert_eq!(stored, plain);
    assert_eq!(stored[4], b'{');
}

#[test]
fn test_compression_rejected_on_probe_collision() {
    // A "compressor" whose shorter output carries '{' at the probe byte
    // must be discarded wholesale
    let colliding: TransformFn = Box::new(|_| Ok(vec![0, 0, 0, 0, 0x7B, 1]));

    let value = Value::json("a".repeat(1024));
    let plain = encode_body(&value, None).unwrap();
    let stored = encode_body(&value, Some(&colliding)).unwrap();

    assert_eq!(stored, plain);
}

#[test]
fn test_uncompressed_body_survives_configured_decompressor() {
    // Probe byte says plain, so the decompressor must not run
    let failing: TransformFn = Box::new(|_| {
        Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "must not be called",
        ))
    });

    let value = Value::json("small");
    let body = encode_body(&value, None).unwrap();
    let decoded = decode_body(body, Some(&failing)).unwrap();
    assert_eq!(decoded, value);
}

// =============================================================================
// Malformed Descriptors
// =============================================================================

fn body_with_descriptor(desc: &str) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(&(desc.len() as u32).to_le_bytes());
    body.extend_from_slice(desc.as_bytes());
    body
}

#[test]
fn test_unknown_variant_fails() {
    let body = body_with_descriptor(r#"{"t":9}"#);
    let result = decode_body(body, None);
    assert!(matches!(result, Err(AokvError::BadVariant(9))));
}

#[test]
fn test_unknown_element_type_fails() {
    let body = body_with_descriptor(r#"{"t":1,"a":"BigInt64Array"}"#);
    let result = decode_body(body, None);
    assert!(matches!(result, Err(AokvError::BadTypedArray(_))));
}

#[test]
fn test_missing_element_type_fails() {
    let body = body_with_descriptor(r#"{"t":1}"#);
    let result = decode_body(body, None);
    assert!(matches!(result, Err(AokvError::BadTypedArray(_))));
}

#[test]
fn test_missing_json_payload_reads_as_null() {
    // A writer may omit the payload field for undefined-like values
    let body = body_with_descriptor(r#"{"t":0}"#);
    let decoded = decode_body(body, None).unwrap();
    assert!(decoded.is_null());
}

#[test]
fn test_truncated_descriptor_is_short_read() {
    let mut body = body_with_descriptor(r#"{"t":0,"d":42}"#);
    body.truncate(8); // cut inside the descriptor
    let result = decode_body(body, None);
    assert!(matches!(result, Err(AokvError::ShortRead)));
}

#[test]
fn test_garbage_descriptor_fails() {
    let body = body_with_descriptor("{not json at all");
    let result = decode_body(body, None);
    assert!(matches!(result, Err(AokvError::BadDescriptor(_))));
}

// =============================================================================
// JSON Dialect Edge Cases
// =============================================================================

#[test]
fn test_non_finite_floats_store_as_null() {
    // serde_json has no representation for NaN or infinities; json! maps
    // them to null, which round-trips as the tombstone value
    let value = Value::json(json!(f64::NAN));
    assert!(value.is_null());
    assert!(roundtrip(&value).is_null());
}
