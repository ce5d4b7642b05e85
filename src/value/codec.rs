//! Value codec
//!
//! Encodes a value into a self-describing body and back.
//!
//! ## Body Format
//! ```text
//! ┌───────────────┬──────────────────────────┬──────────────┐
//! │ DESC_SIZE: u32│ descriptor: UTF-8 JSON   │ post: bytes  │
//! └───────────────┴──────────────────────────┴──────────────┘
//! ```
//!
//! The descriptor is `{t, a?, d?}`: `t` selects the variant, `a` carries
//! the element-type tag for typed arrays, `d` carries the JSON payload.
//! The post bytes exist only for typed arrays and raw buffers.
//!
//! ## Compression Probe
//!
//! A configured compressor may replace the whole body, but only when its
//! output is strictly shorter and its fifth byte differs from `{` (0x7B).
//! An uncompressed body always reads `u32 | '{'` at that position, so the
//! fifth byte alone tells the decoder which form it is looking at. Index
//! content uses the same trick at byte zero.

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use crate::config::TransformFn;
use crate::error::{AokvError, Result};

use super::{ElementKind, TypedArrayValue, Value};

/// The probe byte: `{`, the first character of any descriptor or index JSON
pub const PROBE_BYTE: u8 = 0x7B;

/// Offset of the probe byte within a body (right after the u32 size prefix)
pub const BODY_PROBE_OFFSET: usize = 4;

const VARIANT_JSON: u8 = 0;
const VARIANT_TYPED: u8 = 1;
const VARIANT_RAW: u8 = 2;

/// The descriptor persisted at the head of every body
#[derive(Debug, Serialize, Deserialize)]
struct Descriptor {
    t: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    a: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    d: Option<Json>,
}

/// Encode a value into body bytes, applying opportunistic compression.
///
/// The compressed form is adopted only when it is strictly shorter and
/// passes the probe-byte rule; otherwise the plain body is kept, even if
/// the compressor produced output.
pub fn encode_body(value: &Value, compress: Option<&TransformFn>) -> Result<Vec<u8>> {
    let (descriptor, post): (Descriptor, &[u8]) = match value {
        Value::Json(v) => (
            Descriptor {
                t: VARIANT_JSON,
                a: None,
                d: Some(v.clone()),
            },
            &[],
        ),
        Value::TypedArray(array) => (
            Descriptor {
                t: VARIANT_TYPED,
                a: Some(array.kind().tag().to_string()),
                d: None,
            },
            array.data(),
        ),
        Value::RawBytes(bytes) => (
            Descriptor {
                t: VARIANT_RAW,
                a: None,
                d: None,
            },
            bytes,
        ),
    };

    let desc_json = serde_json::to_vec(&descriptor)?;
    let mut body = Vec::with_capacity(4 + desc_json.len() + post.len());
    body.extend_from_slice(&(desc_json.len() as u32).to_le_bytes());
    body.extend_from_slice(&desc_json);
    body.extend_from_slice(post);

    if let Some(compress) = compress {
        let candidate = compress(&body)?;
        if candidate.len() < body.len()
            && candidate
                .get(BODY_PROBE_OFFSET)
                .is_some_and(|&b| b != PROBE_BYTE)
        {
            return Ok(candidate);
        }
    }
    Ok(body)
}

/// Decode body bytes back into a value.
///
/// Runs the decompressor first when one is configured and the probe byte
/// says the body is compressed. A body too short to hold the descriptor it
/// claims fails with `ShortRead`, which the reader maps to absence.
pub fn decode_body(body: Vec<u8>, decompress: Option<&TransformFn>) -> Result<Value> {
    let body = match decompress {
        Some(decompress) if body.len() > BODY_PROBE_OFFSET && body[BODY_PROBE_OFFSET] != PROBE_BYTE => {
            decompress(&body)?
        }
        _ => body,
    };

    if body.len() < 4 {
        return Err(AokvError::ShortRead);
    }
    let desc_size = u32::from_le_bytes(body[0..4].try_into().unwrap()) as usize;
    if body.len() < 4 + desc_size {
        return Err(AokvError::ShortRead);
    }

    let descriptor: Descriptor = serde_json::from_slice(&body[4..4 + desc_size])?;
    let post = &body[4 + desc_size..];

    match descriptor.t {
        VARIANT_JSON => Ok(Value::Json(descriptor.d.unwrap_or(Json::Null))),
        VARIANT_TYPED => {
            let tag = descriptor
                .a
                .ok_or_else(|| AokvError::BadTypedArray("missing element type tag".to_string()))?;
            let kind = ElementKind::from_tag(&tag).ok_or(AokvError::BadTypedArray(tag))?;
            Ok(Value::TypedArray(TypedArrayValue::new(kind, post.to_vec())))
        }
        VARIANT_RAW => Ok(Value::RawBytes(post.to_vec())),
        t => Err(AokvError::BadVariant(t)),
    }
}
