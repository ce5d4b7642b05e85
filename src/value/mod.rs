//! Value Model
//!
//! The tagged variants a KVP body can carry.
//!
//! ## Responsibilities
//! - Closed sum over JSON values, typed numeric arrays, and raw bytes
//! - Element-kind tags for the nine recognized typed-array types
//! - Typed constructors and accessors (little-endian element layout)

mod codec;

pub use codec::{decode_body, encode_body, BODY_PROBE_OFFSET, PROBE_BYTE};

use serde_json::Value as Json;

// =============================================================================
// Element Kinds
// =============================================================================

/// Element type of a typed numeric array.
///
/// The wire tags are the JavaScript typed-array constructor names, keeping
/// files interchangeable with browser-side writers. Unknown tags fail
/// decoding; the set is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    U8,
    U8Clamped,
    I16,
    U16,
    I32,
    U32,
    F32,
    F64,
    /// Opaque byte window with no element interpretation
    DataView,
}

impl ElementKind {
    /// The tag string persisted in descriptors
    pub fn tag(self) -> &'static str {
        match self {
            ElementKind::U8 => "Uint8Array",
            ElementKind::U8Clamped => "Uint8ClampedArray",
            ElementKind::I16 => "Int16Array",
            ElementKind::U16 => "Uint16Array",
            ElementKind::I32 => "Int32Array",
            ElementKind::U32 => "Uint32Array",
            ElementKind::F32 => "Float32Array",
            ElementKind::F64 => "Float64Array",
            ElementKind::DataView => "DataView",
        }
    }

    /// Parse a descriptor tag; `None` for anything outside the closed set
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "Uint8Array" => Some(ElementKind::U8),
            "Uint8ClampedArray" => Some(ElementKind::U8Clamped),
            "Int16Array" => Some(ElementKind::I16),
            "Uint16Array" => Some(ElementKind::U16),
            "Int32Array" => Some(ElementKind::I32),
            "Uint32Array" => Some(ElementKind::U32),
            "Float32Array" => Some(ElementKind::F32),
            "Float64Array" => Some(ElementKind::F64),
            "DataView" => Some(ElementKind::DataView),
            _ => None,
        }
    }

    /// Bytes per element (1 for DataView)
    pub fn element_size(self) -> usize {
        match self {
            ElementKind::U8 | ElementKind::U8Clamped | ElementKind::DataView => 1,
            ElementKind::I16 | ElementKind::U16 => 2,
            ElementKind::I32 | ElementKind::U32 | ElementKind::F32 => 4,
            ElementKind::F64 => 8,
        }
    }
}

// =============================================================================
// Typed Arrays
// =============================================================================

/// A typed numeric view: element kind plus exactly the accessible bytes.
///
/// Only the window travels through the store; any slack in the buffer the
/// view was taken from is not preserved.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedArrayValue {
    kind: ElementKind,
    data: Vec<u8>,
}

macro_rules! typed_ctor_accessor {
    ($ctor:ident, $accessor:ident, $elem:ty, $kind:expr) => {
        /// Build a view from a typed slice (little-endian element layout)
        pub fn $ctor(elems: &[$elem]) -> Self {
            let mut data = Vec::with_capacity(elems.len() * std::mem::size_of::<$elem>());
            for e in elems {
                data.extend_from_slice(&e.to_le_bytes());
            }
            TypedArrayValue { kind: $kind, data }
        }

        /// Reinterpret the window as typed elements.
        ///
        /// Returns `None` if the kind does not match or the window is not a
        /// whole number of elements.
        pub fn $accessor(&self) -> Option<Vec<$elem>> {
            const SIZE: usize = std::mem::size_of::<$elem>();
            if self.kind != $kind || self.data.len() % SIZE != 0 {
                return None;
            }
            Some(
                self.data
                    .chunks_exact(SIZE)
                    .map(|c| <$elem>::from_le_bytes(c.try_into().unwrap()))
                    .collect(),
            )
        }
    };
}

impl TypedArrayValue {
    /// Wrap raw bytes under an explicit element kind
    pub fn new(kind: ElementKind, data: Vec<u8>) -> Self {
        TypedArrayValue { kind, data }
    }

    /// Opaque byte window (the DataView kind)
    pub fn data_view(data: Vec<u8>) -> Self {
        TypedArrayValue {
            kind: ElementKind::DataView,
            data,
        }
    }

    /// Clamped-u8 view over raw bytes
    pub fn from_u8_clamped(bytes: &[u8]) -> Self {
        TypedArrayValue {
            kind: ElementKind::U8Clamped,
            data: bytes.to_vec(),
        }
    }

    typed_ctor_accessor!(from_u8, as_u8_vec, u8, ElementKind::U8);
    typed_ctor_accessor!(from_i16, as_i16_vec, i16, ElementKind::I16);
    typed_ctor_accessor!(from_u16, as_u16_vec, u16, ElementKind::U16);
    typed_ctor_accessor!(from_i32, as_i32_vec, i32, ElementKind::I32);
    typed_ctor_accessor!(from_u32, as_u32_vec, u32, ElementKind::U32);
    typed_ctor_accessor!(from_f32, as_f32_vec, f32, ElementKind::F32);
    typed_ctor_accessor!(from_f64, as_f64_vec, f64, ElementKind::F64);

    /// Element kind of this view
    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    /// The accessible bytes
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Number of whole elements in the window
    pub fn len(&self) -> usize {
        self.data.len() / self.kind.element_size()
    }

    /// True when the window is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Consume the view, keeping only the bytes
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }
}

// =============================================================================
// Values
// =============================================================================

/// A value as stored in one KVP record
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Any JSON value; `null` doubles as the tombstone
    Json(Json),
    /// A typed numeric view
    TypedArray(TypedArrayValue),
    /// An opaque byte buffer
    RawBytes(Vec<u8>),
}

impl Value {
    /// JSON value convenience constructor
    pub fn json(value: impl Into<Json>) -> Self {
        Value::Json(value.into())
    }

    /// The tombstone: JSON null
    pub fn null() -> Self {
        Value::Json(Json::Null)
    }

    /// Raw byte buffer convenience constructor
    pub fn raw(bytes: impl Into<Vec<u8>>) -> Self {
        Value::RawBytes(bytes.into())
    }

    /// Typed-array convenience constructor
    pub fn typed(array: TypedArrayValue) -> Self {
        Value::TypedArray(array)
    }

    /// True for the JSON-null tombstone
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Json(Json::Null))
    }

    /// Borrow the JSON payload, if this is the JSON variant
    pub fn as_json(&self) -> Option<&Json> {
        match self {
            Value::Json(v) => Some(v),
            _ => None,
        }
    }

    /// Borrow the typed view, if this is the typed-array variant
    pub fn as_typed(&self) -> Option<&TypedArrayValue> {
        match self {
            Value::TypedArray(t) => Some(t),
            _ => None,
        }
    }

    /// Borrow the raw bytes, if this is the raw variant
    pub fn as_raw(&self) -> Option<&[u8]> {
        match self {
            Value::RawBytes(b) => Some(b),
            _ => None,
        }
    }
}

impl From<Json> for Value {
    fn from(value: Json) -> Self {
        Value::Json(value)
    }
}

impl From<TypedArrayValue> for Value {
    fn from(array: TypedArrayValue) -> Self {
        Value::TypedArray(array)
    }
}
