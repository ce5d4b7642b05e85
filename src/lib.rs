//! # AOKV
//!
//! An append-only key-value container format with:
//! - A streaming writer whose every output prefix is a valid store
//! - Periodic index snapshots for O(tail) reader bootstrap
//! - A positioned-read reader that treats truncation as a clean cut
//! - Opportunistic compression behind an in-band probe byte
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         Writer                               │
//! │   set/remove ──► value codec ──► block codec ──► chunk queue │
//! │                       │                                      │
//! │                  in-memory index ──► Index snapshots         │
//! └──────────────────────────┬───────────────────────────────────┘
//!                            │  pull-based ChunkStream
//!                            ▼
//!                   opaque byte stream (file, download, ...)
//!                            │
//! ┌──────────────────────────▼───────────────────────────────────┐
//! │                         Reader                               │
//! │   index(): tail walk ──► snapshot ──► forward scan           │
//! │   get(key): positioned read ──► value codec                  │
//! └──────────────────────────────────────────────────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod block;
pub mod value;
pub mod source;
pub mod writer;
pub mod reader;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{AokvError, Result};
pub use config::{IndexOptions, ReaderOptions, TransformFn, WriterOptions};
pub use value::{ElementKind, TypedArrayValue, Value};
pub use source::{ByteSource, FileSource, SliceSource};
pub use writer::{ChunkStream, Writer};
pub use reader::Reader;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of the aokv crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
