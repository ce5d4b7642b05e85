//! Error types for AOKV
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using AokvError
pub type Result<T> = std::result::Result<T, AokvError>;

/// Unified error type for AOKV operations
#[derive(Debug, Error)]
pub enum AokvError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Container Errors
    // -------------------------------------------------------------------------
    #[error("not an AOKV file: first block magic mismatch")]
    NotAokv,

    #[error("unrecognized block at offset {0}")]
    UnrecognizedBlock(u64),

    #[error("key at offset {0} is not valid UTF-8")]
    BadKeyEncoding(u64),

    /// A read ended before a complete block or body was available.
    ///
    /// Non-fatal: the reader absorbs it and treats the file as truncated
    /// at that point.
    #[error("short read: data truncated")]
    ShortRead,

    // -------------------------------------------------------------------------
    // Value Codec Errors
    // -------------------------------------------------------------------------
    #[error("unknown value variant: {0}")]
    BadVariant(u8),

    #[error("unknown typed-array element type: {0}")]
    BadTypedArray(String),

    #[error("malformed descriptor: {0}")]
    BadDescriptor(#[from] serde_json::Error),

    // -------------------------------------------------------------------------
    // Writer Errors
    // -------------------------------------------------------------------------
    /// The stream consumer was dropped; the chunk could not be delivered.
    /// Callers that do not care about delivery may ignore this.
    #[error("stream consumer disconnected")]
    SinkClosed,

    #[error("key length {0} exceeds the u32 limit")]
    KeyTooLarge(usize),

    #[error("back distance {0} does not fit the u32 footer field")]
    BackDistanceOverflow(u64),

    #[error("block size {0} does not fit the u32 header field")]
    BlockTooLarge(u64),

    // -------------------------------------------------------------------------
    // Reader State Errors
    // -------------------------------------------------------------------------
    #[error("reader is not indexed yet: call index() first")]
    NotIndexed,
}
