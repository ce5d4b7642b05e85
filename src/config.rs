//! Configuration for AOKV
//!
//! Option structs for the writer and reader, with sensible defaults.

use std::fmt;
use std::io;

/// An opaque byte-buffer transform: a compressor or its inverse.
///
/// The container format relies only on the probe-byte rule, never on any
/// transform-specific framing, so anything with this shape plugs in.
pub type TransformFn = Box<dyn Fn(&[u8]) -> io::Result<Vec<u8>> + Send>;

// =============================================================================
// Writer Options
// =============================================================================

/// Options for a [`Writer`](crate::Writer)
pub struct WriterOptions {
    /// Offset added to both block magics, letting applications tell their
    /// files apart from unrelated AOKV files (useful range 0..=255)
    pub file_id: u32,

    /// Optional compressor applied to bodies and index content under the
    /// probe-byte rule
    pub compress: Option<TransformFn>,

    /// Emit an index snapshot once this many bytes have accumulated since
    /// the last one, keeping footer back-distances inside u32. Raising it
    /// far enough for a distance to pass `u32::MAX` makes the writer fail
    /// with `BackDistanceOverflow` rather than emit a falsified footer
    pub max_back_distance: u64,

    /// No snapshot is considered before this many KVP bytes have
    /// accumulated since the last one
    pub snapshot_min_kvp_bytes: u64,

    /// Snapshot only once KVP bytes since the last snapshot reach this
    /// multiple of all index bytes written so far, bounding the persistent
    /// index overhead to roughly its reciprocal
    pub snapshot_amplification: u64,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            file_id: 0,
            compress: None,
            max_back_distance: 1 << 30,
            snapshot_min_kvp_bytes: 1 << 16,
            snapshot_amplification: 64,
        }
    }
}

impl WriterOptions {
    /// Create a new options builder
    pub fn builder() -> WriterOptionsBuilder {
        WriterOptionsBuilder::default()
    }
}

impl fmt::Debug for WriterOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriterOptions")
            .field("file_id", &self.file_id)
            .field("compress", &self.compress.is_some())
            .field("max_back_distance", &self.max_back_distance)
            .field("snapshot_min_kvp_bytes", &self.snapshot_min_kvp_bytes)
            .field("snapshot_amplification", &self.snapshot_amplification)
            .finish()
    }
}

/// Builder for [`WriterOptions`]
#[derive(Default)]
pub struct WriterOptionsBuilder {
    options: WriterOptions,
}

impl WriterOptionsBuilder {
    /// Set the file id
    pub fn file_id(mut self, file_id: u32) -> Self {
        self.options.file_id = file_id;
        self
    }

    /// Install a compressor
    pub fn compress(mut self, compress: TransformFn) -> Self {
        self.options.compress = Some(compress);
        self
    }

    /// Override the back-distance snapshot bound
    pub fn max_back_distance(mut self, bytes: u64) -> Self {
        self.options.max_back_distance = bytes;
        self
    }

    /// Override the minimum KVP bytes between snapshots
    pub fn snapshot_min_kvp_bytes(mut self, bytes: u64) -> Self {
        self.options.snapshot_min_kvp_bytes = bytes;
        self
    }

    /// Override the amplification factor
    pub fn snapshot_amplification(mut self, factor: u64) -> Self {
        self.options.snapshot_amplification = factor;
        self
    }

    /// Finish building
    pub fn build(self) -> WriterOptions {
        self.options
    }
}

// =============================================================================
// Reader Options
// =============================================================================

/// Options for a [`Reader`](crate::Reader)
#[derive(Default)]
pub struct ReaderOptions {
    /// File id the block magics must match
    pub file_id: u32,

    /// Optional decompressor, the inverse of the writer's compressor
    pub decompress: Option<TransformFn>,
}

impl ReaderOptions {
    /// Options for the given file id with no decompressor
    pub fn with_file_id(file_id: u32) -> Self {
        Self {
            file_id,
            decompress: None,
        }
    }

    /// Install a decompressor
    pub fn decompress(mut self, decompress: TransformFn) -> Self {
        self.decompress = Some(decompress);
        self
    }
}

impl fmt::Debug for ReaderOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReaderOptions")
            .field("file_id", &self.file_id)
            .field("decompress", &self.decompress.is_some())
            .finish()
    }
}

// =============================================================================
// Indexing Options
// =============================================================================

/// Options for [`Reader::index`](crate::Reader::index)
#[derive(Debug, Clone, Copy)]
pub struct IndexOptions {
    /// Verify the file opens with a KVP block for this file id
    /// (fails with `NotAokv` otherwise)
    pub check_first_header: bool,

    /// Fail the forward scan on unrecognized blocks instead of skipping
    /// or stopping cleanly
    pub check_headers: bool,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            check_first_header: true,
            check_headers: false,
        }
    }
}
