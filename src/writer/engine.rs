//! Writer engine
//!
//! Drives serialization, keeps the in-memory index, and decides when to
//! emit index snapshots.

use crossbeam::channel::{unbounded, Sender};

use crate::block::{self, IndexEntry, KeyIndex, KVP_HEADER_SIZE};
use crate::config::{TransformFn, WriterOptions};
use crate::error::{AokvError, Result};
use crate::value::{self, Value};

use super::ChunkStream;

/// Streaming writer for an append-only key-value container.
///
/// Every completed `set` is durable in the output up to the consumer's
/// pull position: any prefix of the emitted bytes that ends on a block
/// boundary is a valid store. `end()` is the only terminal transition;
/// it persists a final index snapshot and closes the stream.
pub struct Writer {
    file_id: u32,
    compress: Option<TransformFn>,
    sender: Sender<Vec<u8>>,

    /// Total bytes emitted so far
    total_size: u64,
    /// Live key map, in first-insertion order
    index_map: KeyIndex,
    /// Bytes since the start of the most recent index block (0 if none)
    since_last_index: u64,
    /// KVP bytes accumulated since the last snapshot
    kvp_bytes_since_index: u64,
    /// All index bytes ever written, for the amplification bound
    total_index_bytes: u64,

    max_back_distance: u64,
    snapshot_min_kvp_bytes: u64,
    snapshot_amplification: u64,
}

impl Writer {
    /// Create a writer and its chunk stream.
    ///
    /// The stream is the single consumer of the writer's output; hand it
    /// to whatever drains chunks (a file, a download sink, a test buffer).
    pub fn new(options: WriterOptions) -> (Self, ChunkStream) {
        let (sender, receiver) = unbounded();
        let writer = Writer {
            file_id: options.file_id,
            compress: options.compress,
            sender,
            total_size: 0,
            index_map: KeyIndex::new(),
            since_last_index: 0,
            kvp_bytes_since_index: 0,
            total_index_bytes: 0,
            max_back_distance: options.max_back_distance,
            snapshot_min_kvp_bytes: options.snapshot_min_kvp_bytes,
            snapshot_amplification: options.snapshot_amplification,
        };
        (writer, ChunkStream::new(receiver))
    }

    /// Write one key-value record.
    ///
    /// Updates the in-memory index, enqueues the block, and emits an index
    /// snapshot when the cadence conditions are met. Returns `SinkClosed`
    /// if the stream consumer is gone; state stays consistent either way,
    /// so callers may ignore that error.
    pub fn set(&mut self, key: &str, value: &Value) -> Result<()> {
        let key_bytes = key.as_bytes();
        if key_bytes.len() > u32::MAX as usize {
            return Err(AokvError::KeyTooLarge(key_bytes.len()));
        }

        let body = value::encode_body(value, self.compress.as_ref())?;
        let kvp = block::encode_kvp(self.file_id, key_bytes, &body, self.since_last_index)?;

        let body_offset = self.total_size + KVP_HEADER_SIZE + key_bytes.len() as u64;
        self.index_map.insert(
            key.to_string(),
            IndexEntry {
                size: body.len() as u32,
                offset: body_offset,
            },
        );

        let block_len = kvp.len() as u64;
        self.total_size += block_len;
        self.since_last_index += block_len;
        self.kvp_bytes_since_index += block_len;

        let delivered = self.sender.send(kvp).is_ok();
        self.maybe_snapshot()?;
        if !delivered {
            return Err(AokvError::SinkClosed);
        }
        Ok(())
    }

    /// Remove a key by writing the JSON-null tombstone
    pub fn remove(&mut self, key: &str) -> Result<()> {
        self.set(key, &Value::null())
    }

    /// Total bytes emitted so far
    pub fn size(&self) -> u64 {
        self.total_size
    }

    /// Number of live keys (tombstoned keys still count; they remain
    /// enumerable and decode to null)
    pub fn len(&self) -> usize {
        self.index_map.len()
    }

    /// True before the first write
    pub fn is_empty(&self) -> bool {
        self.index_map.is_empty()
    }

    /// The file id stamped into every block
    pub fn file_id(&self) -> u32 {
        self.file_id
    }

    /// Finish the stream: persist a final index snapshot, then close.
    ///
    /// Consumes the writer; the stream sees the remaining chunks followed
    /// by end-of-stream.
    pub fn end(mut self) -> Result<()> {
        self.write_index()
    }

    /// Emit a snapshot when either cadence condition holds: the
    /// back-distance bound (keeps footers inside u32), or the KVP volume
    /// threshold together with the amplification bound.
    fn maybe_snapshot(&mut self) -> Result<()> {
        let back_bound = self.since_last_index >= self.max_back_distance;
        let volume_bound = self.kvp_bytes_since_index >= self.snapshot_min_kvp_bytes
            && self.kvp_bytes_since_index
                >= self.snapshot_amplification * self.total_index_bytes;
        if back_bound || volume_bound {
            self.write_index()?;
        }
        Ok(())
    }

    /// Serialize the current index map into an Index block and enqueue it
    fn write_index(&mut self) -> Result<()> {
        let mut content = block::encode_index_content(&self.index_map)?;
        if let Some(compress) = &self.compress {
            let candidate = compress(&content)?;
            // Index probe is byte zero: '{' means uncompressed
            if candidate.len() < content.len()
                && candidate.first().is_some_and(|&b| b != value::PROBE_BYTE)
            {
                content = candidate;
            }
        }

        let index_block = block::encode_index(self.file_id, &content)?;
        let block_len = index_block.len() as u64;

        tracing::debug!(
            "Emitting index snapshot: {} keys, {} bytes at offset {}",
            self.index_map.len(),
            block_len,
            self.total_size
        );

        self.total_size += block_len;
        // Subsequent KVP footers measure from this block's start
        self.since_last_index = block_len;
        self.kvp_bytes_since_index = 0;
        self.total_index_bytes += block_len;

        self.sender
            .send(index_block)
            .map_err(|_| AokvError::SinkClosed)
    }
}
