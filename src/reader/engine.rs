//! Reader engine
//!
//! Builds the key map once during `index()`, then serves lazy positioned
//! lookups. Any prefix of a writer's output indexes cleanly: short reads
//! and partial tail blocks end the scan instead of failing it.

use crate::block::{
    self, BlockKind, IndexEntry, KeyIndex, FOOTER_SIZE, INDEX_HEADER_SIZE, KVP_HEADER_SIZE,
    KVP_MAGIC_BASE, MAGIC0, MAGIC_HEADER_SIZE, MAX_HEADER_SIZE,
};
use crate::config::{IndexOptions, ReaderOptions};
use crate::error::{AokvError, Result};
use crate::source::{ByteSource, FileSource};
use crate::value::{self, Value};

/// Reader over an append-only key-value container.
///
/// Starts fresh; `index()` moves it to the indexed state, after which
/// `keys()` enumerates in first-insertion order and `get()` materializes
/// values on demand. Values are not cached.
pub struct Reader<S: ByteSource> {
    source: S,
    file_size: u64,
    file_id: u32,
    decompress: Option<crate::config::TransformFn>,
    index_map: KeyIndex,
    indexed: bool,
}

impl Reader<FileSource> {
    /// Open a file-backed reader, capturing the file's length as the
    /// truncation horizon
    pub fn open(path: impl AsRef<std::path::Path>, options: ReaderOptions) -> Result<Self> {
        let (source, file_size) = FileSource::open(path)?;
        Ok(Reader::new(source, file_size, options))
    }
}

impl<S: ByteSource> Reader<S> {
    /// Create a reader over a byte source of the given size
    pub fn new(source: S, file_size: u64, options: ReaderOptions) -> Self {
        Reader {
            source,
            file_size,
            file_id: options.file_id,
            decompress: options.decompress,
            index_map: KeyIndex::new(),
            indexed: false,
        }
    }

    /// Build the key map.
    ///
    /// Verifies the first block's magics (unless disabled), walks the tail
    /// back-pointer to the latest index snapshot, then forward-scans any
    /// newer blocks. Every failure past the first-header check ends the
    /// scan cleanly, yielding the map of whatever was durably written.
    pub fn index(&mut self, options: IndexOptions) -> Result<()> {
        if options.check_first_header {
            self.check_first_header()?;
        }

        let scan_from = self.tail_walk()?;
        self.forward_scan(scan_from, options.check_headers)?;

        self.indexed = true;
        tracing::debug!(
            "Indexed {} keys over {} bytes",
            self.index_map.len(),
            self.file_size
        );
        Ok(())
    }

    /// All known keys, in first-occurrence order
    pub fn keys(&self) -> Result<Vec<String>> {
        if !self.indexed {
            return Err(AokvError::NotIndexed);
        }
        Ok(self.index_map.keys().cloned().collect())
    }

    /// Number of known keys
    pub fn len(&self) -> usize {
        self.index_map.len()
    }

    /// True when no keys are known
    pub fn is_empty(&self) -> bool {
        self.index_map.is_empty()
    }

    /// Look up one value.
    ///
    /// Returns `None` for unknown keys and for bodies cut off by
    /// truncation. A stored JSON null decodes to `Value::Json(Null)`,
    /// which callers treat as removed.
    pub fn get(&mut self, key: &str) -> Result<Option<Value>> {
        if !self.indexed {
            return Err(AokvError::NotIndexed);
        }
        let entry = match self.index_map.get(key) {
            Some(entry) => *entry,
            None => return Ok(None),
        };

        let body = match self.read_exact_at(entry.size as u64, entry.offset)? {
            Some(body) => body,
            None => return Ok(None),
        };

        match value::decode_body(body, self.decompress.as_ref()) {
            Ok(value) => Ok(Some(value)),
            Err(AokvError::ShortRead) => Ok(None),
            Err(e) => Err(e),
        }
    }

    // =========================================================================
    // Indexing Internals
    // =========================================================================

    /// Fail with `NotAokv` unless offset 0 opens a KVP block for our file id
    fn check_first_header(&mut self) -> Result<()> {
        let head = self.read_exact_at(MAGIC_HEADER_SIZE, 0)?;
        let ok = head
            .as_deref()
            .and_then(block::parse_magic_header)
            .is_some_and(|(magic0, magic1, _)| {
                magic0 == MAGIC0 && magic1 == KVP_MAGIC_BASE.wrapping_add(self.file_id)
            });
        if !ok {
            return Err(AokvError::NotAokv);
        }
        Ok(())
    }

    /// Chase the tail back-pointer to the latest index snapshot.
    ///
    /// On success the snapshot is merged into the key map and the returned
    /// offset sits immediately after the index block, ready for the
    /// forward scan. Any miss (short read, pointer past file start, wrong
    /// magics, oversized block) abandons the walk and the whole file is
    /// scanned from offset 0 instead.
    fn tail_walk(&mut self) -> Result<u64> {
        if self.file_size < FOOTER_SIZE {
            return Ok(0);
        }

        let footer = match self.read_exact_at(FOOTER_SIZE, self.file_size - FOOTER_SIZE)? {
            Some(bytes) => bytes,
            None => return Ok(0),
        };
        let back = u32::from_le_bytes(footer[0..4].try_into().unwrap()) as u64;

        let candidate = match (self.file_size - FOOTER_SIZE).checked_sub(back) {
            Some(offset) => offset,
            None => return Ok(0),
        };

        let header = match self.read_exact_at(MAGIC_HEADER_SIZE, candidate)? {
            Some(bytes) => bytes,
            None => return Ok(0),
        };
        let (magic0, magic1, block_size) = match block::parse_magic_header(&header) {
            Some(fields) => fields,
            None => return Ok(0),
        };
        if block::classify_magic(magic0, magic1, self.file_id) != BlockKind::Index {
            tracing::debug!("Tail walk found no index snapshot, scanning from the start");
            return Ok(0);
        }

        let block_size = block_size as u64;
        if block_size < INDEX_HEADER_SIZE + FOOTER_SIZE
            || candidate + block_size > self.file_size
        {
            return Ok(0);
        }

        let content_len = block_size - INDEX_HEADER_SIZE - FOOTER_SIZE;
        let mut content =
            match self.read_exact_at(content_len, candidate + INDEX_HEADER_SIZE)? {
                Some(bytes) => bytes,
                None => return Ok(0),
            };
        if let Some(decompress) = &self.decompress {
            if content.first() != Some(&value::PROBE_BYTE) {
                content = decompress(&content)?;
            }
        }

        let snapshot = block::decode_index_content(&content)?;
        tracing::debug!(
            "Tail walk hit index snapshot at offset {}: {} keys",
            candidate,
            snapshot.len()
        );
        for (key, entry) in snapshot {
            self.index_map.insert(key, entry);
        }

        Ok(candidate + block_size)
    }

    /// Scan blocks forward from `off`, recording KVPs and skipping the
    /// rest. Only blocks that fit entirely inside the file are recorded,
    /// so a torn tail block never shadows an earlier complete write.
    fn forward_scan(&mut self, mut off: u64, check_headers: bool) -> Result<()> {
        while off < self.file_size {
            let head = match self.source.pread(MAX_HEADER_SIZE as usize, off)? {
                Some(bytes) => bytes,
                None => break,
            };
            let (magic0, magic1, block_size) = match block::parse_magic_header(&head) {
                Some(fields) => fields,
                None => break,
            };
            let block_size = block_size as u64;

            match block::classify_magic(magic0, magic1, self.file_id) {
                BlockKind::Kvp => {
                    if head.len() < KVP_HEADER_SIZE as usize {
                        break;
                    }
                    let key_size =
                        u32::from_le_bytes(head[12..16].try_into().unwrap()) as u64;
                    let body_size = match block::kvp_body_size(block_size, key_size) {
                        Some(size) => size,
                        None => break,
                    };
                    if off + block_size > self.file_size {
                        break;
                    }
                    let key_bytes = match self.read_exact_at(key_size, off + KVP_HEADER_SIZE)? {
                        Some(bytes) => bytes,
                        None => break,
                    };
                    // Lossy decoding would let two distinct on-disk keys
                    // collide on the replacement character and silently
                    // shadow each other's entry
                    let key = String::from_utf8(key_bytes)
                        .map_err(|_| AokvError::BadKeyEncoding(off + KVP_HEADER_SIZE))?;
                    // Existing keys keep their enumeration slot; only the
                    // location is refreshed
                    self.index_map.insert(
                        key,
                        IndexEntry {
                            size: body_size as u32,
                            offset: off + KVP_HEADER_SIZE + key_size,
                        },
                    );
                    off += block_size;
                }
                BlockKind::Index => {
                    if block_size < INDEX_HEADER_SIZE + FOOTER_SIZE
                        || off + block_size > self.file_size
                    {
                        break;
                    }
                    off += block_size;
                }
                BlockKind::ForeignInWindow => {
                    if check_headers {
                        return Err(AokvError::UnrecognizedBlock(off));
                    }
                    if block_size < MAGIC_HEADER_SIZE + FOOTER_SIZE
                        || off + block_size > self.file_size
                    {
                        break;
                    }
                    off += block_size;
                }
                BlockKind::Foreign => {
                    if check_headers {
                        return Err(AokvError::UnrecognizedBlock(off));
                    }
                    break;
                }
            }
        }
        Ok(())
    }

    /// Read exactly `count` bytes at `offset`; `None` on any shortfall
    fn read_exact_at(&mut self, count: u64, offset: u64) -> Result<Option<Vec<u8>>> {
        if count == 0 {
            return Ok(Some(Vec::new()));
        }
        match self.source.pread(count as usize, offset)? {
            Some(bytes) if bytes.len() as u64 == count => Ok(Some(bytes)),
            _ => Ok(None),
        }
    }
}
