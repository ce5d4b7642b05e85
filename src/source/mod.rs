//! Byte Sources
//!
//! Positioned-read abstraction the reader engine works against, with
//! adapters for in-memory slices and files.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use crate::error::Result;

/// A random-access byte source.
///
/// Implementations return up to `count` bytes at `offset`: fewer on a short
/// read near the end, `None` when the offset is at or past end-of-file.
/// Truncation is expected input, never an error.
pub trait ByteSource {
    /// Positioned read of up to `count` bytes at `offset`
    fn pread(&mut self, count: usize, offset: u64) -> Result<Option<Vec<u8>>>;
}

// =============================================================================
// Slice Source
// =============================================================================

/// Adapter turning any in-memory byte blob into a [`ByteSource`]
#[derive(Debug, Clone)]
pub struct SliceSource<T: AsRef<[u8]>> {
    data: T,
}

impl<T: AsRef<[u8]>> SliceSource<T> {
    /// Wrap a blob
    pub fn new(data: T) -> Self {
        SliceSource { data }
    }

    /// Total length of the underlying blob
    pub fn len(&self) -> u64 {
        self.data.as_ref().len() as u64
    }

    /// True when the blob is empty
    pub fn is_empty(&self) -> bool {
        self.data.as_ref().is_empty()
    }
}

impl<T: AsRef<[u8]>> ByteSource for SliceSource<T> {
    fn pread(&mut self, count: usize, offset: u64) -> Result<Option<Vec<u8>>> {
        let data = self.data.as_ref();
        if offset >= data.len() as u64 {
            return Ok(None);
        }
        let start = offset as usize;
        let end = start.saturating_add(count).min(data.len());
        Ok(Some(data[start..end].to_vec()))
    }
}

// =============================================================================
// File Source
// =============================================================================

/// Adapter performing positioned reads over a [`File`] via seek + read
#[derive(Debug)]
pub struct FileSource {
    file: File,
}

impl FileSource {
    /// Wrap an already-open file
    pub fn new(file: File) -> Self {
        FileSource { file }
    }

    /// Open a file and capture its current length, which the reader needs
    /// alongside the source itself
    pub fn open(path: impl AsRef<Path>) -> Result<(Self, u64)> {
        let file = File::open(path)?;
        let len = file.metadata()?.len();
        Ok((FileSource { file }, len))
    }
}

impl ByteSource for FileSource {
    fn pread(&mut self, count: usize, offset: u64) -> Result<Option<Vec<u8>>> {
        if count == 0 {
            return Ok(Some(Vec::new()));
        }
        self.file.seek(SeekFrom::Start(offset))?;

        let mut buf = vec![0u8; count];
        let mut filled = 0;
        while filled < count {
            let n = self.file.read(&mut buf[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
        }

        if filled == 0 {
            return Ok(None);
        }
        buf.truncate(filled);
        Ok(Some(buf))
    }
}
