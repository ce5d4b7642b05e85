//! Chunk Stream
//!
//! The pull-based consumer half of the writer's chunk queue.

use crossbeam::channel::Receiver;

/// Consumes the writer's output one chunk at a time.
///
/// Exactly one stream exists per writer; each chunk is one complete block.
/// Dropping the stream is legal at any point and leaves the writer
/// quiescent (its producers start reporting `SinkClosed`).
pub struct ChunkStream {
    receiver: Receiver<Vec<u8>>,
}

impl ChunkStream {
    pub(crate) fn new(receiver: Receiver<Vec<u8>>) -> Self {
        ChunkStream { receiver }
    }

    /// Pull the next chunk.
    ///
    /// Blocks until a chunk is available or the writer has ended; `None`
    /// means end-of-stream.
    pub fn pull(&self) -> Option<Vec<u8>> {
        self.receiver.recv().ok()
    }

    /// Pull without blocking; `None` when nothing is queued right now
    pub fn try_pull(&self) -> Option<Vec<u8>> {
        self.receiver.try_recv().ok()
    }

    /// Drain the stream to completion into a single buffer
    pub fn collect_bytes(self) -> Vec<u8> {
        let mut out = Vec::new();
        for chunk in self {
            out.extend_from_slice(&chunk);
        }
        out
    }
}

impl Iterator for ChunkStream {
    type Item = Vec<u8>;

    fn next(&mut self) -> Option<Self::Item> {
        self.receiver.recv().ok()
    }
}
