//! Writer Module
//!
//! Streaming emission of an append-only key-value container.
//!
//! ## Responsibilities
//! - Serialize values into self-describing KVP blocks
//! - Maintain the in-memory index as writes land
//! - Emit index snapshots on a cadence that bounds both recovery cost and
//!   index overhead
//! - Feed a pull-based chunk queue consumed by exactly one stream
//!
//! ## Data Flow
//! ```text
//! set(key, value) ──► value codec ──► block codec ──► chunk queue ──► pull
//!                         │
//!                         └──► in-memory index ──► periodic Index blocks
//! ```

mod engine;
mod stream;

pub use engine::Writer;
pub use stream::ChunkStream;
