//! Reader Module
//!
//! Reconstruction of the live key map from a random-access byte source.
//!
//! ## Responsibilities
//! - Locate the latest index snapshot by chasing the tail back-pointer
//! - Forward-scan newer blocks to complete the key map
//! - Serve point lookups through positioned reads, lazily per key
//! - Treat truncation as a clean cut, never as corruption
//!
//! ## Data Flow
//! ```text
//! index() ──► tail walk ──► snapshot merge ──► forward scan ──► key map
//! get(key) ──► positioned read ──► value codec ──► value
//! ```

mod engine;

pub use engine::Reader;
