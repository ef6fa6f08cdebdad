//! Source chunking for repoqa.
//!
//! Walks a source tree, parses each supported file with tree-sitter and cuts
//! out functions, methods and classes as standalone chunks:
//!
//! ```text
//! root/ ──walk──▶ *.go *.ts *.tsx *.js *.py ──tree-sitter──▶ CodeChunk ──▶ chunked.jsonl
//!        (skips tests, vendored and build dirs)
//! ```
//!
//! The JSONL output is what `repoqa embed` reads.

mod corpus;
mod error;
mod extract;
mod language;
mod walk;

pub use corpus::{ChunkReport, chunk_tree, write_jsonl};
pub use error::{ChunkerError, Result};
pub use extract::{Chunker, CodeChunk};
pub use language::Language;
pub use walk::{should_skip_dir, should_skip_file, source_files};
