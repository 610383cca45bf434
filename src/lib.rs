//! # Scour
//!
//! Scour is a fully local full-text search engine for crawled HTML corpora.
//!
//! This crate provides both a command-line interface and a library that can be used
//! programmatically in other Rust applications.
//!
//! ## Features
//!
//! - Memory-bounded index construction: partial indexes spill to disk and are
//!   combined by an external k-way merge, so corpora larger than RAM index fine
//! - Tag-weighted tokenization: terms in `<title>`, headings, and bold text
//!   count for more than body text
//! - Weighted TF-IDF scoring over a persistent inverted index
//! - O(1)-seek posting retrieval through a sparse meta-index, keeping query
//!   latency flat as the corpus grows
//!
//! ## Examples
//!
//! ### Building an index
//!
//! ```no_run
//! use scour::{build_index, IndexOptions};
//! use std::path::PathBuf;
//!
//! let options = IndexOptions {
//!     corpus_path: PathBuf::from("/data/corpus"),
//!     storage_path: PathBuf::from("/data/index"),
//!     spill_threshold: 256 * 1024 * 1024,
//! };
//!
//! let summary = build_index(&options).unwrap();
//! println!("Indexed {} documents", summary.documents);
//! ```
//!
//! ### Searching
//!
//! ```no_run
//! use scour::SearchEngine;
//! use std::path::Path;
//!
//! let engine = SearchEngine::open(Path::new("/data/index")).unwrap();
//! let hits = engine.search("master of software engineering", 5).unwrap();
//! for hit in hits {
//!     println!("{:.4}  {}", hit.score, hit.url);
//! }
//! ```

pub mod config;
pub mod index;
pub mod models;
pub mod search;
pub mod tokenize;

// Re-export commonly used types for convenience
pub use config::Config;
pub use index::{build_index, IndexOptions, IndexSummary};
pub use models::{BuildPosting, ScoredPosting, SearchHit};
pub use search::{EngineError, SearchEngine};

// Tests are defined in their respective modules with #[cfg(test)]
