//! # Tally - word-frequency indexing of paths and file contents
//!
//! Tally tokenizes file paths and file contents into words, accumulates
//! per-document counts and average positions in memory, and persists them as
//! an inverted index in SQLite. Lookups return every document containing a
//! word, with its path rebuilt from the interned path tree.
//!
//! ## Architecture
//!
//! - [`utils`] - character classification, tokenizer, binary detection, config
//! - [`index`] - word accumulators and the [`index::Indexer`] orchestrator
//! - [`store`] - schema, path interning, documents, transactional flush
//! - [`query`] - single-word search
//! - [`output`] - terminal rendering
//!
//! ## Quick Start
//!
//! ```no_run
//! use tally::index::{IndexConfig, Indexer};
//! use tally::store::Store;
//! use std::path::Path;
//!
//! let mut store = Store::open(Path::new("/tmp/tally.db"))?;
//!
//! let mut indexer = Indexer::new(&mut store, IndexConfig::default())?;
//! indexer.index_path(Path::new("/etc/hosts"))?;
//! indexer.commit()?;
//!
//! for hit in tally::query::search(&store, "localhost", None, 0)? {
//!     println!("{} ({}) count={}", hit.path, hit.kind.label(), hit.count);
//! }
//! # Ok::<(), tally::Error>(())
//! ```

pub mod error;
pub mod index;
pub mod output;
pub mod query;
pub mod store;
pub mod utils;

pub use error::{Error, ErrorKind, Result};
