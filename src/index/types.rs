use crate::utils::classify::ClassifierKind;
use crate::utils::tokenizer::DEFAULT_BLOCK_SIZE;
use serde::Deserialize;

/// Identifier of a row in the `doc` table
pub type DocId = i64;

/// Identifier of a row in the `path` table
pub type PathId = i64;

/// Identifier of a row in the `word` table
pub type WordId = i64;

/// The two document kinds derived from one filesystem path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(i64)]
pub enum DocKind {
    /// The path string itself, as indexable text
    Path = 10,
    /// The content of the file at that path
    File = 20,
}

impl DocKind {
    pub fn as_int(self) -> i64 {
        self as i64
    }

    pub fn from_int(value: i64) -> Option<Self> {
        match value {
            10 => Some(DocKind::Path),
            20 => Some(DocKind::File),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DocKind::Path => "path",
            DocKind::File => "file",
        }
    }
}

/// Running statistics for one word in one document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WordCounts {
    /// Occurrences of the word in the document
    pub count: u64,
    /// Sum of the positions of every occurrence
    pub totpos: u64,
}

impl WordCounts {
    #[inline]
    pub fn add(&mut self, position: u32) {
        self.count += 1;
        self.totpos += u64::from(position);
    }

    /// Add the totals of an aggregated entry.
    #[inline]
    pub fn merge(&mut self, stat: &WordStat) {
        self.count += stat.count;
        self.totpos += stat.totpos;
    }
}

/// One drained accumulator entry, ready to become a match row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordStat {
    pub word: String,
    pub doc_id: DocId,
    pub count: u64,
    pub totpos: u64,
}

impl WordStat {
    /// Truncated mean position. Entries only exist after a first occurrence.
    pub fn avg_position(&self) -> u64 {
        if self.count == 0 {
            0
        } else {
            self.totpos / self.count
        }
    }
}

/// Which accumulator backs an indexing run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AccumulatorKind {
    /// Nested hash maps, unbounded and exact
    #[default]
    Map,
    /// Fixed-size open-addressing table keyed by incremental FNV-1a
    Table,
}

/// Configuration for the indexer
#[derive(Debug, Clone, Deserialize)]
pub struct IndexConfig {
    /// Bytes read per block when streaming file contents
    #[serde(default = "default_block_size")]
    pub block_size: usize,

    #[serde(default)]
    pub accumulator: AccumulatorKind,

    /// log2 of the bucket count of the bounded table
    #[serde(default = "default_table_bits")]
    pub table_bits: u32,

    /// Switch to the unbounded map when the bounded table fills up
    #[serde(default = "default_fallback_on_full")]
    pub fallback_on_full: bool,

    #[serde(default)]
    pub classifier: ClassifierKind,

    /// File extensions indexed during directory runs (empty = all)
    #[serde(default)]
    pub extensions: Vec<String>,

    /// Descend into hidden files and directories
    #[serde(default)]
    pub hidden: bool,

    #[serde(default)]
    pub follow_links: bool,
}

fn default_block_size() -> usize {
    DEFAULT_BLOCK_SIZE
}

fn default_table_bits() -> u32 {
    crate::index::accumulator::DEFAULT_TABLE_BITS
}

fn default_fallback_on_full() -> bool {
    true
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            block_size: default_block_size(),
            accumulator: AccumulatorKind::default(),
            table_bits: default_table_bits(),
            fallback_on_full: default_fallback_on_full(),
            classifier: ClassifierKind::default(),
            extensions: Vec::new(),
            hidden: false,
            follow_links: false,
        }
    }
}

impl IndexConfig {
    /// Whether a file passes the extension filter.
    pub fn accepts_extension(&self, path: &std::path::Path) -> bool {
        if self.extensions.is_empty() {
            return true;
        }
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return false;
        };
        self.extensions
            .iter()
            .any(|want| want.trim_start_matches('.').eq_ignore_ascii_case(ext))
    }
}

/// Counters for one indexing run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexStats {
    pub files_indexed: usize,
    pub binary_skipped: usize,
    pub files_failed: usize,
    /// Tokens recorded in the accumulator
    pub tokens: u64,
    /// Tokens the bounded table could not account for
    pub tokens_dropped: u64,
}

/// Counters for one flush
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushStats {
    pub matches_written: usize,
    pub words_created: usize,
}
