//! Bounded open-addressing word table.
//!
//! Buckets are keyed by a 64-bit FNV-1a value: the word hash computed
//! fragment by fragment during tokenization, continued over the document id.
//! Identity is decided by key equality alone. Two distinct `(word, document)`
//! pairs sharing a 64-bit key are merged into one bucket; at the table sizes
//! used here that probability is negligible and the table never compares
//! word text.

use crate::error::{Error, Result};
use crate::index::types::{DocId, WordCounts, WordStat};
use crate::utils::tokenizer::{word_hash, Token};
use fnv::FnvHasher;
use std::hash::Hasher;

/// Accepted range for the log2 bucket count.
pub const MIN_TABLE_BITS: u32 = 1;
pub const MAX_TABLE_BITS: u32 = 30;

#[derive(Debug, Clone, Default)]
struct Bucket {
    valid: bool,
    key: u64,
    counts: WordCounts,
    doc_id: DocId,
    /// Copied from the token that claimed the bucket
    word: Box<str>,
}

enum Probe {
    Found(usize),
    Vacant(usize),
    Full,
}

#[derive(Debug)]
pub struct TableAccumulator {
    buckets: Vec<Bucket>,
    mask: usize,
    len: usize,
    accounted: u64,
}

impl TableAccumulator {
    /// Create a table with `2^bits` buckets.
    ///
    /// `bits` outside `MIN_TABLE_BITS..=MAX_TABLE_BITS` is an `InvalidArgument`.
    pub fn with_bits(bits: u32) -> Result<Self> {
        check_bits(bits)?;
        let bucket_count = 1usize << bits;
        Ok(Self {
            buckets: vec![Bucket::default(); bucket_count],
            mask: bucket_count - 1,
            len: 0,
            accounted: 0,
        })
    }

    /// Bucket key for a token within a document.
    #[inline]
    pub fn key(token_hash: u64, doc_id: DocId) -> u64 {
        let mut hasher = FnvHasher::with_key(token_hash);
        hasher.write(&doc_id.to_le_bytes());
        hasher.finish()
    }

    fn probe(&self, key: u64) -> Probe {
        let start = (key as usize) & self.mask;
        for step in 0..self.buckets.len() {
            let idx = (start + step) & self.mask;
            let bucket = &self.buckets[idx];
            if !bucket.valid {
                return Probe::Vacant(idx);
            }
            if bucket.key == key {
                return Probe::Found(idx);
            }
        }
        Probe::Full
    }

    /// Record one occurrence.
    ///
    /// Fails with `CapacityExceeded` only for a key not yet in the table once
    /// every bucket is taken; stored buckets are never touched in that case.
    pub fn record(&mut self, token: &Token, doc_id: DocId) -> Result<()> {
        let idx = self.slot(token.hash, doc_id, &token.text)?;
        self.buckets[idx].counts.add(token.position);
        self.accounted += 1;
        Ok(())
    }

    /// Fold an already aggregated entry in, same capacity rules as `record`.
    pub fn absorb(&mut self, stat: &WordStat) -> Result<()> {
        let idx = self.slot(word_hash(&stat.word), stat.doc_id, &stat.word)?;
        self.buckets[idx].counts.merge(stat);
        self.accounted += stat.count;
        Ok(())
    }

    fn slot(&mut self, word_hash: u64, doc_id: DocId, word: &str) -> Result<usize> {
        let key = Self::key(word_hash, doc_id);
        match self.probe(key) {
            Probe::Found(idx) => Ok(idx),
            Probe::Vacant(idx) => {
                let bucket = &mut self.buckets[idx];
                bucket.valid = true;
                bucket.key = key;
                bucket.doc_id = doc_id;
                bucket.word = word.into();
                self.len += 1;
                Ok(idx)
            }
            Probe::Full => Err(Error::CapacityExceeded {
                capacity: self.capacity(),
            }),
        }
    }

    /// Take every stored entry, in bucket order.
    pub fn drain(&mut self) -> Vec<WordStat> {
        let mut out = Vec::with_capacity(self.len);
        for bucket in self.buckets.iter_mut().filter(|b| b.valid) {
            let bucket = std::mem::take(bucket);
            out.push(WordStat {
                word: bucket.word.into_string(),
                doc_id: bucket.doc_id,
                count: bucket.counts.count,
                totpos: bucket.counts.totpos,
            });
        }
        self.len = 0;
        out
    }

    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == self.buckets.len()
    }

    /// Occurrences successfully counted since creation.
    pub fn accounted(&self) -> u64 {
        self.accounted
    }

    pub fn get(&self, token_hash: u64, doc_id: DocId) -> Option<WordCounts> {
        match self.probe(Self::key(token_hash, doc_id)) {
            Probe::Found(idx) => Some(self.buckets[idx].counts),
            _ => None,
        }
    }
}

pub(crate) fn check_bits(bits: u32) -> Result<()> {
    if (MIN_TABLE_BITS..=MAX_TABLE_BITS).contains(&bits) {
        Ok(())
    } else {
        Err(Error::InvalidArgument(format!(
            "table_bits must be between {MIN_TABLE_BITS} and {MAX_TABLE_BITS}, got {bits}"
        )))
    }
}
