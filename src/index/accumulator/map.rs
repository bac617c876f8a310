use crate::index::types::{DocId, WordCounts, WordStat};
use crate::utils::tokenizer::Token;
use rustc_hash::FxHashMap;

/// Unbounded accumulator: word text -> document -> counts.
#[derive(Debug, Default)]
pub struct MapAccumulator {
    words: FxHashMap<String, FxHashMap<DocId, WordCounts>>,
    entries: usize,
}

impl MapAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, token: &Token, doc_id: DocId) {
        // Only allocate the key the first time a word is seen
        if let Some(docs) = self.words.get_mut(token.text.as_str()) {
            counts_for(docs, &mut self.entries, doc_id).add(token.position);
        } else {
            let mut docs = FxHashMap::default();
            counts_for(&mut docs, &mut self.entries, doc_id).add(token.position);
            self.words.insert(token.text.clone(), docs);
        }
    }

    /// Fold an already aggregated entry in.
    pub fn absorb(&mut self, stat: &WordStat) {
        if let Some(docs) = self.words.get_mut(stat.word.as_str()) {
            counts_for(docs, &mut self.entries, stat.doc_id).merge(stat);
        } else {
            let mut docs = FxHashMap::default();
            counts_for(&mut docs, &mut self.entries, stat.doc_id).merge(stat);
            self.words.insert(stat.word.clone(), docs);
        }
    }

    pub fn drain(&mut self) -> Vec<WordStat> {
        let mut out = Vec::with_capacity(self.entries);
        for (word, docs) in self.words.drain() {
            for (doc_id, counts) in docs {
                out.push(WordStat {
                    word: word.clone(),
                    doc_id,
                    count: counts.count,
                    totpos: counts.totpos,
                });
            }
        }
        self.entries = 0;
        out
    }

    /// Number of (word, document) entries.
    pub fn len(&self) -> usize {
        self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries == 0
    }

    pub fn get(&self, word: &str, doc_id: DocId) -> Option<WordCounts> {
        self.words.get(word)?.get(&doc_id).copied()
    }
}

fn counts_for<'a>(
    docs: &'a mut FxHashMap<DocId, WordCounts>,
    entries: &mut usize,
    doc_id: DocId,
) -> &'a mut WordCounts {
    docs.entry(doc_id).or_insert_with(|| {
        *entries += 1;
        WordCounts::default()
    })
}
