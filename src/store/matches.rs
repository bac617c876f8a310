//! Match rows: invalidation, the transactional flush, and lookups.

use super::documents::{intern_word, lookup_word_id};
use super::rows::{query_all, MatchRow};
use super::Store;
use crate::error::{Error, Result, StorageContext};
use crate::index::accumulator::Accumulator;
use crate::index::types::{DocId, FlushStats, WordId, WordStat};
use rusqlite::params;
use rustc_hash::FxHashMap;
use tracing::debug;

const UPSERT_MATCH: &str = "
    INSERT INTO matches (word_id, doc_id, count, avg_position)
    VALUES (?1, ?2, ?3, ?4)
    ON CONFLICT (word_id, doc_id) DO UPDATE SET
        count = excluded.count,
        avg_position = excluded.avg_position";

const SELECT_MATCHES: &str = "
    SELECT m.word_id AS word_id, m.doc_id AS doc_id, d.kind AS kind,
           m.count AS count, m.avg_position AS avg_position
    FROM matches m
    JOIN doc d ON d.id = m.doc_id
    WHERE m.word_id = ?1
    ORDER BY m.doc_id";

impl Store {
    /// Delete every match of a document. Returns the number of rows removed.
    pub fn invalidate(&self, doc_id: DocId) -> Result<usize> {
        self.conn
            .prepare_cached("DELETE FROM matches WHERE doc_id = ?1")
            .during("invalidating matches")?
            .execute(params![doc_id])
            .during("invalidating matches")
    }

    /// Drain the accumulator into match rows in a single transaction.
    ///
    /// On failure nothing is written; the drained entries are lost and the
    /// run has to be repeated.
    pub fn flush(&mut self, accumulator: &mut Accumulator) -> Result<FlushStats> {
        let stats = accumulator.drain();
        self.write_matches(&stats)
    }

    /// Upsert one match row per entry, all or nothing.
    pub fn write_matches(&mut self, stats: &[WordStat]) -> Result<FlushStats> {
        let tx = self.conn.transaction().during("starting flush")?;
        let mut flushed = FlushStats::default();
        let mut word_ids: FxHashMap<&str, WordId> = FxHashMap::default();

        {
            let mut upsert = tx.prepare_cached(UPSERT_MATCH).during("writing matches")?;
            for stat in stats.iter().filter(|s| s.count > 0) {
                let word_id = match word_ids.get(stat.word.as_str()) {
                    Some(&id) => id,
                    None => {
                        let (id, created) = intern_word(&tx, &stat.word)?;
                        if created {
                            flushed.words_created += 1;
                        }
                        word_ids.insert(&stat.word, id);
                        id
                    }
                };
                upsert
                    .execute(params![
                        word_id,
                        stat.doc_id,
                        stat.count as i64,
                        stat.avg_position() as i64
                    ])
                    .during("writing matches")?;
                flushed.matches_written += 1;
            }
        }

        tx.commit().during("committing flush")?;
        debug!(
            matches = flushed.matches_written,
            words = flushed.words_created,
            "flush committed"
        );
        Ok(flushed)
    }

    /// Every match of a word, with the kind of each document.
    ///
    /// A word that was never indexed is `NotFound`; a known word whose
    /// matches were all invalidated yields an empty list.
    pub fn find_matches(&self, word: &str) -> Result<Vec<MatchRow>> {
        let word_id = lookup_word_id(&self.conn, word)?
            .ok_or_else(|| Error::not_found("word", word))?;
        query_all(&self.conn, SELECT_MATCHES, params![word_id], "finding matches")
    }

    pub fn find_documents(&self, word: &str) -> Result<Vec<DocId>> {
        Ok(self
            .find_matches(word)?
            .into_iter()
            .map(|m| m.doc_id)
            .collect())
    }
}
