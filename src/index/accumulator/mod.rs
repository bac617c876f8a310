//! In-memory word statistics collected during an indexing run.
//!
//! Two interchangeable backing stores sit behind [`Accumulator`]:
//!
//! - [`MapAccumulator`] - nested hash maps, unbounded and exact
//! - [`TableAccumulator`] - fixed-size open-addressing table keyed by an
//!   incrementally computed FNV-1a hash
//!
//! The orchestrator only talks to [`Accumulator::absorb`] and
//! [`Accumulator::drain`].

pub mod map;
pub mod table;

pub use map::MapAccumulator;
pub use table::{TableAccumulator, MAX_TABLE_BITS, MIN_TABLE_BITS};

use crate::error::Result;
use crate::index::types::{AccumulatorKind, DocId, IndexConfig, WordStat};
use crate::utils::tokenizer::Token;

/// Default log2 bucket count of the bounded table (262144 buckets).
pub const DEFAULT_TABLE_BITS: u32 = 18;

#[derive(Debug)]
pub enum Accumulator {
    Map(MapAccumulator),
    Table(TableAccumulator),
}

impl Accumulator {
    /// Build the strategy named by `config`.
    ///
    /// `table_bits` is checked even for the map, so a bad config fails the
    /// same way whichever strategy it selects.
    pub fn from_config(config: &IndexConfig) -> Result<Self> {
        table::check_bits(config.table_bits)?;
        Ok(match config.accumulator {
            AccumulatorKind::Map => Accumulator::Map(MapAccumulator::new()),
            AccumulatorKind::Table => {
                Accumulator::Table(TableAccumulator::with_bits(config.table_bits)?)
            }
        })
    }

    pub fn kind(&self) -> AccumulatorKind {
        match self {
            Accumulator::Map(_) => AccumulatorKind::Map,
            Accumulator::Table(_) => AccumulatorKind::Table,
        }
    }

    /// Count one occurrence of `token` in `doc_id`.
    ///
    /// Only the bounded table can fail, with `CapacityExceeded`; the entry is
    /// then simply not recorded.
    pub fn record(&mut self, token: &Token, doc_id: DocId) -> Result<()> {
        match self {
            Accumulator::Map(map) => {
                map.record(token, doc_id);
                Ok(())
            }
            Accumulator::Table(table) => table.record(token, doc_id),
        }
    }

    /// Fold in an entry aggregated elsewhere, with the same failure mode as
    /// [`Accumulator::record`].
    pub fn absorb(&mut self, stat: &WordStat) -> Result<()> {
        match self {
            Accumulator::Map(map) => {
                map.absorb(stat);
                Ok(())
            }
            Accumulator::Table(table) => table.absorb(stat),
        }
    }

    /// Take every accumulated entry, leaving the accumulator empty.
    ///
    /// Enumeration order is unspecified.
    pub fn drain(&mut self) -> Vec<WordStat> {
        match self {
            Accumulator::Map(map) => map.drain(),
            Accumulator::Table(table) => table.drain(),
        }
    }

    /// Number of distinct (word, document) entries.
    pub fn len(&self) -> usize {
        match self {
            Accumulator::Map(map) => map.len(),
            Accumulator::Table(table) => table.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Replace a bounded table with an unbounded map holding the same entries.
    pub fn promote(&mut self) {
        if let Accumulator::Table(table) = self {
            let mut map = MapAccumulator::new();
            for stat in table.drain() {
                map.absorb(&stat);
            }
            *self = Accumulator::Map(map);
        }
    }
}

impl Default for Accumulator {
    fn default() -> Self {
        Accumulator::Map(MapAccumulator::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::tokenizer::tokenize_str;
    use crate::ErrorKind;

    fn sorted(mut stats: Vec<WordStat>) -> Vec<WordStat> {
        stats.sort_by(|a, b| (a.doc_id, &a.word).cmp(&(b.doc_id, &b.word)));
        stats
    }

    fn feed(acc: &mut Accumulator) {
        for token in tokenize_str("alpha beta gamma beta alpha alpha") {
            acc.record(&token, 1).unwrap();
        }
        for token in tokenize_str("beta delta") {
            acc.record(&token, 2).unwrap();
        }
    }

    #[test]
    fn test_strategies_agree() {
        let mut map = Accumulator::from_config(&IndexConfig::default()).unwrap();
        let mut table = Accumulator::from_config(&IndexConfig {
            accumulator: AccumulatorKind::Table,
            table_bits: 10,
            ..IndexConfig::default()
        })
        .unwrap();
        assert_eq!(map.kind(), AccumulatorKind::Map);
        assert_eq!(table.kind(), AccumulatorKind::Table);

        feed(&mut map);
        feed(&mut table);
        assert_eq!(map.len(), table.len());
        assert_eq!(sorted(map.drain()), sorted(table.drain()));
        assert!(map.is_empty());
        assert!(table.is_empty());
    }

    #[test]
    fn test_promote_keeps_entries() {
        let mut acc = Accumulator::Table(TableAccumulator::with_bits(3).unwrap());
        feed(&mut acc);
        let before = acc.len();

        acc.promote();
        assert_eq!(acc.kind(), AccumulatorKind::Map);
        assert_eq!(acc.len(), before);

        let stats = sorted(acc.drain());
        let alpha = stats.iter().find(|s| s.word == "alpha").unwrap();
        assert_eq!(alpha.count, 3);
        assert_eq!(alpha.totpos, 9);
    }

    #[test]
    fn test_config_with_bad_table_bits_rejected() {
        for accumulator in [AccumulatorKind::Map, AccumulatorKind::Table] {
            for table_bits in [0, 31, 64] {
                let err = Accumulator::from_config(&IndexConfig {
                    accumulator,
                    table_bits,
                    ..IndexConfig::default()
                })
                .unwrap_err();
                assert_eq!(err.kind(), ErrorKind::InvalidArgument);
                assert!(err.to_string().contains("table_bits"));
            }
        }
    }

    #[test]
    fn test_absorb_into_either_strategy() {
        let stat = WordStat {
            word: "alpha".into(),
            doc_id: 4,
            count: 3,
            totpos: 7,
        };
        for mut acc in [
            Accumulator::Map(MapAccumulator::new()),
            Accumulator::Table(TableAccumulator::with_bits(4).unwrap()),
        ] {
            acc.absorb(&stat).unwrap();
            acc.absorb(&stat).unwrap();
            let drained = acc.drain();
            assert_eq!(drained.len(), 1);
            assert_eq!(drained[0].count, 6);
            assert_eq!(drained[0].totpos, 14);
        }
    }
}
