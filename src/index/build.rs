//! Indexing orchestration.
//!
//! Every file yields two documents: its path string as text, and its content.
//! A file's words are first counted in a scratch map of their own. Only once
//! its content has been read to the end are its previous matches invalidated
//! and the scratch counts folded into the run's [`Accumulator`], which
//! [`Indexer::commit`] writes in a single transaction. A file that fails
//! halfway leaves the run and the store as they were.

use crate::error::{Error, Result};
use crate::index::accumulator::{Accumulator, MapAccumulator};
use crate::index::types::{AccumulatorKind, DocId, FlushStats, IndexConfig, IndexStats};
use crate::store::{path_segments, Store};
use crate::utils::classify::ContentClassifier;
use crate::utils::progress::Spinner;
use crate::utils::tokenizer::{tokenize_str, Tokens};
use ignore::WalkBuilder;
use rustc_hash::FxHashSet;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Drives files through the tokenizer and accumulator for one run.
pub struct Indexer<'a> {
    store: &'a mut Store,
    accumulator: Accumulator,
    classifier: Box<dyn ContentClassifier>,
    config: IndexConfig,
    stats: IndexStats,
    /// Files already indexed since the last commit
    seen: FxHashSet<PathBuf>,
    warned_full: bool,
    silent: bool,
}

impl<'a> Indexer<'a> {
    /// Fails with `InvalidArgument` when `config` cannot be honoured.
    pub fn new(store: &'a mut Store, config: IndexConfig) -> Result<Self> {
        if config.block_size == 0 {
            return Err(Error::InvalidArgument("block size must be positive".into()));
        }
        Ok(Self {
            store,
            accumulator: Accumulator::from_config(&config)?,
            classifier: config.classifier.build(),
            config,
            stats: IndexStats::default(),
            seen: FxHashSet::default(),
            warned_full: false,
            silent: true,
        })
    }

    pub fn with_classifier(mut self, classifier: Box<dyn ContentClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    /// Show a spinner while walking directories.
    pub fn with_progress(mut self, enabled: bool) -> Self {
        self.silent = !enabled;
        self
    }

    pub fn stats(&self) -> IndexStats {
        self.stats
    }

    pub fn accumulator_kind(&self) -> AccumulatorKind {
        self.accumulator.kind()
    }

    /// Distinct (word, document) entries waiting for the next commit.
    pub fn pending(&self) -> usize {
        self.accumulator.len()
    }

    /// Index a file, or every file below a directory.
    pub fn index_path(&mut self, path: &Path) -> Result<()> {
        let resolved = path.canonicalize().map_err(|e| {
            Error::InvalidArgument(format!("cannot resolve {}: {e}", path.display()))
        })?;

        if resolved.is_dir() {
            self.index_directory(&resolved)
        } else if resolved.is_file() {
            self.index_file(&resolved)
        } else {
            Err(Error::InvalidArgument(format!(
                "not a regular file or directory: {}",
                resolved.display()
            )))
        }
    }

    fn index_directory(&mut self, root: &Path) -> Result<()> {
        let spinner = Spinner::start(!self.silent, format!("Indexing {}", root.display()));

        let walker = WalkBuilder::new(root)
            .hidden(!self.config.hidden)
            .follow_links(self.config.follow_links)
            .sort_by_file_name(|a, b| a.cmp(b))
            .filter_entry(|entry| {
                !matches!(
                    entry.file_name().to_str(),
                    Some(".git" | ".hg" | ".svn")
                )
            })
            .build();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!(error = %err, "skipping unreadable entry");
                    continue;
                }
            };
            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }
            let path = entry.path();
            if !self.config.accepts_extension(path) {
                continue;
            }

            match self.index_file(path) {
                Ok(()) => {}
                // Unreadable or unrepresentable files do not abort a directory run
                Err(err @ (Error::Io { .. } | Error::InvalidArgument(_))) => {
                    warn!(error = %err, "failed to index file");
                    self.stats.files_failed += 1;
                }
                Err(err) => return Err(err),
            }

            spinner.update(|| format!("Indexed {} files", self.stats.files_indexed));
        }

        spinner.finish(|| {
            format!(
                "Indexed {} files ({} binary, {} failed)",
                self.stats.files_indexed, self.stats.binary_skipped, self.stats.files_failed
            )
        });
        Ok(())
    }

    /// Index one already resolved file path.
    pub fn index_file(&mut self, path: &Path) -> Result<()> {
        if !self.seen.insert(path.to_path_buf()) {
            debug!(path = %path.display(), "already indexed in this run");
            return Ok(());
        }

        if self.classifier.is_binary(path)? {
            self.index_document(path, None::<File>)?;
            debug!(path = %path.display(), "binary content skipped");
            self.stats.binary_skipped += 1;
        } else {
            let file = File::open(path).map_err(|e| Error::io(path, e))?;
            self.index_document(path, Some(file))?;
        }
        self.stats.files_indexed += 1;
        Ok(())
    }

    /// Index `content` as the file at `path`, without classifying it.
    ///
    /// Nothing is recorded or invalidated unless `content` reads to the end.
    pub fn index_content<R: Read>(&mut self, path: &Path, content: R) -> Result<()> {
        self.index_document(path, Some(content))?;
        self.stats.files_indexed += 1;
        Ok(())
    }

    fn index_document<R: Read>(&mut self, path: &Path, content: Option<R>) -> Result<()> {
        // Non-UTF-8 names are refused before anything is touched
        let segments = path_segments(path)?;

        let mut path_words = MapAccumulator::new();
        for token in tokenize_str(&path.to_string_lossy()) {
            path_words.record(&token, 0);
        }
        let mut content_words = MapAccumulator::new();
        if let Some(reader) = content {
            for token in Tokens::new(reader, self.config.block_size) {
                let token = token.map_err(|e| Error::io(path, e))?;
                content_words.record(&token, 0);
            }
        }

        let node = self.store.get_or_create_path_id(&segments)?;
        let path_doc = self.store.get_or_create_path_document(node)?;
        let file_doc = self.store.get_or_create_file_document(node)?;
        self.store.invalidate(path_doc)?;
        self.store.invalidate(file_doc)?;

        self.merge(path_words, path_doc)?;
        self.merge(content_words, file_doc)?;
        debug!(path = %path.display(), path_doc, file_doc, "indexed");
        Ok(())
    }

    /// Fold one document's scratch counts into the run accumulator.
    fn merge(&mut self, mut staged: MapAccumulator, doc_id: DocId) -> Result<()> {
        for mut stat in staged.drain() {
            stat.doc_id = doc_id;
            match self.accumulator.absorb(&stat) {
                Ok(()) => self.stats.tokens += stat.count,
                Err(Error::CapacityExceeded { capacity }) if self.config.fallback_on_full => {
                    warn!(capacity, "word table full, switching to the unbounded map");
                    self.accumulator.promote();
                    self.accumulator.absorb(&stat)?;
                    self.stats.tokens += stat.count;
                }
                Err(Error::CapacityExceeded { capacity }) => {
                    self.stats.tokens_dropped += stat.count;
                    if !self.warned_full {
                        let accounted = match &self.accumulator {
                            Accumulator::Table(table) => table.accounted(),
                            Accumulator::Map(_) => self.stats.tokens,
                        };
                        warn!(capacity, accounted, "word table full, new words are dropped");
                        self.warned_full = true;
                    }
                }
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }

    /// Write everything accumulated so far in one transaction.
    pub fn commit(&mut self) -> Result<FlushStats> {
        let flushed = self.store.flush(&mut self.accumulator)?;
        self.seen.clear();
        info!(
            matches = flushed.matches_written,
            words = flushed.words_created,
            "index committed"
        );
        Ok(flushed)
    }
}
