use crate::error::{Error, Result};
use crate::index::types::{DocId, DocKind};
use crate::store::Store;
use crate::utils::tokenizer::tokenize_str;

/// One document containing the searched word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub kind: DocKind,
    pub doc_id: DocId,
    /// Reconstructed absolute path of the file or path document
    pub path: String,
    pub count: i64,
    pub avg_position: i64,
}

/// Normalize a query through the same classification as indexed text.
///
/// The query must reduce to exactly one token.
pub fn normalize_query(word: &str) -> Result<String> {
    let mut tokens = tokenize_str(word);
    let first = tokens.next().ok_or_else(|| {
        Error::InvalidArgument(format!("query {word:?} contains no indexable word"))
    })?;
    if tokens.next().is_some() {
        return Err(Error::InvalidArgument(format!(
            "query {word:?} must be a single word"
        )));
    }
    Ok(first.text)
}

/// Look up a single word, ordered by path then document kind.
///
/// `limit = None` returns every hit after `offset`.
pub fn search(
    store: &Store,
    word: &str,
    limit: Option<usize>,
    offset: usize,
) -> Result<Vec<SearchHit>> {
    let word = normalize_query(word)?;
    let matches = store.find_matches(&word)?;

    let mut hits = Vec::with_capacity(matches.len());
    for m in matches {
        let node = store.document_path_node(m.doc_id, m.kind)?;
        hits.push(SearchHit {
            kind: m.kind,
            doc_id: m.doc_id,
            path: store.build_path_string(node)?,
            count: m.count,
            avg_position: m.avg_position,
        });
    }
    hits.sort_by(|a, b| (a.path.as_str(), a.kind).cmp(&(b.path.as_str(), b.kind)));

    Ok(hits
        .into_iter()
        .skip(offset)
        .take(limit.unwrap_or(usize::MAX))
        .collect())
}
