//! Word interning and the two document kinds.

use super::rows::{query_one, DocumentRow};
use super::Store;
use crate::error::{Error, Result, StorageContext};
use crate::index::types::{DocId, DocKind, PathId, WordId};
use rusqlite::{params, Connection, OptionalExtension};

pub(crate) fn lookup_word_id(conn: &Connection, text: &str) -> Result<Option<WordId>> {
    conn.prepare_cached("SELECT id FROM word WHERE text = ?1")
        .during("looking up word")?
        .query_row(params![text], |row| row.get(0))
        .optional()
        .during("looking up word")
}

/// Returns the id and whether the word was created by this call.
pub(crate) fn intern_word(conn: &Connection, text: &str) -> Result<(WordId, bool)> {
    if let Some(id) = lookup_word_id(conn, text)? {
        return Ok((id, false));
    }
    conn.prepare_cached("INSERT INTO word (text) VALUES (?1)")
        .during("interning word")?
        .execute(params![text])
        .during("interning word")?;
    Ok((conn.last_insert_rowid(), true))
}

struct BindingSql {
    select: &'static str,
    insert: &'static str,
}

fn binding_sql(kind: DocKind) -> BindingSql {
    match kind {
        DocKind::Path => BindingSql {
            select: "SELECT id FROM doc_path WHERE path = ?1",
            insert: "INSERT INTO doc_path (id, path) VALUES (?1, ?2)",
        },
        DocKind::File => BindingSql {
            select: "SELECT id FROM doc_file WHERE path = ?1",
            insert: "INSERT INTO doc_file (id, path) VALUES (?1, ?2)",
        },
    }
}

impl Store {
    pub fn get_or_create_word_id(&self, text: &str) -> Result<WordId> {
        intern_word(&self.conn, text).map(|(id, _)| id)
    }

    pub fn word_id(&self, text: &str) -> Result<Option<WordId>> {
        lookup_word_id(&self.conn, text)
    }

    /// Document holding the path string of `node` as text.
    pub fn get_or_create_path_document(&self, node: PathId) -> Result<DocId> {
        self.get_or_create_document(DocKind::Path, node)
    }

    /// Document holding the content of the file at `node`.
    pub fn get_or_create_file_document(&self, node: PathId) -> Result<DocId> {
        self.get_or_create_document(DocKind::File, node)
    }

    fn get_or_create_document(&self, kind: DocKind, node: PathId) -> Result<DocId> {
        let sql = binding_sql(kind);

        let existing: Option<DocId> = self
            .conn
            .prepare_cached(sql.select)
            .during("looking up document")?
            .query_row(params![node], |row| row.get(0))
            .optional()
            .during("looking up document")?;

        if let Some(id) = existing {
            self.conn
                .prepare_cached("UPDATE doc SET update_time = strftime('%s', 'now') WHERE id = ?1")
                .during("touching document")?
                .execute(params![id])
                .during("touching document")?;
            return Ok(id);
        }

        let tx = self
            .conn
            .unchecked_transaction()
            .during("creating document")?;
        tx.prepare_cached("INSERT INTO doc (kind) VALUES (?1)")
            .during("creating document")?
            .execute(params![kind])
            .during("creating document")?;
        let id = tx.last_insert_rowid();
        tx.prepare_cached(sql.insert)
            .during("binding document")?
            .execute(params![id, node])
            .during("binding document")?;
        tx.commit().during("creating document")?;
        Ok(id)
    }

    pub fn document(&self, id: DocId) -> Result<Option<DocumentRow>> {
        query_one(
            &self.conn,
            "SELECT id, kind, create_time, update_time FROM doc WHERE id = ?1",
            params![id],
            "reading document",
        )
    }

    pub fn document_kind(&self, id: DocId) -> Result<DocKind> {
        self.document(id)?
            .map(|doc| doc.kind)
            .ok_or_else(|| Error::not_found("document", id))
    }

    /// Path node a document of the given kind is bound to.
    pub fn document_path_node(&self, id: DocId, kind: DocKind) -> Result<PathId> {
        let sql = match kind {
            DocKind::Path => "SELECT path FROM doc_path WHERE id = ?1",
            DocKind::File => "SELECT path FROM doc_file WHERE id = ?1",
        };
        let node: Option<PathId> = self
            .conn
            .prepare_cached(sql)
            .during("resolving document path")?
            .query_row(params![id], |row| row.get(0))
            .optional()
            .during("resolving document path")?;
        node.ok_or_else(|| {
            Error::DataCorruption(format!(
                "{} document {id} is not bound to a path",
                kind.label()
            ))
        })
    }

    pub fn count_documents(&self, kind: DocKind) -> Result<u64> {
        let count: i64 = self
            .conn
            .prepare_cached("SELECT COUNT(*) FROM doc WHERE kind = ?1")
            .during("counting documents")?
            .query_row(params![kind], |row| row.get(0))
            .during("counting documents")?;
        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Table;
    use crate::ErrorKind;

    #[test]
    fn test_word_interning() {
        let store = Store::open_in_memory().unwrap();
        assert_eq!(store.word_id("abc").unwrap(), None);

        let id = store.get_or_create_word_id("abc").unwrap();
        assert_eq!(store.get_or_create_word_id("abc").unwrap(), id);
        assert_eq!(store.word_id("abc").unwrap(), Some(id));
        assert_ne!(store.get_or_create_word_id("abd").unwrap(), id);
        assert_eq!(store.count_rows(Table::Word).unwrap(), 2);
    }

    #[test]
    fn test_documents_per_kind() {
        let mut store = Store::open_in_memory().unwrap();
        let node = store.get_or_create_path_id(&["tmp", "a.txt"]).unwrap();

        let path_doc = store.get_or_create_path_document(node).unwrap();
        let file_doc = store.get_or_create_file_document(node).unwrap();
        assert_ne!(path_doc, file_doc);

        assert_eq!(store.get_or_create_path_document(node).unwrap(), path_doc);
        assert_eq!(store.get_or_create_file_document(node).unwrap(), file_doc);

        assert_eq!(store.document_kind(path_doc).unwrap(), DocKind::Path);
        assert_eq!(store.document_kind(file_doc).unwrap(), DocKind::File);
        assert_eq!(store.document_path_node(file_doc, DocKind::File).unwrap(), node);
        assert_eq!(store.count_documents(DocKind::Path).unwrap(), 1);
        assert_eq!(store.count_documents(DocKind::File).unwrap(), 1);
        assert_eq!(store.count_rows(Table::Doc).unwrap(), 2);
    }

    #[test]
    fn test_reuse_touches_update_time() {
        let mut store = Store::open_in_memory().unwrap();
        let node = store.get_or_create_path_id(&["x"]).unwrap();
        let doc = store.get_or_create_file_document(node).unwrap();
        store
            .conn()
            .execute("UPDATE doc SET update_time = 0 WHERE id = ?1", params![doc])
            .unwrap();

        store.get_or_create_file_document(node).unwrap();
        let row = store.document(doc).unwrap().unwrap();
        assert!(row.update_time > 0);
        assert!(row.create_time > 0);
    }

    #[test]
    fn test_unknown_document() {
        let store = Store::open_in_memory().unwrap();
        assert_eq!(store.document_kind(99).unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_wrong_kind_binding_is_corruption() {
        let mut store = Store::open_in_memory().unwrap();
        let node = store.get_or_create_path_id(&["y"]).unwrap();
        let doc = store.get_or_create_path_document(node).unwrap();
        let err = store.document_path_node(doc, DocKind::File).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DataCorruption);
    }
}
