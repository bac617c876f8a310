//! Typed views over result rows.

use crate::error::{Result, StorageContext};
use crate::index::types::{DocId, DocKind, PathId, WordId};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{Connection, Params, Row};

/// Builds a value from one row, reading columns by name.
pub trait FromRow: Sized {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;
}

impl ToSql for DocKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_int()))
    }
}

impl FromSql for DocKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let raw = value.as_i64()?;
        DocKind::from_int(raw).ok_or(FromSqlError::OutOfRange(raw))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathNode {
    pub id: PathId,
    pub name: String,
    /// `None` only for the root
    pub parent: Option<PathId>,
}

impl FromRow for PathNode {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            parent: row.get("parent")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRow {
    pub id: DocId,
    pub kind: DocKind,
    /// Unix seconds
    pub create_time: i64,
    pub update_time: i64,
}

impl FromRow for DocumentRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            kind: row.get("kind")?,
            create_time: row.get("create_time")?,
            update_time: row.get("update_time")?,
        })
    }
}

/// A match row joined with its document kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRow {
    pub word_id: WordId,
    pub doc_id: DocId,
    pub kind: DocKind,
    pub count: i64,
    pub avg_position: i64,
}

impl FromRow for MatchRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            word_id: row.get("word_id")?,
            doc_id: row.get("doc_id")?,
            kind: row.get("kind")?,
            count: row.get("count")?,
            avg_position: row.get("avg_position")?,
        })
    }
}

/// First row of a query, if any.
pub(crate) fn query_one<T: FromRow, P: Params>(
    conn: &Connection,
    sql: &str,
    params: P,
    op: &'static str,
) -> Result<Option<T>> {
    let mut stmt = conn.prepare_cached(sql).during(op)?;
    let mut rows = stmt.query(params).during(op)?;
    match rows.next().during(op)? {
        Some(row) => Ok(Some(T::from_row(row).during(op)?)),
        None => Ok(None),
    }
}

/// Every row of a query.
pub(crate) fn query_all<T: FromRow, P: Params>(
    conn: &Connection,
    sql: &str,
    params: P,
    op: &'static str,
) -> Result<Vec<T>> {
    let mut stmt = conn.prepare_cached(sql).during(op)?;
    let rows = stmt.query_map(params, T::from_row).during(op)?;
    rows.collect::<rusqlite::Result<Vec<T>>>().during(op)
}
