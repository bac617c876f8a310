//! Hierarchical path interning.
//!
//! A path is stored as a chain of `(name, parent)` nodes hanging off the root
//! row, so shared prefixes are stored once.

use super::rows::{query_one, PathNode};
use super::{Store, ROOT_PATH_ID};
use crate::error::{Error, Result, StorageContext};
use crate::index::types::PathId;
use rusqlite::{params, OptionalExtension};
use std::path::{Component, Path};

/// Deeper chains can only come from a cycle in the parent links.
const MAX_PATH_DEPTH: usize = 4096;

/// Segment names of a path, ignoring the root, `.` and prefix components.
///
/// Names are stored as text, so a segment that is not valid UTF-8 is an
/// `InvalidArgument` rather than a lossy approximation that could alias
/// another path.
pub fn path_segments(path: &Path) -> Result<Vec<String>> {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(name) => Some(name),
            _ => None,
        })
        .map(|name| {
            name.to_str().map(str::to_owned).ok_or_else(|| {
                Error::InvalidArgument(format!(
                    "path segment is not valid UTF-8: {}",
                    name.to_string_lossy()
                ))
            })
        })
        .collect()
}

impl Store {
    /// Walk the segments from the root, creating missing nodes, and return
    /// the id of the last one. An empty slice yields the root.
    pub fn get_or_create_path_id<S: AsRef<str>>(&mut self, segments: &[S]) -> Result<PathId> {
        let mut current = ROOT_PATH_ID;
        for segment in segments {
            current = self.child_id(current, segment.as_ref())?;
        }
        Ok(current)
    }

    /// Convenience wrapper over [`Store::get_or_create_path_id`].
    pub fn path_id_for(&mut self, path: &Path) -> Result<PathId> {
        self.get_or_create_path_id(&path_segments(path)?)
    }

    fn child_id(&mut self, parent: PathId, name: &str) -> Result<PathId> {
        let key = (parent, name.to_owned());
        if let Some(&id) = self.segments.get(&key) {
            return Ok(id);
        }

        let existing: Option<PathId> = self
            .conn
            .prepare_cached("SELECT id FROM path WHERE name = ?1 AND parent = ?2")
            .during("looking up path segment")?
            .query_row(params![name, parent], |row| row.get(0))
            .optional()
            .during("looking up path segment")?;

        let id = match existing {
            Some(id) => id,
            None => {
                self.conn
                    .prepare_cached("INSERT INTO path (name, parent) VALUES (?1, ?2)")
                    .during("creating path segment")?
                    .execute(params![name, parent])
                    .during("creating path segment")?;
                self.conn.last_insert_rowid()
            }
        };

        self.segments.put(key, id);
        Ok(id)
    }

    pub fn path_node(&self, id: PathId) -> Result<Option<PathNode>> {
        query_one(
            &self.conn,
            "SELECT id, name, parent FROM path WHERE id = ?1",
            params![id],
            "reading path node",
        )
    }

    /// Rebuild `"/a/b/c"` from a leaf node id. The root alone renders as `"/"`.
    pub fn build_path_string(&self, node_id: PathId) -> Result<String> {
        let mut node = self
            .path_node(node_id)?
            .ok_or_else(|| Error::not_found("path node", node_id))?;

        let mut names = Vec::new();
        while let Some(parent) = node.parent.filter(|&p| p > 0) {
            if names.len() >= MAX_PATH_DEPTH {
                return Err(Error::DataCorruption(format!(
                    "path node {node_id} has a cyclic parent chain"
                )));
            }
            let child = node.id;
            names.push(node.name);
            node = self.path_node(parent)?.ok_or_else(|| {
                Error::DataCorruption(format!(
                    "path node {child} references missing parent {parent}"
                ))
            })?;
        }

        if names.is_empty() {
            return Ok("/".to_string());
        }
        let mut out = String::new();
        for name in names.iter().rev() {
            out.push('/');
            out.push_str(name);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Table;
    use crate::ErrorKind;

    #[test]
    fn test_segments_skip_root_and_curdir() {
        assert_eq!(
            path_segments(Path::new("/tmp/./a.txt")).unwrap(),
            vec!["tmp", "a.txt"]
        );
        assert!(path_segments(Path::new("/")).unwrap().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_segment_rejected() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let mut store = Store::open_in_memory().unwrap();
        for name in [&b"x\xff"[..], &b"x\xfe"[..]] {
            let path = Path::new("/tmp").join(OsStr::from_bytes(name));
            let err = path_segments(&path).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidArgument);
            assert_eq!(store.path_id_for(&path).unwrap_err().kind(), ErrorKind::InvalidArgument);
        }
        // Nothing was interned for the rejected paths
        assert_eq!(store.count_rows(Table::Path).unwrap(), 1);
    }

    #[test]
    fn test_round_trip() {
        let mut store = Store::open_in_memory().unwrap();
        let cases: &[&[&str]] = &[
            &["tmp", "a.txt"],
            &["home", "user", "src", "main.rs"],
            &["single"],
            &["with space", "ünïcode", "x"],
        ];
        for segments in cases {
            let id = store.get_or_create_path_id(segments).unwrap();
            assert_eq!(
                store.build_path_string(id).unwrap(),
                format!("/{}", segments.join("/"))
            );
        }
    }

    #[test]
    fn test_shared_prefix_interned_once() {
        let mut store = Store::open_in_memory().unwrap();
        let a = store.get_or_create_path_id(&["usr", "lib", "a"]).unwrap();
        let b = store.get_or_create_path_id(&["usr", "lib", "b"]).unwrap();
        let a_again = store.get_or_create_path_id(&["usr", "lib", "a"]).unwrap();

        assert_ne!(a, b);
        assert_eq!(a, a_again);
        // root + usr + lib + a + b
        assert_eq!(store.count_rows(Table::Path).unwrap(), 5);
    }

    #[test]
    fn test_same_name_under_different_parents() {
        let mut store = Store::open_in_memory().unwrap();
        let x = store.get_or_create_path_id(&["a", "same"]).unwrap();
        let y = store.get_or_create_path_id(&["b", "same"]).unwrap();
        assert_ne!(x, y);
        assert_eq!(store.build_path_string(y).unwrap(), "/b/same");
    }

    #[test]
    fn test_root_renders_as_slash() {
        let mut store = Store::open_in_memory().unwrap();
        let empty: [&str; 0] = [];
        assert_eq!(store.get_or_create_path_id(&empty).unwrap(), ROOT_PATH_ID);
        assert_eq!(store.build_path_string(ROOT_PATH_ID).unwrap(), "/");
    }

    #[test]
    fn test_unknown_node_is_not_found() {
        let store = Store::open_in_memory().unwrap();
        let err = store.build_path_string(424242).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_missing_parent_is_corruption() {
        let store = Store::open_in_memory().unwrap();
        store
            .conn()
            .execute_batch(
                "PRAGMA foreign_keys = OFF;
                 INSERT INTO path (id, name, parent) VALUES (50, 'orphan', 49);",
            )
            .unwrap();
        let err = store.build_path_string(50).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DataCorruption);
    }

    #[test]
    fn test_cycle_is_corruption() {
        let store = Store::open_in_memory().unwrap();
        store
            .conn()
            .execute_batch(
                "PRAGMA foreign_keys = OFF;
                 INSERT INTO path (id, name, parent) VALUES (60, 'a', 61);
                 INSERT INTO path (id, name, parent) VALUES (61, 'b', 60);",
            )
            .unwrap();
        let err = store.build_path_string(60).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DataCorruption);
    }
}
