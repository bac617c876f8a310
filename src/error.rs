use std::path::PathBuf;

/// Broad failure categories surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidArgument,
    NotFound,
    IoFailure,
    CapacityExceeded,
    DataCorruption,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{what} not found: {key}")]
    NotFound { what: &'static str, key: String },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("storage error while {op}: {source}")]
    Storage {
        op: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    #[error("word table full ({capacity} buckets)")]
    CapacityExceeded { capacity: usize },

    #[error("data corruption: {0}")]
    DataCorruption(String),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Error::NotFound { .. } => ErrorKind::NotFound,
            Error::Io { .. } | Error::Storage { .. } => ErrorKind::IoFailure,
            Error::CapacityExceeded { .. } => ErrorKind::CapacityExceeded,
            Error::DataCorruption(_) => ErrorKind::DataCorruption,
        }
    }

    pub(crate) fn not_found(what: &'static str, key: impl ToString) -> Self {
        Error::NotFound {
            what,
            key: key.to_string(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Attaches the logical operation to a storage failure.
pub(crate) trait StorageContext<T> {
    fn during(self, op: &'static str) -> Result<T>;
}

impl<T> StorageContext<T> for std::result::Result<T, rusqlite::Error> {
    fn during(self, op: &'static str) -> Result<T> {
        self.map_err(|source| Error::Storage { op, source })
    }
}
