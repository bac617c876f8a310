use crate::error::Result;
use crate::index::types::DocKind;
use crate::store::{Store, Table};
use std::path::{Path, PathBuf};

/// Size and row counts of an index database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreStats {
    pub location: Option<PathBuf>,
    /// Database file plus its write-ahead log
    pub size_bytes: u64,
    pub path_nodes: u64,
    pub path_documents: u64,
    pub file_documents: u64,
    pub words: u64,
    pub matches: u64,
}

pub fn collect_stats(store: &Store) -> Result<StoreStats> {
    let location = store.location().map(Path::to_path_buf);
    let size_bytes = location.as_deref().map(db_size).unwrap_or(0);

    Ok(StoreStats {
        location,
        size_bytes,
        path_nodes: store.count_rows(Table::Path)?,
        path_documents: store.count_documents(DocKind::Path)?,
        file_documents: store.count_documents(DocKind::File)?,
        words: store.count_rows(Table::Word)?,
        matches: store.count_rows(Table::Matches)?,
    })
}

/// Display index statistics
pub fn show_stats(store: &Store) -> Result<()> {
    let stats = collect_stats(store)?;

    println!("Index Statistics");
    println!("================");
    println!();
    match &stats.location {
        Some(path) => println!("Database:         {}", path.display()),
        None => println!("Database:         (in memory)"),
    }
    println!("Size:             {}", format_size(stats.size_bytes));
    println!();
    println!("Path nodes:       {}", stats.path_nodes);
    println!("Path documents:   {}", stats.path_documents);
    println!("File documents:   {}", stats.file_documents);
    println!("Words:            {}", stats.words);
    println!("Matches:          {}", stats.matches);

    Ok(())
}

fn db_size(path: &Path) -> u64 {
    let mut wal = path.as_os_str().to_owned();
    wal.push("-wal");
    [path.to_path_buf(), PathBuf::from(wal)]
        .iter()
        .filter_map(|p| std::fs::metadata(p).ok())
        .map(|m| m.len())
        .sum()
}

/// Format byte size to human readable
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
