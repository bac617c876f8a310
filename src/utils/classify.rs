//! Binary/text classification of files before content indexing.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::warn;

/// Bytes inspected by the sampling classifier.
const SAMPLE_SIZE: usize = 8192;

/// Decides whether a file's content is worth tokenizing.
pub trait ContentClassifier {
    fn is_binary(&self, path: &Path) -> Result<bool>;
}

/// Which classifier an indexing run uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClassifierKind {
    /// Inspect the first bytes of the file in-process
    #[default]
    Sample,
    /// Ask `file --brief --mime-encoding`
    FileCommand,
}

impl ClassifierKind {
    pub fn build(self) -> Box<dyn ContentClassifier> {
        match self {
            ClassifierKind::Sample => Box::new(SampleClassifier),
            ClassifierKind::FileCommand => Box::new(FileCommandClassifier::default()),
        }
    }
}

/// Heuristic over the leading bytes: many NULs or control bytes means binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct SampleClassifier;

impl ContentClassifier for SampleClassifier {
    fn is_binary(&self, path: &Path) -> Result<bool> {
        let mut file = File::open(path).map_err(|e| Error::io(path, e))?;
        let mut sample = Vec::with_capacity(SAMPLE_SIZE);
        file.by_ref()
            .take(SAMPLE_SIZE as u64)
            .read_to_end(&mut sample)
            .map_err(|e| Error::io(path, e))?;
        Ok(is_binary(&sample))
    }
}

/// Delegates to the external `file` utility.
///
/// Any answer mentioning "binary" skips the content. When the utility cannot
/// be run the sampling heuristic decides instead.
#[derive(Debug, Clone)]
pub struct FileCommandClassifier {
    program: PathBuf,
}

impl Default for FileCommandClassifier {
    fn default() -> Self {
        Self {
            program: PathBuf::from("file"),
        }
    }
}

impl FileCommandClassifier {
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl ContentClassifier for FileCommandClassifier {
    fn is_binary(&self, path: &Path) -> Result<bool> {
        let output = Command::new(&self.program)
            .arg("--brief")
            .arg("--mime-encoding")
            .arg(path)
            .output();

        match output {
            Ok(out) if out.status.success() => {
                let verdict = String::from_utf8_lossy(&out.stdout);
                Ok(verdict.contains("binary"))
            }
            Ok(out) => {
                warn!(
                    path = %path.display(),
                    status = %out.status,
                    "file classifier failed, sampling instead"
                );
                SampleClassifier.is_binary(path)
            }
            Err(e) => {
                warn!(
                    program = %self.program.display(),
                    error = %e,
                    "file classifier unavailable, sampling instead"
                );
                SampleClassifier.is_binary(path)
            }
        }
    }
}

/// Check if content is likely binary
pub fn is_binary(content: &[u8]) -> bool {
    let sample = &content[..content.len().min(SAMPLE_SIZE)];
    if sample.is_empty() {
        return false;
    }

    // Any NUL in the sample is a strong signal
    if sample.contains(&0) {
        return true;
    }

    // High proportion of control bytes
    let control = sample
        .iter()
        .filter(|&&b| b < 0x20 && !matches!(b, b'\n' | b'\r' | b'\t' | 0x0C))
        .count();

    control > sample.len() / 8
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_is_binary() {
        assert!(!is_binary(b""));
        assert!(!is_binary(b"plain text\nwith lines\r\n\tand tabs"));
        assert!(!is_binary("caf\u{e9} cr\u{e8}me".as_bytes()));
        assert!(is_binary(b"ELF\x00\x01\x02"));
        assert!(is_binary(&[0x01, 0x02, 0x03, 0x04, b'a', b'b']));
    }

    #[test]
    fn test_sample_classifier_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let text = dir.path().join("a.txt");
        let bin = dir.path().join("a.bin");
        std::fs::write(&text, "hello world").unwrap();
        std::fs::File::create(&bin)
            .unwrap()
            .write_all(&[0u8, 159, 146, 150, 0, 0])
            .unwrap();

        assert!(!SampleClassifier.is_binary(&text).unwrap());
        assert!(SampleClassifier.is_binary(&bin).unwrap());
    }

    #[test]
    fn test_sample_classifier_missing_file() {
        let err = SampleClassifier
            .is_binary(Path::new("/definitely/not/here"))
            .unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::IoFailure);
    }

    #[test]
    fn test_file_command_falls_back_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let text = dir.path().join("a.txt");
        std::fs::write(&text, "hello world").unwrap();

        let classifier = FileCommandClassifier::with_program("/nonexistent/file-utility");
        assert!(!classifier.is_binary(&text).unwrap());
    }

    #[test]
    fn test_kind_serde() {
        let kind: ClassifierKind = serde_json::from_str("\"file-command\"").unwrap();
        assert_eq!(kind, ClassifierKind::FileCommand);
        assert_eq!(ClassifierKind::default(), ClassifierKind::Sample);
    }
}
