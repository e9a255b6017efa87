//! Output handling: content-hashed file writes and the optional JSON
//! generation report.

use std::path::{Path, PathBuf};

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::codegen::lambda::DedupStats;
use crate::diagnostics::GenError;

/// Hex SHA-256 of file content.
pub fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

/// Result of a single output-file write.
#[derive(Debug, Clone, Serialize)]
pub struct FileOutcome {
    pub path: PathBuf,
    /// False when the file already had identical content.
    pub written: bool,
    pub hash: String,
}

/// Write `content` to `path` unless the file already matches it.
/// Unchanged files keep their mtime.
pub fn write_if_changed(path: &Path, content: &str) -> Result<FileOutcome, GenError> {
    let hash = content_hash(content);

    if let Ok(existing) = std::fs::read_to_string(path) {
        if content_hash(&existing) == hash {
            return Ok(FileOutcome { path: path.to_path_buf(), written: false, hash });
        }
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            GenError::io(format!("failed to create {}: {e}", parent.display()))
        })?;
    }
    std::fs::write(path, content)
        .map_err(|e| GenError::io(format!("failed to write {}: {e}", path.display())))?;

    Ok(FileOutcome { path: path.to_path_buf(), written: true, hash })
}

/// Summary of one generation run, serializable as the `--report` JSON.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub device: String,
    pub board: String,
    pub components: usize,
    pub files: Vec<FileOutcome>,
    pub lambdas: DedupStats,
}

pub fn write_report(path: &Path, report: &Report) -> Result<(), GenError> {
    let json = serde_json::to_string_pretty(report)
        .map_err(|e| GenError::io(format!("failed to serialize report: {e}")))?;
    std::fs::write(path, json)
        .map_err(|e| GenError::io(format!("failed to write {}: {e}", path.display())))
}
