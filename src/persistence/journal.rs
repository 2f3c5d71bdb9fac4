//! Append-only transaction journal

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::error::{AppError, AppResult};

/// Transaction journal, one `[timestamp] KIND: details` line per entry
#[derive(Debug, Clone)]
pub struct Journal {
    path: PathBuf,
}

impl Journal {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, kind: &str, details: &str) -> AppResult<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| AppError::from_io(&self.path, e))?;
        writeln!(
            file,
            "[{}] {}: {}",
            Local::now().format("%Y-%m-%d %H:%M:%S"),
            single_line(kind),
            single_line(details)
        )
        .map_err(|e| AppError::from_io(&self.path, e))
    }

    /// Last `count` entries, oldest first. A journal that was never written
    /// to has no entries.
    pub fn tail(&self, count: usize) -> AppResult<Vec<String>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(AppError::from_io(&self.path, e)),
        };
        let lines: Vec<&str> = content.lines().collect();
        let start = lines.len().saturating_sub(count);
        Ok(lines[start..].iter().map(|line| line.to_string()).collect())
    }
}

/// Keep each entry on one line so `tail` counts entries
fn single_line(text: &str) -> String {
    text.replace('\r', "\\r").replace('\n', "\\n")
}
