//! Persistence adapter
//!
//! Writes and reads the full library state as plain text, CSV or JSON.
//! A missing file is reported as `NotFound` and malformed content as
//! `Parse`; callers decide whether to fall back to an empty catalog.

pub mod csv;
pub mod journal;
pub mod json;
pub mod text;

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Deserialize;

use crate::{
    error::{AppError, AppResult},
    models::{item::Item, user::User},
    services::Library,
};

pub use journal::Journal;

/// Persisted file format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Text,
    Csv,
    Json,
}

impl Format {
    pub const ALL: [Format; 3] = [Format::Text, Format::Csv, Format::Json];

    pub fn extension(&self) -> &'static str {
        match self {
            Format::Text => "txt",
            Format::Csv => "csv",
            Format::Json => "json",
        }
    }

    /// Infer the format from a file extension
    pub fn from_path(path: &Path) -> AppResult<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .ok_or_else(|| {
                AppError::Validation(format!("{} has no file extension", path.display()))
            })?
            .parse()
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Format::Text => "text",
            Format::Csv => "csv",
            Format::Json => "json",
        };
        write!(f, "{}", label)
    }
}

impl std::str::FromStr for Format {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(Format::Text),
            "csv" => Ok(Format::Csv),
            "json" => Ok(Format::Json),
            _ => Err(AppError::Validation(format!("Unknown format: {}", s))),
        }
    }
}

/// Full library state as stored on disk
#[derive(Debug, Clone, PartialEq)]
pub struct LibrarySnapshot {
    pub name: String,
    pub items: Vec<Item>,
    pub users: Vec<User>,
}

/// Render a snapshot in the given format
pub fn encode(snapshot: &LibrarySnapshot, format: Format) -> AppResult<String> {
    match format {
        Format::Text => Ok(text::encode(snapshot)),
        Format::Csv => csv::encode(snapshot),
        Format::Json => json::encode(snapshot),
    }
}

/// Parse a snapshot from file content
pub fn decode(content: &str, format: Format) -> AppResult<LibrarySnapshot> {
    match format {
        Format::Text => text::decode(content),
        Format::Csv => csv::decode(content),
        Format::Json => json::decode(content),
    }
}

/// Write the library state to `path`
pub fn save(library: &Library, path: &Path, format: Format) -> AppResult<()> {
    let content = encode(&library.snapshot(), format)?;

    let file = File::create(path).map_err(|e| AppError::from_io(path, e))?;
    let mut writer = BufWriter::new(file);
    writer
        .write_all(content.as_bytes())
        .and_then(|_| writer.flush())
        .map_err(|e| AppError::from_io(path, e))?;

    tracing::info!("Saved library '{}' to {} as {}", library.name(), path.display(), format);
    Ok(())
}

/// Read a library state from `path`
pub fn load(path: &Path, format: Format) -> AppResult<LibrarySnapshot> {
    let content = fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::InvalidData => {
            AppError::parse(format!("{} is not valid UTF-8", path.display()))
        }
        _ => AppError::from_io(path, e),
    })?;

    let snapshot = decode(&content, format)?;
    tracing::info!(
        "Loaded {} items and {} users from {}",
        snapshot.items.len(),
        snapshot.users.len(),
        path.display()
    );
    Ok(snapshot)
}

/// Copy a saved file to `destination`, returning the number of bytes written.
/// Errors name the file that could not be read or written.
pub fn backup(source: &Path, destination: &Path) -> AppResult<u64> {
    let content = fs::read(source).map_err(|e| AppError::from_io(source, e))?;
    fs::write(destination, &content).map_err(|e| AppError::from_io(destination, e))?;

    tracing::info!("Backed up {} to {}", source.display(), destination.display());
    Ok(content.len() as u64)
}
