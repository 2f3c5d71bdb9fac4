//! Item (catalog entry) model and related types.
//!
//! A single `Item` type covers physical books and electronic items; the
//! variant-specific attributes live in [`ItemKind`].

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::enums::{FileFormat, Genre};
use crate::{
    config::LoansConfig,
    error::{AppError, AppResult},
};

static ISBN10: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{9}[0-9X]$").expect("valid ISBN-10 pattern"));
static ISBN13: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{13}$").expect("valid ISBN-13 pattern"));

/// Variant tag of a catalog item
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ItemKind {
    #[default]
    Physical,
    Electronic {
        file_size_mb: f64,
        file_format: FileFormat,
        #[serde(default)]
        downloads: u32,
    },
}

impl ItemKind {
    pub fn electronic(file_size_mb: f64, file_format: FileFormat) -> Self {
        ItemKind::Electronic {
            file_size_mb,
            file_format,
            downloads: 0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Physical => "physical",
            ItemKind::Electronic { .. } => "electronic",
        }
    }
}

/// Catalog item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: u32,
    pub title: String,
    pub creator: String,
    pub year: i32,
    #[serde(default)]
    pub genre: Genre,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isbn: Option<String>,
    pub available: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub borrowed_by: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub borrowed_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub kind: ItemKind,
}

impl Item {
    /// Build an item from a validated creation request
    pub fn new(id: u32, create: CreateItem) -> Self {
        Self {
            id,
            title: create.title,
            creator: create.creator,
            year: create.year,
            genre: create.genre,
            isbn: create.isbn,
            available: true,
            borrowed_by: None,
            borrowed_at: None,
            kind: create.kind,
        }
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    pub fn is_electronic(&self) -> bool {
        matches!(self.kind, ItemKind::Electronic { .. })
    }

    /// Human-readable one-line description
    pub fn describe(&self) -> String {
        let status = match self.borrowed_by {
            Some(user_id) if !self.available => format!("Borrowed by User {}", user_id),
            _ if !self.available => "Borrowed".to_string(),
            _ => "Available".to_string(),
        };
        match &self.kind {
            ItemKind::Physical => format!(
                "[Book #{}] '{}' by {} ({}) - {}",
                self.id, self.title, self.creator, self.year, status
            ),
            ItemKind::Electronic {
                file_size_mb,
                file_format,
                downloads,
            } => format!(
                "[EBook #{}] '{}' by {} ({}) - {} | Format: {} | Size: {}MB | Downloads: {}",
                self.id, self.title, self.creator, self.year, status, file_format, file_size_mb, downloads
            ),
        }
    }

    pub fn mark_borrowed(&mut self, user_id: u32, at: DateTime<Utc>) -> AppResult<()> {
        if !self.available {
            return Err(AppError::Unavailable(self.id));
        }
        self.available = false;
        self.borrowed_by = Some(user_id);
        self.borrowed_at = Some(at);
        Ok(())
    }

    /// Mark the item as returned, giving back the time it was borrowed at
    pub fn mark_returned(&mut self) -> AppResult<Option<DateTime<Utc>>> {
        if self.available {
            return Err(AppError::InvalidState(format!(
                "Item {} is not currently borrowed",
                self.id
            )));
        }
        self.available = true;
        self.borrowed_by = None;
        Ok(self.borrowed_at.take())
    }

    /// Late fee for the given number of overdue days. Electronic items use
    /// their own, lower rate.
    pub fn late_fee(&self, days_late: i64, loans: &LoansConfig) -> Decimal {
        if days_late <= 0 {
            return Decimal::ZERO;
        }
        let rate = match self.kind {
            ItemKind::Physical => loans.physical_fee_per_day,
            ItemKind::Electronic { .. } => loans.electronic_fee_per_day,
        };
        (rate * Decimal::from(days_late)).round_dp(2)
    }

    /// Register a download of an electronic item
    pub fn download(&mut self) -> AppResult<u32> {
        match &mut self.kind {
            ItemKind::Electronic { downloads, .. } => {
                *downloads += 1;
                Ok(*downloads)
            }
            ItemKind::Physical => Err(AppError::InvalidState(format!(
                "Item {} is a physical book and cannot be downloaded",
                self.id
            ))),
        }
    }
}

impl std::fmt::Display for Item {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "'{}' by {}", self.title, self.creator)
    }
}

/// Create item request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateItem {
    /// Explicit identifier; the next free one is assigned when absent
    #[serde(default)]
    pub id: Option<u32>,
    #[validate(length(min = 1, message = "Title cannot be empty"))]
    pub title: String,
    #[validate(length(min = 1, message = "Creator cannot be empty"))]
    pub creator: String,
    #[validate(range(min = 1000, max = 2100, message = "Year must be between 1000 and 2100"))]
    pub year: i32,
    #[serde(default)]
    pub genre: Genre,
    #[serde(default)]
    pub isbn: Option<String>,
    #[serde(default)]
    pub kind: ItemKind,
}

impl CreateItem {
    pub fn book(title: impl Into<String>, creator: impl Into<String>, year: i32) -> Self {
        Self {
            id: None,
            title: title.into(),
            creator: creator.into(),
            year,
            genre: Genre::General,
            isbn: None,
            kind: ItemKind::Physical,
        }
    }

    pub fn ebook(
        title: impl Into<String>,
        creator: impl Into<String>,
        year: i32,
        file_size_mb: f64,
        file_format: FileFormat,
    ) -> Self {
        Self {
            kind: ItemKind::electronic(file_size_mb, file_format),
            ..Self::book(title, creator, year)
        }
    }

    pub fn with_id(mut self, id: u32) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_genre(mut self, genre: Genre) -> Self {
        self.genre = genre;
        self
    }

    pub fn with_isbn(mut self, isbn: impl Into<String>) -> Self {
        self.isbn = Some(isbn.into());
        self
    }

    /// Trim and validate all fields, normalizing the ISBN
    pub fn validated(mut self) -> AppResult<Self> {
        self.title = self.title.trim().to_string();
        self.creator = self.creator.trim().to_string();
        self.validate()?;

        if let Some(isbn) = self.isbn.take() {
            if !validate_isbn(&isbn) {
                return Err(AppError::Validation(format!("Invalid ISBN: {}", isbn)));
            }
            self.isbn = Some(normalize_isbn(&isbn));
        }

        if let ItemKind::Electronic { file_size_mb, .. } = self.kind {
            if !file_size_mb.is_finite() || file_size_mb < 0.0 {
                return Err(AppError::Validation(format!(
                    "Invalid file size: {}",
                    file_size_mb
                )));
            }
        }

        Ok(self)
    }
}

/// Strip separators from an ISBN
pub fn normalize_isbn(isbn: &str) -> String {
    isbn.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_uppercase()
}

/// Check ISBN-10 (last character may be `X`) or 13-digit ISBN-13 format
pub fn validate_isbn(isbn: &str) -> bool {
    let clean: String = isbn
        .chars()
        .filter(|c| *c != '-' && *c != ' ')
        .collect::<String>()
        .to_uppercase();
    ISBN10.is_match(&clean) || ISBN13.is_match(&clean)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> Item {
        Item::new(101, CreateItem::book("Python Guide", "John Doe", 2023))
    }

    #[test]
    fn test_normalize_isbn() {
        assert_eq!(normalize_isbn("978-2-07-040850-4"), "9782070408504");
        assert_eq!(normalize_isbn("2 07 040850 x"), "207040850X");
    }

    #[test]
    fn test_validate_isbn() {
        assert!(validate_isbn("0-306-40615-2"));
        assert!(validate_isbn("080442957X"));
        assert!(validate_isbn("978-0-306-40615-7"));
        assert!(!validate_isbn("12345"));
        assert!(!validate_isbn("X123456789"));
    }

    #[test]
    fn test_borrow_and_return_toggle_availability() {
        let mut item = sample();
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
        item.mark_borrowed(1001, at).unwrap();
        assert!(!item.is_available());
        assert_eq!(item.borrowed_by, Some(1001));

        let err = item.mark_borrowed(1002, at).unwrap_err();
        assert!(err.is_invalid_state());
        assert_eq!(item.borrowed_by, Some(1001));

        assert_eq!(item.mark_returned().unwrap(), Some(at));
        assert!(item.is_available());
        assert!(item.mark_returned().unwrap_err().is_invalid_state());
    }

    #[test]
    fn test_describe_per_variant() {
        assert_eq!(
            sample().describe(),
            "[Book #101] 'Python Guide' by John Doe (2023) - Available"
        );
        let ebook = Item::new(
            102,
            CreateItem::ebook("Web Development", "Jane Smith", 2024, 5.2, FileFormat::Pdf),
        );
        assert_eq!(
            ebook.describe(),
            "[EBook #102] 'Web Development' by Jane Smith (2024) - Available | Format: PDF | Size: 5.2MB | Downloads: 0"
        );
    }

    #[test]
    fn test_late_fee_rates() {
        let loans = LoansConfig::default();
        let book = sample();
        let ebook = Item::new(102, CreateItem::ebook("E", "A", 2024, 1.0, FileFormat::Epub));
        assert_eq!(book.late_fee(4, &loans), Decimal::new(200, 2));
        assert_eq!(ebook.late_fee(4, &loans), Decimal::new(100, 2));
        assert_eq!(book.late_fee(0, &loans), Decimal::ZERO);
    }

    #[test]
    fn test_download_only_electronic() {
        let mut book = sample();
        assert!(book.download().is_err());
        let mut ebook = Item::new(102, CreateItem::ebook("E", "A", 2024, 1.0, FileFormat::Pdf));
        assert_eq!(ebook.download().unwrap(), 1);
        assert_eq!(ebook.download().unwrap(), 2);
    }

    #[test]
    fn test_create_item_validation() {
        assert!(CreateItem::book("  ", "Someone", 2020).validated().is_err());
        assert!(CreateItem::book("Title", "Someone", 999).validated().is_err());
        assert!(CreateItem::book("Title", "Someone", 2020)
            .with_isbn("bad")
            .validated()
            .is_err());
        let ok = CreateItem::book(" Title ", "Someone", 2020)
            .with_isbn("978-0-306-40615-7")
            .validated()
            .unwrap();
        assert_eq!(ok.title, "Title");
        assert_eq!(ok.isbn.as_deref(), Some("9780306406157"));
    }
}
