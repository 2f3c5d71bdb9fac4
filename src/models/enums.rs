//! Shared domain enums

use serde::{Deserialize, Serialize};

use crate::error::AppError;

// ---------------------------------------------------------------------------
// Genre
// ---------------------------------------------------------------------------

/// Catalog genres
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Genre {
    Fiction,
    #[serde(rename = "Non-Fiction")]
    NonFiction,
    Science,
    History,
    Programming,
    #[default]
    General,
}

impl Genre {
    pub const ALL: [Genre; 6] = [
        Genre::Fiction,
        Genre::NonFiction,
        Genre::Science,
        Genre::History,
        Genre::Programming,
        Genre::General,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Genre::Fiction => "Fiction",
            Genre::NonFiction => "Non-Fiction",
            Genre::Science => "Science",
            Genre::History => "History",
            Genre::Programming => "Programming",
            Genre::General => "General",
        }
    }
}

impl std::fmt::Display for Genre {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Genre {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Genre::ALL
            .into_iter()
            .find(|g| g.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| AppError::Validation(format!("Invalid genre: {}", s)))
    }
}

// ---------------------------------------------------------------------------
// FileFormat
// ---------------------------------------------------------------------------

/// Electronic item file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FileFormat {
    Pdf,
    Epub,
    Mobi,
}

impl FileFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileFormat::Pdf => "PDF",
            FileFormat::Epub => "EPUB",
            FileFormat::Mobi => "MOBI",
        }
    }
}

impl std::fmt::Display for FileFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for FileFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "PDF" => Ok(FileFormat::Pdf),
            "EPUB" => Ok(FileFormat::Epub),
            "MOBI" => Ok(FileFormat::Mobi),
            _ => Err(AppError::Validation(format!("Invalid file format: {}", s))),
        }
    }
}

// ---------------------------------------------------------------------------
// Membership
// ---------------------------------------------------------------------------

/// User membership tier. Premium tiers borrow more, keep items longer
/// and may borrow with a small outstanding fine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Membership {
    #[default]
    Standard,
    Silver,
    Gold,
    Platinum,
}

impl Membership {
    pub fn as_str(&self) -> &'static str {
        match self {
            Membership::Standard => "standard",
            Membership::Silver => "silver",
            Membership::Gold => "gold",
            Membership::Platinum => "platinum",
        }
    }

    pub fn is_premium(&self) -> bool {
        !matches!(self, Membership::Standard)
    }

    /// Next premium level; standard members and platinum stay where they are
    pub fn upgraded(&self) -> Self {
        match self {
            Membership::Standard => Membership::Standard,
            Membership::Silver => Membership::Gold,
            Membership::Gold | Membership::Platinum => Membership::Platinum,
        }
    }
}

impl std::fmt::Display for Membership {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Membership {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "standard" => Ok(Membership::Standard),
            "silver" => Ok(Membership::Silver),
            "gold" => Ok(Membership::Gold),
            "platinum" => Ok(Membership::Platinum),
            _ => Err(AppError::Validation(format!("Invalid membership: {}", s))),
        }
    }
}
