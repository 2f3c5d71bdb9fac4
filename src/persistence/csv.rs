//! CSV format: a single header row followed by one row per library, item
//! or user record. Columns that do not apply to a record are left empty.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::LibrarySnapshot;
use crate::{
    error::{AppError, AppResult},
    models::{
        enums::{FileFormat, Genre, Membership},
        item::{Item, ItemKind},
        user::User,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum RecordType {
    Library,
    Item,
    User,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum KindColumn {
    Physical,
    Electronic,
}

/// One CSV row
#[derive(Debug, Serialize, Deserialize)]
struct Row {
    record: RecordType,
    id: Option<u32>,
    kind: Option<KindColumn>,
    title: Option<String>,
    creator: Option<String>,
    year: Option<i32>,
    genre: Option<Genre>,
    isbn: Option<String>,
    available: Option<bool>,
    borrowed_by: Option<u32>,
    borrowed_at: Option<DateTime<Utc>>,
    file_size_mb: Option<f64>,
    file_format: Option<FileFormat>,
    downloads: Option<u32>,
    name: Option<String>,
    email: Option<String>,
    membership: Option<Membership>,
    fine: Option<String>,
    borrowed: Option<String>,
    reservations: Option<String>,
}

impl Row {
    fn empty(record: RecordType) -> Self {
        Self {
            record,
            id: None,
            kind: None,
            title: None,
            creator: None,
            year: None,
            genre: None,
            isbn: None,
            available: None,
            borrowed_by: None,
            borrowed_at: None,
            file_size_mb: None,
            file_format: None,
            downloads: None,
            name: None,
            email: None,
            membership: None,
            fine: None,
            borrowed: None,
            reservations: None,
        }
    }

    fn library(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            ..Self::empty(RecordType::Library)
        }
    }

    fn from_item(item: &Item) -> Self {
        let mut row = Self {
            id: Some(item.id),
            kind: Some(KindColumn::Physical),
            title: Some(item.title.clone()),
            creator: Some(item.creator.clone()),
            year: Some(item.year),
            genre: Some(item.genre),
            isbn: item.isbn.clone(),
            available: Some(item.available),
            borrowed_by: item.borrowed_by,
            borrowed_at: item.borrowed_at,
            ..Self::empty(RecordType::Item)
        };
        if let ItemKind::Electronic {
            file_size_mb,
            file_format,
            downloads,
        } = &item.kind
        {
            row.kind = Some(KindColumn::Electronic);
            row.file_size_mb = Some(*file_size_mb);
            row.file_format = Some(*file_format);
            row.downloads = Some(*downloads);
        }
        row
    }

    fn from_user(user: &User) -> Self {
        Self {
            id: Some(user.id),
            name: Some(user.name.clone()),
            email: Some(user.email.clone()),
            membership: Some(user.membership),
            fine: Some(user.fine.to_string()),
            borrowed: Some(id_list(&user.borrowed)),
            reservations: Some(id_list(&user.reservations)),
            ..Self::empty(RecordType::User)
        }
    }

    fn into_item(self, row_num: usize) -> AppResult<Item> {
        let missing = |column: &str| AppError::parse(format!("row {}: missing {}", row_num, column));
        let kind = match self.kind.ok_or_else(|| missing("kind"))? {
            KindColumn::Physical => ItemKind::Physical,
            KindColumn::Electronic => ItemKind::Electronic {
                file_size_mb: self.file_size_mb.ok_or_else(|| missing("file_size_mb"))?,
                file_format: self.file_format.ok_or_else(|| missing("file_format"))?,
                downloads: self.downloads.unwrap_or(0),
            },
        };
        Ok(Item {
            id: self.id.ok_or_else(|| missing("id"))?,
            title: self.title.ok_or_else(|| missing("title"))?,
            creator: self.creator.ok_or_else(|| missing("creator"))?,
            year: self.year.ok_or_else(|| missing("year"))?,
            genre: self.genre.unwrap_or_default(),
            isbn: self.isbn,
            available: self.available.ok_or_else(|| missing("available"))?,
            borrowed_by: self.borrowed_by,
            borrowed_at: self.borrowed_at,
            kind,
        })
    }

    fn into_user(self, row_num: usize) -> AppResult<User> {
        let missing = |column: &str| AppError::parse(format!("row {}: missing {}", row_num, column));
        let fine = match self.fine.as_deref() {
            Some(raw) => Decimal::from_str(raw)
                .map_err(|e| AppError::parse(format!("row {}: invalid fine '{}': {}", row_num, raw, e)))?,
            None => Decimal::ZERO,
        };
        let borrowed = parse_ids(self.borrowed.as_deref(), "borrowed", row_num)?;
        let reservations = parse_ids(self.reservations.as_deref(), "reservations", row_num)?;

        Ok(User {
            id: self.id.ok_or_else(|| missing("id"))?,
            name: self.name.ok_or_else(|| missing("name"))?,
            email: self.email.ok_or_else(|| missing("email"))?,
            membership: self.membership.unwrap_or_default(),
            fine,
            borrowed,
            reservations,
        })
    }
}

fn id_list(ids: &[u32]) -> String {
    ids.iter().map(u32::to_string).collect::<Vec<_>>().join(";")
}

fn parse_ids(list: Option<&str>, column: &str, row_num: usize) -> AppResult<Vec<u32>> {
    list.unwrap_or_default()
        .split(';')
        .filter(|id| !id.trim().is_empty())
        .map(|id| {
            id.trim().parse::<u32>().map_err(|e| {
                AppError::parse(format!("row {}: invalid {} id '{}': {}", row_num, column, id, e))
            })
        })
        .collect()
}

pub fn encode(snapshot: &LibrarySnapshot) -> AppResult<String> {
    let mut writer = ::csv::WriterBuilder::new()
        .has_headers(true)
        .from_writer(Vec::new());

    let rows = std::iter::once(Row::library(&snapshot.name))
        .chain(snapshot.items.iter().map(Row::from_item))
        .chain(snapshot.users.iter().map(Row::from_user));
    for row in rows {
        writer
            .serialize(row)
            .map_err(|e| AppError::parse(format!("CSV serialization error: {}", e)))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| AppError::parse(format!("CSV serialization error: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| AppError::parse(format!("CSV output is not UTF-8: {}", e)))
}

pub fn decode(content: &str) -> AppResult<LibrarySnapshot> {
    let mut reader = ::csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(content.as_bytes());

    let mut name = None;
    let mut items = Vec::new();
    let mut users = Vec::new();

    // Row 1 is the header
    for (index, result) in reader.deserialize::<Row>().enumerate() {
        let row_num = index + 2;
        let row = result.map_err(|e| AppError::parse(format!("row {}: {}", row_num, e)))?;
        match row.record {
            RecordType::Library => {
                if name.is_some() {
                    return Err(AppError::parse(format!("row {}: duplicate library record", row_num)));
                }
                name = Some(row.name.unwrap_or_default());
            }
            RecordType::Item => items.push(row.into_item(row_num)?),
            RecordType::User => users.push(row.into_user(row_num)?),
        }
    }

    Ok(LibrarySnapshot {
        name: name.unwrap_or_else(|| "Loaded Library".to_string()),
        items,
        users,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_row() {
        let snapshot = LibrarySnapshot {
            name: "Town Library".to_string(),
            items: vec![],
            users: vec![],
        };
        let content = encode(&snapshot).unwrap();
        let mut lines = content.lines();
        assert_eq!(
            lines.next().unwrap(),
            "record,id,kind,title,creator,year,genre,isbn,available,borrowed_by,borrowed_at,\
             file_size_mb,file_format,downloads,name,email,membership,fine,borrowed,reservations"
        );
        assert_eq!(lines.next().unwrap(), "library,,,,,,,,,,,,,,Town Library,,,,,");
    }

    #[test]
    fn test_decode_rejects_bad_values() {
        let header = "record,id,kind,title,creator,year,genre,isbn,available,borrowed_by,borrowed_at,\
                      file_size_mb,file_format,downloads,name,email,membership,fine,borrowed,reservations\n";
        let bad_year = format!("{}item,1,physical,T,C,soon,General,,true,,,,,,,,,,,\n", header);
        let err = decode(&bad_year).unwrap_err();
        assert!(matches!(&err, AppError::Parse(msg) if msg.starts_with("row 2")));

        let missing_title = format!("{}item,1,physical,,C,2000,General,,true,,,,,,,,,,,\n", header);
        assert!(matches!(decode(&missing_title), Err(AppError::Parse(_))));

        let unknown_record = format!("{}shelf,1,,,,,,,,,,,,,,,,,,\n", header);
        assert!(matches!(decode(&unknown_record), Err(AppError::Parse(_))));
    }
}
