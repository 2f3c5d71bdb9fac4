//! Plain-text format
//!
//! One record per line, fields separated by `|`:
//!
//! ```text
//! # Python Learning Library Data
//! # Generated: 2024-05-01 10:00:00
//! library|name=Python Learning Library
//! item|id=101|kind=physical|title=Python Guide|creator=John Doe|year=2023|genre=General|available=true
//! user|id=1001|name=Alice|email=alice@email.com|membership=standard|fine=0|borrowed=|reservations=
//! ```
//!
//! `\`, `|` and line breaks inside values are escaped with a backslash.
//! Lines starting with `#` and blank lines are ignored.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::str::FromStr;

use chrono::{DateTime, Local, Utc};

use super::LibrarySnapshot;
use crate::{
    error::{AppError, AppResult},
    models::{
        item::{Item, ItemKind},
        user::User,
    },
};

const DEFAULT_NAME: &str = "Loaded Library";

pub fn encode(snapshot: &LibrarySnapshot) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# {} Data", escape(&snapshot.name));
    let _ = writeln!(out, "# Generated: {}", Local::now().format("%Y-%m-%d %H:%M:%S"));
    out.push_str(&line("library", &[("name", snapshot.name.clone())]));

    for item in &snapshot.items {
        out.push_str(&line("item", &item_fields(item)));
    }
    for user in &snapshot.users {
        out.push_str(&line("user", &user_fields(user)));
    }
    out
}

pub fn decode(content: &str) -> AppResult<LibrarySnapshot> {
    let mut name = None;
    let mut items = Vec::new();
    let mut users = Vec::new();

    for (index, raw) in content.lines().enumerate() {
        let text = raw.trim_start();
        if text.trim_end().is_empty() || text.starts_with('#') {
            continue;
        }
        let record = Record::parse(index + 1, text)?;
        match record.kind.as_str() {
            "library" => {
                if name.is_some() {
                    return Err(record.error("duplicate library record"));
                }
                name = Some(record.required("name")?.to_string());
            }
            "item" => items.push(record.to_item()?),
            "user" => users.push(record.to_user()?),
            other => return Err(record.error(&format!("unknown record type '{}'", other))),
        }
    }

    Ok(LibrarySnapshot {
        name: name.unwrap_or_else(|| DEFAULT_NAME.to_string()),
        items,
        users,
    })
}

fn item_fields(item: &Item) -> Vec<(&'static str, String)> {
    let mut fields = vec![
        ("id", item.id.to_string()),
        ("kind", item.kind.as_str().to_string()),
        ("title", item.title.clone()),
        ("creator", item.creator.clone()),
        ("year", item.year.to_string()),
        ("genre", item.genre.to_string()),
    ];
    if let Some(isbn) = &item.isbn {
        fields.push(("isbn", isbn.clone()));
    }
    fields.push(("available", item.available.to_string()));
    if let Some(user_id) = item.borrowed_by {
        fields.push(("borrowed_by", user_id.to_string()));
    }
    if let Some(at) = item.borrowed_at {
        fields.push(("borrowed_at", at.to_rfc3339()));
    }
    if let ItemKind::Electronic {
        file_size_mb,
        file_format,
        downloads,
    } = &item.kind
    {
        fields.push(("file_size_mb", file_size_mb.to_string()));
        fields.push(("file_format", file_format.to_string()));
        fields.push(("downloads", downloads.to_string()));
    }
    fields
}

fn user_fields(user: &User) -> Vec<(&'static str, String)> {
    vec![
        ("id", user.id.to_string()),
        ("name", user.name.clone()),
        ("email", user.email.clone()),
        ("membership", user.membership.to_string()),
        ("fine", user.fine.to_string()),
        ("borrowed", id_list(&user.borrowed)),
        ("reservations", id_list(&user.reservations)),
    ]
}

fn id_list(ids: &[u32]) -> String {
    ids.iter().map(u32::to_string).collect::<Vec<_>>().join(";")
}

fn line(kind: &str, fields: &[(&str, String)]) -> String {
    let mut out = kind.to_string();
    for (key, value) in fields {
        out.push('|');
        out.push_str(key);
        out.push('=');
        out.push_str(&escape(value));
    }
    out.push('\n');
    out
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '|' => out.push_str("\\|"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out
}

/// Split a line on unescaped `|`, unescaping each field
fn split_fields(line: &str) -> Option<Vec<String>> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next()? {
                '\\' => current.push('\\'),
                '|' => current.push('|'),
                'n' => current.push('\n'),
                'r' => current.push('\r'),
                _ => return None,
            },
            '|' => fields.push(std::mem::take(&mut current)),
            c => current.push(c),
        }
    }
    fields.push(current);
    Some(fields)
}

/// One parsed line
struct Record {
    line: usize,
    kind: String,
    fields: HashMap<String, String>,
}

impl Record {
    fn parse(line: usize, text: &str) -> AppResult<Self> {
        let parts = split_fields(text)
            .ok_or_else(|| AppError::parse(format!("line {}: invalid escape sequence", line)))?;
        let mut parts = parts.into_iter();
        let kind = parts.next().unwrap_or_default();

        let mut fields = HashMap::new();
        for part in parts {
            let (key, value) = part.split_once('=').ok_or_else(|| {
                AppError::parse(format!("line {}: expected key=value, got '{}'", line, part))
            })?;
            if fields.insert(key.to_string(), value.to_string()).is_some() {
                return Err(AppError::parse(format!("line {}: duplicate field '{}'", line, key)));
            }
        }
        Ok(Self { line, kind, fields })
    }

    fn error(&self, message: &str) -> AppError {
        AppError::parse(format!("line {}: {}", self.line, message))
    }

    fn optional(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    fn required(&self, key: &str) -> AppResult<&str> {
        self.optional(key)
            .ok_or_else(|| self.error(&format!("missing field '{}'", key)))
    }

    fn value<T>(&self, key: &str) -> AppResult<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        let raw = self.required(key)?;
        raw.parse()
            .map_err(|e| self.error(&format!("invalid {} '{}': {}", key, raw, e)))
    }

    fn optional_value<T>(&self, key: &str) -> AppResult<Option<T>>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.optional(key) {
            Some(_) => self.value(key).map(Some),
            None => Ok(None),
        }
    }

    fn timestamp(&self, key: &str) -> AppResult<Option<DateTime<Utc>>> {
        self.optional(key)
            .map(|raw| {
                DateTime::parse_from_rfc3339(raw)
                    .map(|t| t.with_timezone(&Utc))
                    .map_err(|e| self.error(&format!("invalid {} '{}': {}", key, raw, e)))
            })
            .transpose()
    }

    fn to_item(&self) -> AppResult<Item> {
        let kind = match self.required("kind")? {
            "physical" => ItemKind::Physical,
            "electronic" => ItemKind::Electronic {
                file_size_mb: self.value("file_size_mb")?,
                file_format: self.value("file_format")?,
                downloads: self.optional_value("downloads")?.unwrap_or(0),
            },
            other => return Err(self.error(&format!("unknown item kind '{}'", other))),
        };

        Ok(Item {
            id: self.value("id")?,
            title: self.required("title")?.to_string(),
            creator: self.required("creator")?.to_string(),
            year: self.value("year")?,
            genre: self.optional_value("genre")?.unwrap_or_default(),
            isbn: self.optional("isbn").map(String::from),
            available: self.value("available")?,
            borrowed_by: self.optional_value("borrowed_by")?,
            borrowed_at: self.timestamp("borrowed_at")?,
            kind,
        })
    }

    /// `;`-separated identifiers; a missing or empty field is an empty list
    fn ids(&self, key: &str) -> AppResult<Vec<u32>> {
        match self.optional(key) {
            Some(list) if !list.is_empty() => list
                .split(';')
                .map(|id| {
                    id.trim()
                        .parse::<u32>()
                        .map_err(|e| self.error(&format!("invalid {} id '{}': {}", key, id, e)))
                })
                .collect(),
            _ => Ok(Vec::new()),
        }
    }

    fn to_user(&self) -> AppResult<User> {
        Ok(User {
            id: self.value("id")?,
            name: self.required("name")?.to_string(),
            email: self.required("email")?.to_string(),
            membership: self.optional_value("membership")?.unwrap_or_default(),
            fine: self.optional_value("fine")?.unwrap_or_default(),
            borrowed: self.ids("borrowed")?,
            reservations: self.ids("reservations")?,
        })
    }
}
