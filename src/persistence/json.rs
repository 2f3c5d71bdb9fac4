//! JSON format: a document with top-level `items` and `users` arrays

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::LibrarySnapshot;
use crate::{
    error::{AppError, AppResult},
    models::{item::Item, user::User},
};

#[derive(Debug, Serialize, Deserialize)]
struct Document {
    library: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    generated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    items: Vec<Item>,
    #[serde(default)]
    users: Vec<User>,
}

pub fn encode(snapshot: &LibrarySnapshot) -> AppResult<String> {
    let document = Document {
        library: snapshot.name.clone(),
        generated_at: Some(Utc::now()),
        items: snapshot.items.clone(),
        users: snapshot.users.clone(),
    };
    serde_json::to_string_pretty(&document)
        .map_err(|e| AppError::parse(format!("JSON serialization error: {}", e)))
}

pub fn decode(content: &str) -> AppResult<LibrarySnapshot> {
    let document: Document = serde_json::from_str(content)
        .map_err(|e| AppError::parse(format!("Invalid JSON format: {}", e)))?;
    Ok(LibrarySnapshot {
        name: document.library,
        items: document.items,
        users: document.users,
    })
}
