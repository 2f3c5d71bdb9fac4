//! Business logic services
//!
//! [`Library`] owns the item and user collections together with the loan
//! policy. Its operations are split by concern across the submodules.

pub mod catalog;
pub mod loans;
pub mod users;

use std::collections::HashSet;

use crate::{
    config::{AppConfig, LoansConfig},
    error::{AppError, AppResult},
    models::{item::Item, user::User},
    persistence::{Journal, LibrarySnapshot},
    repository::Repository,
};

pub use catalog::{CatalogStats, ItemQuery};
pub use loans::ReturnReceipt;

/// The library manager
#[derive(Debug, Clone)]
pub struct Library {
    name: String,
    loans: LoansConfig,
    repository: Repository,
    journal: Option<Journal>,
}

impl Library {
    /// Create an empty library with the given loan policy
    pub fn new(name: impl Into<String>, loans: LoansConfig) -> Self {
        Self {
            name: name.into(),
            loans,
            repository: Repository::new(),
            journal: None,
        }
    }

    /// Create an empty library from the application configuration,
    /// attaching the transaction journal when one is configured
    pub fn from_config(config: &AppConfig) -> Self {
        let library = Self::new(config.library.name.clone(), config.loans.clone());
        match config.storage.journal_path() {
            Some(path) => library.with_journal(Journal::new(path)),
            None => library,
        }
    }

    pub fn with_journal(mut self, journal: Journal) -> Self {
        self.journal = Some(journal);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn loans(&self) -> &LoansConfig {
        &self.loans
    }

    pub fn journal(&self) -> Option<&Journal> {
        self.journal.as_ref()
    }

    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.repository.items.iter()
    }

    pub fn users(&self) -> impl Iterator<Item = &User> {
        self.repository.users.iter()
    }

    /// Copy of the full library state, in insertion order
    pub fn snapshot(&self) -> LibrarySnapshot {
        LibrarySnapshot {
            name: self.name.clone(),
            items: self.items().cloned().collect(),
            users: self.users().cloned().collect(),
        }
    }

    /// Rebuild a library from persisted state. Identifiers must be unique and
    /// every borrowed item must be held by exactly the user it names.
    pub fn from_snapshot(snapshot: LibrarySnapshot, loans: LoansConfig) -> AppResult<Self> {
        let mut library = Self::new(snapshot.name, loans);

        for item in snapshot.items {
            let id = item.id;
            library
                .repository
                .items
                .insert(item)
                .map_err(|_| AppError::parse(format!("duplicate item id {}", id)))?;
        }
        for user in snapshot.users {
            let id = user.id;
            library
                .repository
                .users
                .insert(user)
                .map_err(|_| AppError::parse(format!("duplicate user id {}", id)))?;
        }

        library.check_consistency()?;
        tracing::debug!(
            "Restored library '{}' with {} items and {} users",
            library.name,
            library.repository.items.len(),
            library.repository.users.len()
        );
        Ok(library)
    }

    fn check_consistency(&self) -> AppResult<()> {
        let mut held = HashSet::new();
        for user in self.repository.users.iter() {
            for &item_id in &user.borrowed {
                if !held.insert(item_id) {
                    return Err(AppError::parse(format!(
                        "item {} is held more than once",
                        item_id
                    )));
                }
                let item = self.repository.items.get(item_id).map_err(|_| {
                    AppError::parse(format!("user {} holds unknown item {}", user.id, item_id))
                })?;
                if item.available || item.borrowed_by != Some(user.id) {
                    return Err(AppError::parse(format!(
                        "item {} is held by user {} but not marked as borrowed by them",
                        item_id, user.id
                    )));
                }
            }
        }

        for user in self.repository.users.iter() {
            for (position, &item_id) in user.reservations.iter().enumerate() {
                if !self.repository.items.contains(item_id) {
                    return Err(AppError::parse(format!(
                        "user {} reserved unknown item {}",
                        user.id, item_id
                    )));
                }
                if user.reservations[..position].contains(&item_id) {
                    return Err(AppError::parse(format!(
                        "user {} reserved item {} more than once",
                        user.id, item_id
                    )));
                }
            }
        }

        for item in self.repository.items.iter() {
            if item.available && (item.borrowed_by.is_some() || item.borrowed_at.is_some()) {
                return Err(AppError::parse(format!(
                    "item {} is available but has a borrower",
                    item.id
                )));
            }
            if !item.available && !held.contains(&item.id) {
                return Err(AppError::parse(format!(
                    "item {} is borrowed but no user holds it",
                    item.id
                )));
            }
        }
        Ok(())
    }

    /// Append a line to the transaction journal, if any.
    /// Journal failures never fail the operation being recorded.
    fn record(&self, kind: &str, details: &str) {
        if let Some(journal) = &self.journal {
            if let Err(e) = journal.append(kind, details) {
                tracing::warn!("Could not write transaction journal: {}", e);
            }
        }
    }
}

impl std::fmt::Display for Library {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Library: {} ({} items, {} users)",
            self.name,
            self.repository.items.len(),
            self.repository.users.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{item::CreateItem, user::CreateUser};

    fn library() -> Library {
        let mut library = Library::new("Test Library", LoansConfig::default());
        library
            .add_item(CreateItem::book("Python Guide", "John Doe", 2023).with_id(101))
            .unwrap();
        library
            .add_user(CreateUser::new(1001, "Alice", "alice@email.com"))
            .unwrap();
        library
    }

    #[test]
    fn test_snapshot_restores_equal_library() {
        let mut original = library();
        original.borrow_item(1001, 101).unwrap();
        let restored = Library::from_snapshot(original.snapshot(), LoansConfig::default()).unwrap();
        assert_eq!(restored.snapshot(), original.snapshot());
        assert_eq!(restored.to_string(), "Library: Test Library (1 items, 1 users)");
    }

    #[test]
    fn test_snapshot_rejects_inconsistent_borrow() {
        let mut snapshot = library().snapshot();
        snapshot.users[0].borrowed.push(101);
        let err = Library::from_snapshot(snapshot, LoansConfig::default()).unwrap_err();
        assert!(matches!(err, AppError::Parse(_)));
    }

    #[test]
    fn test_snapshot_rejects_unknown_reservation() {
        let mut snapshot = library().snapshot();
        snapshot.users[0].reservations = vec![101];
        assert!(Library::from_snapshot(snapshot.clone(), LoansConfig::default()).is_ok());

        snapshot.users[0].reservations = vec![101, 101];
        assert!(matches!(
            Library::from_snapshot(snapshot.clone(), LoansConfig::default()),
            Err(AppError::Parse(_))
        ));

        snapshot.users[0].reservations = vec![404];
        assert!(matches!(
            Library::from_snapshot(snapshot, LoansConfig::default()),
            Err(AppError::Parse(_))
        ));
    }

    #[test]
    fn test_snapshot_rejects_duplicate_ids() {
        let mut snapshot = library().snapshot();
        let copy = snapshot.items[0].clone();
        snapshot.items.push(copy);
        assert!(matches!(
            Library::from_snapshot(snapshot, LoansConfig::default()),
            Err(AppError::Parse(_))
        ));
    }
}
