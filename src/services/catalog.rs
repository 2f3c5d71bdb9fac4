//! Catalog management: adding, removing, searching and summarizing items

use indexmap::IndexMap;
use serde::Deserialize;
use unicode_normalization::UnicodeNormalization;

use super::Library;
use crate::{
    error::{AppError, AppResult},
    models::{
        enums::Genre,
        item::{CreateItem, Item},
    },
};

/// Item search filters. Text filters are case-insensitive substring matches.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemQuery {
    pub title: Option<String>,
    pub creator: Option<String>,
    pub genre: Option<Genre>,
    pub available: Option<bool>,
}

impl ItemQuery {
    pub fn title(text: impl Into<String>) -> Self {
        Self {
            title: Some(text.into()),
            ..Self::default()
        }
    }

    fn matches(&self, item: &Item) -> bool {
        let text_matches = |needle: &Option<String>, haystack: &str| {
            needle
                .as_deref()
                .map_or(true, |needle| fold(haystack).contains(&fold(needle)))
        };
        text_matches(&self.title, &item.title)
            && text_matches(&self.creator, &item.creator)
            && self.genre.map_or(true, |genre| item.genre == genre)
            && self.available.map_or(true, |available| item.available == available)
    }
}

/// Catalog-wide counters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CatalogStats {
    pub total: usize,
    pub borrowed: usize,
    pub available: usize,
    /// Share of borrowed items, in percent
    pub borrow_rate: f64,
}

/// Case folding for search
fn fold(text: &str) -> String {
    text.nfkc().collect::<String>().to_lowercase()
}

impl Library {
    /// Add an item to the catalog, returning its identifier
    pub fn add_item(&mut self, create: CreateItem) -> AppResult<u32> {
        let create = create.validated()?;
        let id = match create.id {
            Some(id) => id,
            None => self.repository.items.next_id()?,
        };
        let item = Item::new(id, create);
        let description = item.describe();
        self.repository.items.insert(item)?;

        tracing::info!("Added item {}", id);
        self.record("ADD_ITEM", &description);
        Ok(id)
    }

    /// Remove an item. Borrowed items cannot be removed.
    pub fn remove_item(&mut self, id: u32) -> AppResult<Item> {
        let item = self.repository.items.get(id)?;
        if !item.available {
            return Err(AppError::InvalidState(format!(
                "Item {} is currently borrowed and cannot be removed",
                id
            )));
        }
        let item = self.repository.items.remove(id)?;
        for user in self.repository.users.iter_mut() {
            user.cancel_reservation(id);
        }

        tracing::info!("Removed item {}", id);
        self.record("REMOVE_ITEM", &format!("item {} '{}'", id, item.title));
        Ok(item)
    }

    pub fn get_item(&self, id: u32) -> AppResult<&Item> {
        self.repository.items.get(id)
    }

    /// Linear scan over the catalog with the given filters
    pub fn find_items(&self, query: &ItemQuery) -> Vec<&Item> {
        self.repository
            .items
            .iter()
            .filter(|item| query.matches(item))
            .collect()
    }

    /// Items whose title contains `text`, ignoring case
    pub fn search_title(&self, text: &str) -> Vec<&Item> {
        self.find_items(&ItemQuery::title(text))
    }

    /// Register a download of an electronic item
    pub fn download_item(&mut self, id: u32) -> AppResult<u32> {
        let count = self.repository.items.get_mut(id)?.download()?;
        tracing::debug!("Item {} downloaded ({} total)", id, count);
        Ok(count)
    }

    pub fn next_item_id(&self) -> AppResult<u32> {
        self.repository.items.next_id()
    }

    pub fn sorted_by_title(&self) -> Vec<&Item> {
        let mut items: Vec<&Item> = self.repository.items.iter().collect();
        items.sort_by_cached_key(|item| fold(&item.title));
        items
    }

    pub fn sorted_by_year(&self, newest_first: bool) -> Vec<&Item> {
        let mut items: Vec<&Item> = self.repository.items.iter().collect();
        items.sort_by_key(|item| item.year);
        if newest_first {
            items.reverse();
        }
        items
    }

    /// Items grouped by genre, genres in order of first appearance
    pub fn group_by_genre(&self) -> IndexMap<Genre, Vec<&Item>> {
        self.repository
            .items
            .iter()
            .fold(IndexMap::new(), |mut groups, item| {
                groups.entry(item.genre).or_insert_with(Vec::new).push(item);
                groups
            })
    }

    pub fn stats(&self) -> CatalogStats {
        let total = self.repository.items.len();
        let borrowed = self
            .repository
            .items
            .iter()
            .filter(|item| !item.available)
            .count();
        let borrow_rate = if total == 0 {
            0.0
        } else {
            borrowed as f64 / total as f64 * 100.0
        };
        CatalogStats {
            total,
            borrowed,
            available: total - borrowed,
            borrow_rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::LoansConfig,
        models::{enums::FileFormat, user::CreateUser},
    };

    fn library() -> Library {
        let mut library = Library::new("Test", LoansConfig::default());
        for create in [
            CreateItem::book("Python Guide", "John Doe", 2023)
                .with_id(101)
                .with_genre(Genre::Programming),
            CreateItem::book("Advanced PYTHON", "Jane Roe", 2019)
                .with_id(102)
                .with_genre(Genre::Programming),
            CreateItem::book("World History", "Ann Lee", 2001)
                .with_id(103)
                .with_genre(Genre::History),
            CreateItem::ebook("Web Development", "Jane Smith", 2024, 5.2, FileFormat::Pdf).with_id(104),
        ] {
            library.add_item(create).unwrap();
        }
        library
    }

    #[test]
    fn test_search_title_is_case_insensitive() {
        let library = library();
        let ids: Vec<u32> = library.search_title("python").iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![101, 102]);
        assert!(library.search_title("rust").is_empty());
    }

    #[test]
    fn test_search_folds_compatibility_forms() {
        let mut library = library();
        library
            .add_item(CreateItem::book("Ｐｙｔｈｏｎ Ｔｒｉｃｋｓ", "K. Sato", 2020).with_id(105))
            .unwrap();
        assert_eq!(library.search_title("python").len(), 3);
    }

    #[test]
    fn test_find_items_combined_filters() {
        let library = library();
        let query = ItemQuery {
            creator: Some("jane".to_string()),
            genre: Some(Genre::Programming),
            ..ItemQuery::default()
        };
        let found = library.find_items(&query);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, 102);
    }

    #[test]
    fn test_add_item_assigns_next_id() {
        let mut library = library();
        let id = library
            .add_item(CreateItem::book("Data Science", "Sam", 2022))
            .unwrap();
        assert_eq!(id, 105);
        assert!(matches!(
            library.add_item(CreateItem::book("Dup", "Sam", 2022).with_id(101)),
            Err(AppError::Conflict(_))
        ));
    }

    #[test]
    fn test_add_item_without_free_id_fails() {
        let mut library = library();
        library
            .add_item(CreateItem::book("Last Volume", "Sam", 2022).with_id(u32::MAX))
            .unwrap();
        let before = library.snapshot();
        assert!(matches!(
            library.add_item(CreateItem::book("Overflow", "Sam", 2022)),
            Err(AppError::Conflict(_))
        ));
        assert!(library.next_item_id().is_err());
        assert_eq!(library.snapshot(), before);
    }

    #[test]
    fn test_remove_borrowed_item_fails() {
        let mut library = library();
        library
            .add_user(CreateUser::new(1001, "Alice", "alice@email.com"))
            .unwrap();
        library.borrow_item(1001, 101).unwrap();
        let before = library.snapshot();

        assert!(library.remove_item(101).unwrap_err().is_invalid_state());
        assert_eq!(library.snapshot(), before);

        library.return_item(1001, 101).unwrap();
        assert_eq!(library.remove_item(101).unwrap().id, 101);
        assert!(library.get_item(101).unwrap_err().is_not_found());
    }

    #[test]
    fn test_sorting_and_grouping() {
        let library = library();
        let titles: Vec<&str> = library
            .sorted_by_title()
            .iter()
            .map(|i| i.title.as_str())
            .collect();
        assert_eq!(
            titles,
            vec!["Advanced PYTHON", "Python Guide", "Web Development", "World History"]
        );
        assert_eq!(library.sorted_by_year(true)[0].id, 104);

        let groups = library.group_by_genre();
        assert_eq!(groups[&Genre::Programming].len(), 2);
        assert_eq!(groups.keys().copied().collect::<Vec<_>>(), vec![
            Genre::Programming,
            Genre::History,
            Genre::General
        ]);
    }

    #[test]
    fn test_stats() {
        let mut library = library();
        library
            .add_user(CreateUser::new(1001, "Alice", "alice@email.com"))
            .unwrap();
        library.borrow_item(1001, 103).unwrap();
        let stats = library.stats();
        assert_eq!(stats.total, 4);
        assert_eq!(stats.borrowed, 1);
        assert_eq!(stats.available, 3);
        assert!((stats.borrow_rate - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_download_item() {
        let mut library = library();
        assert_eq!(library.download_item(104).unwrap(), 1);
        assert!(library.download_item(101).unwrap_err().is_invalid_state());
        assert!(library.download_item(999).unwrap_err().is_not_found());
    }
}
