//! Items repository

use indexmap::IndexMap;

use crate::{
    error::{AppError, AppResult},
    models::item::Item,
};

#[derive(Debug, Clone, Default)]
pub struct ItemsRepository {
    items: IndexMap<u32, Item>,
}

impl ItemsRepository {
    pub fn get(&self, id: u32) -> AppResult<&Item> {
        self.items.get(&id).ok_or(AppError::ItemNotFound(id))
    }

    pub fn get_mut(&mut self, id: u32) -> AppResult<&mut Item> {
        self.items.get_mut(&id).ok_or(AppError::ItemNotFound(id))
    }

    pub fn contains(&self, id: u32) -> bool {
        self.items.contains_key(&id)
    }

    /// Insert a new item; identifiers must be unique
    pub fn insert(&mut self, item: Item) -> AppResult<()> {
        if self.items.contains_key(&item.id) {
            return Err(AppError::Conflict(format!(
                "Item with id {} already exists",
                item.id
            )));
        }
        self.items.insert(item.id, item);
        Ok(())
    }

    /// Remove an item, keeping the order of the remaining ones
    pub fn remove(&mut self, id: u32) -> AppResult<Item> {
        self.items
            .shift_remove(&id)
            .ok_or(AppError::ItemNotFound(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Item> {
        self.items.values()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Next identifier after the highest one in use
    pub fn next_id(&self) -> AppResult<u32> {
        match self.items.keys().max() {
            None => Ok(1),
            Some(max) => max.checked_add(1).ok_or_else(|| {
                AppError::Conflict(format!(
                    "No item identifier left after {}; pass an explicit id",
                    max
                ))
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::item::CreateItem;

    #[test]
    fn test_insert_get_remove() {
        let mut repo = ItemsRepository::default();
        assert_eq!(repo.next_id().unwrap(), 1);
        repo.insert(Item::new(101, CreateItem::book("A", "B", 2000))).unwrap();
        repo.insert(Item::new(103, CreateItem::book("C", "D", 2001))).unwrap();
        assert_eq!(repo.next_id().unwrap(), 104);
        assert!(matches!(
            repo.insert(Item::new(101, CreateItem::book("X", "Y", 2002))),
            Err(AppError::Conflict(_))
        ));
        assert_eq!(repo.get(101).unwrap().title, "A");
        repo.remove(101).unwrap();
        assert!(repo.get(101).unwrap_err().is_not_found());
        assert_eq!(repo.len(), 1);
    }

    #[test]
    fn test_next_id_exhausted() {
        let mut repo = ItemsRepository::default();
        repo.insert(Item::new(u32::MAX, CreateItem::book("Last", "B", 2000)))
            .unwrap();
        assert!(matches!(repo.next_id(), Err(AppError::Conflict(_))));
    }
}
