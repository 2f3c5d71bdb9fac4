//! Repository layer: in-memory, insertion-ordered storage

pub mod items;
pub mod users;

/// Main repository struct holding the item and user collections
#[derive(Debug, Clone, Default)]
pub struct Repository {
    pub items: items::ItemsRepository,
    pub users: users::UsersRepository,
}

impl Repository {
    pub fn new() -> Self {
        Self::default()
    }
}
