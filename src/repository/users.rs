//! Users repository

use indexmap::IndexMap;

use crate::{
    error::{AppError, AppResult},
    models::user::User,
};

#[derive(Debug, Clone, Default)]
pub struct UsersRepository {
    users: IndexMap<u32, User>,
}

impl UsersRepository {
    pub fn get(&self, id: u32) -> AppResult<&User> {
        self.users.get(&id).ok_or(AppError::UserNotFound(id))
    }

    pub fn get_mut(&mut self, id: u32) -> AppResult<&mut User> {
        self.users.get_mut(&id).ok_or(AppError::UserNotFound(id))
    }

    pub fn insert(&mut self, user: User) -> AppResult<()> {
        if self.users.contains_key(&user.id) {
            return Err(AppError::Conflict(format!(
                "User with id {} already exists",
                user.id
            )));
        }
        self.users.insert(user.id, user);
        Ok(())
    }

    pub fn remove(&mut self, id: u32) -> AppResult<User> {
        self.users
            .shift_remove(&id)
            .ok_or(AppError::UserNotFound(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &User> {
        self.users.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut User> {
        self.users.values_mut()
    }

    /// The user currently holding an item, if any
    pub fn holder_of(&self, item_id: u32) -> Option<&User> {
        self.users.values().find(|u| u.holds(item_id))
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}
