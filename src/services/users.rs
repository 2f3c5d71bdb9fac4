//! User management service

use rust_decimal::Decimal;

use super::Library;
use crate::{
    error::{AppError, AppResult},
    models::{
        enums::Membership,
        item::Item,
        user::{CreateUser, UpdateUser, User},
    },
};

impl Library {
    /// Register a new user
    pub fn add_user(&mut self, create: CreateUser) -> AppResult<u32> {
        let user = User::new(create.validated()?);
        let id = user.id;
        let description = user.describe();
        self.repository.users.insert(user)?;

        tracing::info!("Registered user {}", id);
        self.record("ADD_USER", &description);
        Ok(id)
    }

    /// Remove a user. Users still holding items cannot be removed.
    pub fn remove_user(&mut self, id: u32) -> AppResult<User> {
        let user = self.repository.users.get(id)?;
        if !user.borrowed.is_empty() {
            return Err(AppError::InvalidState(format!(
                "User {} still holds {} item(s)",
                id,
                user.borrowed.len()
            )));
        }
        let user = self.repository.users.remove(id)?;

        tracing::info!("Removed user {}", id);
        self.record("REMOVE_USER", &format!("user {} {}", id, user.name));
        Ok(user)
    }

    pub fn get_user(&self, id: u32) -> AppResult<&User> {
        self.repository.users.get(id)
    }

    /// Items currently held by a user
    pub fn borrowed_items(&self, user_id: u32) -> AppResult<Vec<&Item>> {
        let user = self.repository.users.get(user_id)?;
        user.borrowed
            .iter()
            .map(|&item_id| self.repository.items.get(item_id))
            .collect()
    }

    /// Pay part or all of a user's fine, returning the remaining balance
    pub fn pay_fine(&mut self, user_id: u32, amount: Decimal) -> AppResult<Decimal> {
        let remaining = self.repository.users.get_mut(user_id)?.pay_fine(amount)?;
        tracing::info!("User {} paid ${:.2}, ${:.2} remaining", user_id, amount, remaining);
        self.record("PAYMENT", &format!("user {} paid ${:.2}", user_id, amount));
        Ok(remaining)
    }

    /// Move a premium user to the next membership level
    pub fn upgrade_user(&mut self, user_id: u32) -> AppResult<Membership> {
        let user = self.repository.users.get_mut(user_id)?;
        if !user.membership.is_premium() {
            return Err(AppError::InvalidState(format!(
                "User {} has no premium membership to upgrade",
                user_id
            )));
        }
        let changed = user.upgrade();
        let membership = user.membership;
        if changed {
            tracing::info!("User {} upgraded to {}", user_id, membership);
            self.record("UPGRADE", &format!("user {} is now {}", user_id, membership));
        }
        Ok(membership)
    }

    /// Change a user's name or email
    pub fn update_user(&mut self, user_id: u32, update: UpdateUser) -> AppResult<()> {
        self.repository.users.get_mut(user_id)?.update(update)?;
        tracing::info!("Updated user {}", user_id);
        self.record("UPDATE_USER", &format!("user {} updated", user_id));
        Ok(())
    }

    pub fn update_email(&mut self, user_id: u32, email: &str) -> AppResult<()> {
        self.update_user(user_id, UpdateUser::email(email))
    }

    /// Queue a priority reservation for a premium member
    pub fn reserve_item(&mut self, user_id: u32, item_id: u32) -> AppResult<()> {
        self.repository.users.get(user_id)?;
        self.repository.items.get(item_id)?;
        self.repository.users.get_mut(user_id)?.reserve(item_id)?;

        tracing::info!("User {} reserved item {}", user_id, item_id);
        self.record("RESERVE", &format!("user {} reserved item {}", user_id, item_id));
        Ok(())
    }

    pub fn cancel_reservation(&mut self, user_id: u32, item_id: u32) -> AppResult<()> {
        if !self.repository.users.get_mut(user_id)?.cancel_reservation(item_id) {
            return Err(AppError::NotFound(format!(
                "User {} has no reservation for item {}",
                user_id, item_id
            )));
        }
        tracing::info!("User {} cancelled reservation of item {}", user_id, item_id);
        Ok(())
    }

    /// Users with a reservation for an item, in registration order
    pub fn reservations_for(&self, item_id: u32) -> Vec<&User> {
        self.repository
            .users
            .iter()
            .filter(|user| user.has_reserved(item_id))
            .collect()
    }
}
