//! User model and related types

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::enums::Membership;
use crate::error::{AppError, AppResult};

/// Library patron
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: u32,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub membership: Membership,
    #[serde(default)]
    pub fine: Decimal,
    /// Identifiers of items currently held, in borrow order
    #[serde(default)]
    pub borrowed: Vec<u32>,
    /// Priority reservations of premium members, in request order
    #[serde(default)]
    pub reservations: Vec<u32>,
}

impl User {
    pub fn new(create: CreateUser) -> Self {
        Self {
            id: create.id,
            name: create.name,
            email: create.email,
            membership: create.membership,
            fine: Decimal::ZERO,
            borrowed: Vec::new(),
            reservations: Vec::new(),
        }
    }

    pub fn holds(&self, item_id: u32) -> bool {
        self.borrowed.contains(&item_id)
    }

    /// Record a borrowed item, refusing duplicates and anything past `max_items`
    pub fn borrow(&mut self, item_id: u32, max_items: usize) -> AppResult<()> {
        if self.holds(item_id) {
            return Err(AppError::InvalidState(format!(
                "User {} already holds item {}",
                self.id, item_id
            )));
        }
        if self.borrowed.len() >= max_items {
            return Err(AppError::LimitReached(format!(
                "User {} already holds {} of {} items",
                self.id,
                self.borrowed.len(),
                max_items
            )));
        }
        self.borrowed.push(item_id);
        self.reservations.retain(|id| *id != item_id);
        Ok(())
    }

    pub fn has_reserved(&self, item_id: u32) -> bool {
        self.reservations.contains(&item_id)
    }

    /// Queue a priority reservation. Only premium members may reserve.
    pub fn reserve(&mut self, item_id: u32) -> AppResult<()> {
        if !self.membership.is_premium() {
            return Err(AppError::InvalidState(format!(
                "User {} has no premium membership to reserve items",
                self.id
            )));
        }
        if self.holds(item_id) {
            return Err(AppError::InvalidState(format!(
                "User {} already holds item {}",
                self.id, item_id
            )));
        }
        if self.has_reserved(item_id) {
            return Err(AppError::Conflict(format!(
                "User {} has already reserved item {}",
                self.id, item_id
            )));
        }
        self.reservations.push(item_id);
        Ok(())
    }

    /// Drop a reservation, returning whether there was one
    pub fn cancel_reservation(&mut self, item_id: u32) -> bool {
        let before = self.reservations.len();
        self.reservations.retain(|id| *id != item_id);
        self.reservations.len() != before
    }

    pub fn update(&mut self, update: UpdateUser) -> AppResult<()> {
        let update = update.validated()?;
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(email) = update.email {
            self.email = email;
        }
        Ok(())
    }

    pub fn return_item(&mut self, item_id: u32) -> AppResult<()> {
        let position = self
            .borrowed
            .iter()
            .position(|id| *id == item_id)
            .ok_or_else(|| {
                AppError::InvalidState(format!("User {} does not hold item {}", self.id, item_id))
            })?;
        self.borrowed.remove(position);
        Ok(())
    }

    pub fn add_fine(&mut self, amount: Decimal) {
        if amount > Decimal::ZERO {
            self.fine += amount;
        }
    }

    pub fn pay_fine(&mut self, amount: Decimal) -> AppResult<Decimal> {
        if amount <= Decimal::ZERO || amount > self.fine {
            return Err(AppError::Validation(format!(
                "Payment of ${:.2} is invalid for an outstanding fine of ${:.2}",
                amount, self.fine
            )));
        }
        self.fine -= amount;
        Ok(self.fine)
    }

    pub fn upgrade(&mut self) -> bool {
        let upgraded = self.membership.upgraded();
        let changed = upgraded != self.membership;
        self.membership = upgraded;
        changed
    }

    pub fn describe(&self) -> String {
        let basic = format!(
            "User #{}: {} ({}) - Books: {}, Fine: ${:.2}",
            self.id,
            self.name,
            self.email,
            self.borrowed.len(),
            self.fine
        );
        match self.membership {
            Membership::Standard => basic,
            level => format!("{} | Premium: {}", basic, level),
        }
    }
}

impl std::fmt::Display for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (ID: {})", self.name, self.id)
    }
}

/// Create user request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateUser {
    pub id: u32,
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[serde(default)]
    pub membership: Membership,
}

impl CreateUser {
    pub fn new(id: u32, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            email: email.into(),
            membership: Membership::Standard,
        }
    }

    pub fn premium(mut self, membership: Membership) -> Self {
        self.membership = membership;
        self
    }

    pub fn validated(mut self) -> AppResult<Self> {
        self.name = self.name.trim().to_string();
        self.email = self.email.trim().to_string();
        self.validate()?;
        Ok(self)
    }
}

/// Update user request
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateUser {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
}

impl UpdateUser {
    pub fn email(email: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
            ..Self::default()
        }
    }

    pub fn validated(mut self) -> AppResult<Self> {
        self.name = self.name.map(|name| name.trim().to_string());
        self.email = self.email.map(|email| email.trim().to_string());
        self.validate()?;
        Ok(self)
    }
}
