//! Loan management: borrowing and returning items

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::Library;
use crate::error::{AppError, AppResult};

/// Outcome of a return
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnReceipt {
    pub user_id: u32,
    pub item_id: u32,
    pub days_borrowed: i64,
    pub days_late: i64,
    pub late_fee: Decimal,
}

impl Library {
    /// Lend an item to a user
    pub fn borrow_item(&mut self, user_id: u32, item_id: u32) -> AppResult<()> {
        self.borrow_item_at(user_id, item_id, Utc::now())
    }

    /// Lend an item to a user at the given time.
    ///
    /// Every check runs before anything is modified, so a failed borrow leaves
    /// both the item and the user untouched.
    pub fn borrow_item_at(&mut self, user_id: u32, item_id: u32, at: DateTime<Utc>) -> AppResult<()> {
        let user = self.repository.users.get(user_id)?;
        let item = self.repository.items.get(item_id)?;
        if !item.available {
            return Err(AppError::Unavailable(item_id));
        }

        let limits = self.loans.limits_for(user.membership);
        if !limits.allows_fine(user.fine) {
            return Err(AppError::InvalidState(format!(
                "User {} has an outstanding fine of ${:.2}",
                user_id, user.fine
            )));
        }
        let max_items = limits.max_items;

        self.repository.users.get_mut(user_id)?.borrow(item_id, max_items)?;
        self.repository.items.get_mut(item_id)?.mark_borrowed(user_id, at)?;

        tracing::info!("User {} borrowed item {}", user_id, item_id);
        self.record("BORROW", &format!("user {} borrowed item {}", user_id, item_id));
        Ok(())
    }

    /// Take an item back from a user
    pub fn return_item(&mut self, user_id: u32, item_id: u32) -> AppResult<ReturnReceipt> {
        self.return_item_at(user_id, item_id, Utc::now())
    }

    /// Take an item back from a user at the given time, charging a late fee
    /// when the item was kept beyond the user's borrow period
    pub fn return_item_at(
        &mut self,
        user_id: u32,
        item_id: u32,
        at: DateTime<Utc>,
    ) -> AppResult<ReturnReceipt> {
        let user = self.repository.users.get(user_id)?;
        let item = self.repository.items.get(item_id)?;
        if !user.holds(item_id) || item.borrowed_by != Some(user_id) {
            return Err(AppError::InvalidState(format!(
                "User {} has not borrowed item {}",
                user_id, item_id
            )));
        }
        let period = self.loans.borrow_period_for(user.membership);

        let item = self.repository.items.get_mut(item_id)?;
        let borrowed_at = item.mark_returned()?;
        let days_borrowed = borrowed_at.map_or(0, |since| (at - since).num_days().max(0));
        let days_late = (days_borrowed - period).max(0);
        let late_fee = item.late_fee(days_late, &self.loans);

        let user = self.repository.users.get_mut(user_id)?;
        user.return_item(item_id)?;
        user.add_fine(late_fee);

        if late_fee > Decimal::ZERO {
            tracing::info!(
                "User {} returned item {} {} day(s) late, fee ${:.2}",
                user_id,
                item_id,
                days_late,
                late_fee
            );
        } else {
            tracing::info!("User {} returned item {} on time", user_id, item_id);
        }
        self.record(
            "RETURN",
            &format!(
                "user {} returned item {} (late fee ${:.2})",
                user_id, item_id, late_fee
            ),
        );

        Ok(ReturnReceipt {
            user_id,
            item_id,
            days_borrowed,
            days_late,
            late_fee,
        })
    }
}
