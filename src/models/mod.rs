//! Data models for Library Tracker

pub mod enums;
pub mod item;
pub mod user;

// Re-export commonly used types
pub use enums::{FileFormat, Genre, Membership};
pub use item::{CreateItem, Item, ItemKind};
pub use user::{CreateUser, UpdateUser, User};
