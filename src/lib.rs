//! Library Tracker
//!
//! An in-memory library catalog: items and users with borrow/return state,
//! configurable loan limits and late fees, and persistence to plain text,
//! CSV and JSON files.

pub mod config;
pub mod error;
pub mod models;
pub mod persistence;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use persistence::Format;
pub use services::Library;
