#![forbid(unsafe_code)]

//! Core domain model and business logic for the exercise tracker.
//!
//! This crate provides:
//! - Domain types (users, exercise entries, log views)
//! - Canonical date parsing and rendering
//! - The storage contract and its memory and journal stores
//! - The user directory and the exercise log service

pub mod types;
pub mod error;
pub mod date;
pub mod config;
pub mod logging;
pub mod store;
pub mod journal;
pub mod directory;
pub mod exercise_log;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use date::{format_canonical, parse_date, render_stored, INVALID_DATE};
pub use config::{Config, StorageBackend};
pub use store::{MemoryStore, UserStore};
pub use journal::JournalStore;
pub use directory::UserDirectory;
pub use exercise_log::ExerciseLog;
