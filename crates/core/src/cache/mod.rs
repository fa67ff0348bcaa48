//! SQLite-backed versioned cache stores and background replay queue.
//!
//! This module provides persistent storage using SQLite with async access
//! via tokio-rusqlite. It supports:
//!
//! - Named cache stores keyed by request descriptor (method + URL)
//! - Whole-store deletion when a deployment version is retired
//! - A pending task queue for background sync replay
//! - Automatic schema migrations and WAL mode for concurrent access

pub mod connection;
pub mod entries;
pub mod hash;
pub mod migrations;
pub mod tasks;

pub use crate::Error;

pub use connection::CacheDb;
pub use entries::CachedEntry;
pub use tasks::{PendingTask, TaskKind};
