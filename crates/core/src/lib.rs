//! Core types and shared functionality for the folio offline router.
//!
//! This crate provides:
//! - Versioned cache stores and the background replay queue, backed by SQLite
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;

pub use cache::{CacheDb, CachedEntry, PendingTask, TaskKind};
pub use config::{AppConfig, ConfigError, RouteMatcher, RouteSpec, Strategy};
pub use error::Error;
