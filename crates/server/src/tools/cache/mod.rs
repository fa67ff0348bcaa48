//! Cache inspection tools.
//!
//! These read and trim the versioned stores directly, bypassing routing.

pub mod get;
pub mod purge;

pub use get::{CacheGetParams, get_impl};
pub use purge::{CachePurgeParams, purge_impl};
