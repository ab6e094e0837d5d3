//! SQLite host: schema-backed implementation of the platform traits.
//!
//! This module is split into three submodules:
//! - `model`: row structs returned by queries and their mapping to domain types.
//! - `repo`: SQL-only functions over a `SqliteConnection`.
//! - `host`: [`SqliteHost`] and [`SqliteTx`], which implement
//!   [`crate::platform`] on top of `repo`.

pub mod host;
pub mod model;
pub mod repo;

pub use host::{SqliteHost, SqliteTx};
pub use repo::*;
