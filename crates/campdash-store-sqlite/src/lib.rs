//! SQLite backend for the campaign dashboard cache.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Every multi-row write happens inside a
//! single SQLite transaction, so readers never see a campaign without its
//! stat row.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
