//! SQLite backend for the opptrack opportunity store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated
//! thread without blocking the async runtime. Every multi-statement
//! operation (create, update, delete) executes inside one immediate
//! transaction, which is what makes the revision protocol atomic.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
