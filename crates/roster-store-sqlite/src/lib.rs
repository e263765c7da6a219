//! SQLite backend for the Roster record store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. That single connection thread also
//! serialises every write, which is what the live queries rely on for
//! consistent snapshots.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use schema::{SCHEMA_VERSION, SchemaMismatch};
pub use store::SqliteStore;
