//! Core types and trait definitions for the Roster contacts manager.
//!
//! This crate knows nothing about SQLite or any front end. The store backend,
//! the query coordinator and the CLI all depend on it.

// Native `async fn` in traits; the `Send` bounds are spelled out on the trait.
#![allow(async_fn_in_trait)]

pub mod contact;
pub mod error;
pub mod query;
pub mod store;

pub use contact::{Contact, ContactId};
pub use error::{Error, Result};
pub use query::{QueryKind, SortOrder};
