//! The `ContactStore` trait.
//!
//! Implemented by storage backends (e.g. `roster-store-sqlite`). The query
//! coordinator and the CLI depend on this abstraction, not on a concrete
//! backend.

use std::future::Future;

use tokio::sync::watch;

use crate::{
  contact::{Contact, ContactId},
  query::QueryKind,
};

/// Abstraction over a Roster record store.
///
/// All methods return `Send` futures so the trait can be driven from spawned
/// tokio tasks.
pub trait ContactStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Writes ────────────────────────────────────────────────────────────

  /// Insert `contact` if its id is unassigned, otherwise insert or replace
  /// the row with that id. Returns the contact as stored, with its id.
  fn upsert(
    &self,
    contact: Contact,
  ) -> impl Future<Output = Result<Contact, Self::Error>> + Send + '_;

  /// Remove the row whose id matches `contact.id`. Returns `false` when no
  /// such row existed; that is not an error.
  fn delete<'a>(
    &'a self,
    contact: &'a Contact,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  // ── Reads ─────────────────────────────────────────────────────────────

  /// Fetch one contact by id.
  fn get(
    &self,
    id: ContactId,
  ) -> impl Future<Output = Result<Option<Contact>, Self::Error>> + Send + '_;

  /// Number of stored contacts.
  fn count(&self) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  /// A snapshot of one of the four queries. Never fails on an empty result.
  fn query<'a>(
    &'a self,
    kind: &'a QueryKind,
  ) -> impl Future<Output = Result<Vec<Contact>, Self::Error>> + Send + 'a;

  // ── Change feed ───────────────────────────────────────────────────────

  /// A counter bumped after every committed write. Live queries re-run
  /// whenever it changes.
  fn changes(&self) -> watch::Receiver<u64>;
}
