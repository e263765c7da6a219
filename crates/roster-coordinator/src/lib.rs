//! Session layer for Roster: live query subscriptions, the edit draft, and
//! the [`Coordinator`] that folds both into a single observable
//! [`ScreenState`].
//!
//! Generic over any [`roster_core::store::ContactStore`].

pub mod coordinator;
pub mod error;
pub mod live;
pub mod state;

pub use coordinator::Coordinator;
pub use error::{Error, Result};
pub use live::{Subscription, subscribe};
pub use state::{Draft, DraftEdit, ScreenState};

#[cfg(test)]
mod tests;
