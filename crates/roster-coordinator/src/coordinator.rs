//! [`Coordinator`]: the view model between a store and a front end.
//!
//! It owns the session's sort mode and search text, keeps exactly one live
//! query subscribed, and publishes a [`ScreenState`] through a `watch`
//! channel. Front ends read that channel and call the intent methods.
//!
//! Switching queries bumps a generation counter while holding the state
//! lock. A forwarder only publishes under that same lock and only if its
//! generation is still current, so once the replacement subscription has
//! published, nothing from the old one can follow.

use std::{
  mem,
  sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
  },
};

use chrono::Utc;
use roster_core::{Contact, QueryKind, SortOrder, store::ContactStore};
use tokio::{sync::watch, task::JoinHandle};
use tracing::{debug, error};

use crate::{
  Error, Result, live,
  state::{Draft, DraftEdit, ScreenState},
};

// ─── Shared state ────────────────────────────────────────────────────────────

struct Shared {
  generation: AtomicU64,
  state:      watch::Sender<ScreenState>,
}

impl Shared {
  /// Replace the whole state with `f(previous)`.
  fn replace(&self, f: impl FnOnce(ScreenState) -> ScreenState) {
    self.state.send_modify(|state| *state = f(mem::take(state)));
  }

  /// Fold one live-query emission into the state. Returns `false` when the
  /// emitting subscription has been superseded.
  fn publish<E: std::fmt::Display>(
    &self,
    generation: u64,
    kind: &QueryKind,
    emission: Result<Vec<Contact>, E>,
  ) -> bool {
    let mut current = true;
    self.state.send_if_modified(|state| {
      if self.generation.load(Ordering::SeqCst) != generation {
        current = false;
        return false;
      }
      let previous = mem::take(state);
      let source = Some(kind.clone());
      *state = match emission {
        Ok(contacts) => ScreenState { contacts, error: None, source, ..previous },
        Err(err) => {
          error!(%err, generation, ?kind, "live query failed");
          ScreenState { error: Some(err.to_string()), source, ..previous }
        }
      };
      true
    });
    current
  }
}

// ─── Coordinator ─────────────────────────────────────────────────────────────

/// Session view model over a [`ContactStore`].
///
/// Must be created inside a tokio runtime; it spawns the forwarding task for
/// the initial query immediately.
pub struct Coordinator<S: ContactStore> {
  store:     S,
  shared:    Arc<Shared>,
  forwarder: Option<JoinHandle<()>>,
}

impl<S> Coordinator<S>
where
  S: ContactStore + Clone + 'static,
{
  /// Start a session sorted by `sort` with an empty search.
  pub fn new(store: S, sort: SortOrder) -> Self {
    let (state, _) = watch::channel(ScreenState { sort, ..ScreenState::default() });
    let mut coordinator = Self {
      store,
      shared: Arc::new(Shared { generation: AtomicU64::new(0), state }),
      forwarder: None,
    };
    coordinator.resubscribe(|state| state);
    coordinator
  }

  /// A receiver that sees every published [`ScreenState`].
  pub fn state(&self) -> watch::Receiver<ScreenState> { self.shared.state.subscribe() }

  /// The current [`ScreenState`].
  pub fn snapshot(&self) -> ScreenState { self.shared.state.borrow().clone() }

  // ── Query switching ───────────────────────────────────────────────────────

  /// Flip between name-ascending and date-descending order.
  pub fn change_sorting(&mut self) {
    self.resubscribe(|state| ScreenState { sort: state.sort.toggled(), ..state });
  }

  /// Replace the search text. An empty string shows every contact.
  pub fn on_search_query_change(&mut self, text: impl Into<String>) {
    let search_query = text.into();
    self.resubscribe(move |state| ScreenState { search_query, ..state });
  }

  /// Apply `change`, retire the active subscription and start the one the
  /// new sort/search selects.
  fn resubscribe(&mut self, change: impl FnOnce(ScreenState) -> ScreenState) {
    let mut generation = 0;
    let mut kind = QueryKind::ByName;

    self.shared.replace(|state| {
      let next = change(state);
      generation = self.shared.generation.fetch_add(1, Ordering::SeqCst) + 1;
      kind = QueryKind::select(next.sort, &next.search_query);
      next
    });

    if let Some(previous) = self.forwarder.take() {
      previous.abort();
    }

    debug!(generation, ?kind, "switching live query");
    let shared = Arc::clone(&self.shared);
    let mut subscription = live::subscribe(self.store.clone(), kind.clone());
    self.forwarder = Some(tokio::spawn(async move {
      while let Some(emission) = subscription.next().await {
        if !shared.publish(generation, &kind, emission) {
          break;
        }
      }
    }));
  }

  // ── Draft intents ─────────────────────────────────────────────────────────

  /// Load `contact` into the draft for editing or deletion.
  pub fn open_for_edit(&self, contact: &Contact) {
    debug!(id = contact.id, "opening contact for edit");
    let draft = Draft::from_contact(contact);
    self.shared.replace(|state| ScreenState { draft, ..state });
  }

  /// Clear the draft before adding a new contact.
  pub fn start_new_contact(&self) {
    self.shared.replace(|state| ScreenState { draft: Draft::default(), ..state });
  }

  pub fn edit_draft(&self, edit: DraftEdit) {
    self.shared.replace(|state| ScreenState { draft: state.draft.apply(edit), ..state });
  }

  // ── Mutations ─────────────────────────────────────────────────────────────

  /// Upsert the draft. New contacts are stamped with the current time;
  /// edited ones keep their original creation time. The draft is cleared on
  /// success.
  pub async fn save_contact(&self) -> Result<Contact> {
    let draft = self.shared.state.borrow().draft.clone();

    let saved = self
      .store
      .upsert(draft.clone().into_contact(Utc::now()))
      .await
      .map_err(Error::store)?;

    debug!(id = saved.id, "saved contact");
    self.clear_draft_if_unchanged(&draft);
    Ok(saved)
  }

  /// Delete the contact the draft refers to, then clear the draft. Returns
  /// `false` if it was already gone.
  pub async fn delete_contact(&self) -> Result<bool> {
    let draft = self.shared.state.borrow().draft.clone();
    if draft.is_new() {
      return Err(Error::NoSelection);
    }

    let target = draft.clone().into_contact(Utc::now());
    let removed = self.store.delete(&target).await.map_err(Error::store)?;

    debug!(id = target.id, removed, "deleted contact");
    self.clear_draft_if_unchanged(&draft);
    Ok(removed)
  }

  /// Reset the draft unless it was edited while a write was in flight.
  fn clear_draft_if_unchanged(&self, committed: &Draft) {
    self.shared.state.send_if_modified(|state| {
      if state.draft != *committed {
        return false;
      }
      let previous = mem::take(state);
      *state = ScreenState { draft: Draft::default(), ..previous };
      true
    });
  }
}

impl<S: ContactStore> Drop for Coordinator<S> {
  fn drop(&mut self) {
    if let Some(forwarder) = self.forwarder.take() {
      forwarder.abort();
    }
  }
}
