//! Tests for live subscriptions and the `Coordinator`, run against an
//! in-memory `SqliteStore`.

use std::{
  sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
  },
  time::Duration,
};

use roster_core::{
  Contact, ContactId, QueryKind, SortOrder, contact::from_millis,
  store::ContactStore,
};
use roster_store_sqlite::SqliteStore;
use tokio::{sync::watch, time::timeout};

use crate::{Coordinator, Draft, DraftEdit, Error, ScreenState, subscribe};

const WAIT: Duration = Duration::from_secs(5);

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn contact(name: &str, number: &str, email: &str, created_ms: i64) -> Contact {
  Contact::new(name, number, email, from_millis(created_ms).unwrap())
}

/// Bob, Amy and Cat, created in that order.
async fn seeded() -> SqliteStore {
  let s = store().await;
  s.upsert(contact("Bob", "555-000", "bob@x.com", 10)).await.unwrap();
  s.upsert(contact("Amy", "222", "amy@x.com", 20)).await.unwrap();
  s.upsert(contact("Cat", "333", "cat@lime.org", 30)).await.unwrap();
  s
}

fn names(state: &ScreenState) -> Vec<&str> {
  state.contacts.iter().map(|c| c.name.as_str()).collect()
}

async fn wait_until(
  rx: &mut watch::Receiver<ScreenState>,
  mut done: impl FnMut(&ScreenState) -> bool,
) -> ScreenState {
  timeout(WAIT, rx.wait_for(|s| done(s)))
    .await
    .expect("timed out waiting for screen state")
    .expect("coordinator dropped")
    .clone()
}

async fn wait_for_names(
  rx: &mut watch::Receiver<ScreenState>,
  expected: &[&str],
) -> ScreenState {
  wait_until(rx, |s| names(s) == expected).await
}

// ─── Subscriptions ───────────────────────────────────────────────────────────

#[tokio::test]
async fn subscription_starts_with_current_snapshot() {
  let s = seeded().await;
  let mut sub = subscribe(s.clone(), QueryKind::ByDate);

  let first = timeout(WAIT, sub.next()).await.unwrap().unwrap().unwrap();
  let got: Vec<_> = first.iter().map(|c| c.name.as_str()).collect();
  assert_eq!(got, ["Cat", "Amy", "Bob"]);
}

#[tokio::test]
async fn subscription_reemits_after_writes() {
  let s = store().await;
  let mut sub = subscribe(s.clone(), QueryKind::ByName);

  let first = timeout(WAIT, sub.next()).await.unwrap().unwrap().unwrap();
  assert!(first.is_empty());

  let zoe = s.upsert(contact("Zoe", "111", "z@e.com", 100)).await.unwrap();
  let second = timeout(WAIT, sub.next()).await.unwrap().unwrap().unwrap();
  assert_eq!(second, vec![zoe.clone()]);

  s.delete(&zoe).await.unwrap();
  let third = timeout(WAIT, sub.next()).await.unwrap().unwrap().unwrap();
  assert!(third.is_empty());
}

#[tokio::test]
async fn late_subscriber_sees_latest_data() {
  let s = store().await;
  let _early = subscribe(s.clone(), QueryKind::ByName);
  s.upsert(contact("Amy", "222", "a@e.com", 200)).await.unwrap();

  let mut late = subscribe(s.clone(), QueryKind::ByName);
  let first = timeout(WAIT, late.next()).await.unwrap().unwrap().unwrap();
  assert_eq!(first.len(), 1);
}

#[tokio::test]
async fn cancelled_subscription_stops_emitting() {
  let s = store().await;
  let mut sub = subscribe(s.clone(), QueryKind::ByName);
  timeout(WAIT, sub.next()).await.unwrap().unwrap().unwrap();

  sub.cancel();
  // The store is still usable and nothing is left waiting on the feed.
  s.upsert(contact("Amy", "222", "a@e.com", 200)).await.unwrap();
  assert_eq!(s.count().await.unwrap(), 1);
}

// ─── Query switching ─────────────────────────────────────────────────────────

#[tokio::test]
async fn starts_with_name_order() {
  let coordinator = Coordinator::new(seeded().await, SortOrder::Name);
  let mut rx = coordinator.state();

  let state = wait_for_names(&mut rx, &["Amy", "Bob", "Cat"]).await;
  assert_eq!(state.sort, SortOrder::Name);
  assert!(state.search_query.is_empty());
  assert_eq!(state.error, None);
  assert_eq!(state.source, Some(QueryKind::ByName));
}

#[tokio::test]
async fn change_sorting_toggles_order() {
  let mut coordinator = Coordinator::new(seeded().await, SortOrder::Name);
  let mut rx = coordinator.state();
  wait_for_names(&mut rx, &["Amy", "Bob", "Cat"]).await;

  coordinator.change_sorting();
  let state = wait_for_names(&mut rx, &["Cat", "Amy", "Bob"]).await;
  assert_eq!(state.sort, SortOrder::Date);

  coordinator.change_sorting();
  let state = wait_for_names(&mut rx, &["Amy", "Bob", "Cat"]).await;
  assert_eq!(state.sort, SortOrder::Name);
}

#[tokio::test]
async fn search_filters_and_clearing_restores() {
  let mut coordinator = Coordinator::new(seeded().await, SortOrder::Name);
  let mut rx = coordinator.state();
  wait_for_names(&mut rx, &["Amy", "Bob", "Cat"]).await;

  // "li" only occurs in Cat's email.
  coordinator.on_search_query_change("li");
  let state = wait_for_names(&mut rx, &["Cat"]).await;
  assert_eq!(state.search_query, "li");

  coordinator.on_search_query_change("555");
  wait_for_names(&mut rx, &["Bob"]).await;

  coordinator.on_search_query_change("");
  wait_for_names(&mut rx, &["Amy", "Bob", "Cat"]).await;
}

#[tokio::test]
async fn search_respects_current_sort() {
  let s = seeded().await;
  s.upsert(contact("Amya", "9", "q@x.com", 40)).await.unwrap();

  let mut coordinator = Coordinator::new(s, SortOrder::Date);
  let mut rx = coordinator.state();

  coordinator.on_search_query_change("amy");
  wait_for_names(&mut rx, &["Amya", "Amy"]).await;

  coordinator.change_sorting();
  wait_for_names(&mut rx, &["Amy", "Amya"]).await;
}

#[tokio::test]
async fn rapid_switches_settle_on_the_last_query() {
  let mut coordinator = Coordinator::new(seeded().await, SortOrder::Name);
  let mut rx = coordinator.state();

  for text in ["b", "am", "c", "", "a"] {
    coordinator.on_search_query_change(text);
    coordinator.change_sorting();
  }
  // Five toggles from Name end on Date; "a" matches Amy and Cat by name.
  let settled = wait_until(&mut rx, ScreenState::is_settled).await;
  assert_eq!(names(&settled), ["Cat", "Amy"]);
  assert_eq!(settled.sort, SortOrder::Date);
  assert_eq!(settled.search_query, "a");

  // Nothing from a retired subscription may overwrite the settled result.
  rx.borrow_and_update();
  tokio::time::sleep(Duration::from_millis(100)).await;
  assert_eq!(names(&rx.borrow_and_update()), ["Cat", "Amy"]);
}

#[tokio::test]
async fn writes_from_elsewhere_show_up_live() {
  let s = seeded().await;
  let coordinator = Coordinator::new(s.clone(), SortOrder::Name);
  let mut rx = coordinator.state();
  wait_for_names(&mut rx, &["Amy", "Bob", "Cat"]).await;

  s.upsert(contact("Ada", "1", "ada@x.com", 50)).await.unwrap();
  wait_for_names(&mut rx, &["Ada", "Amy", "Bob", "Cat"]).await;
}

// ─── Draft and mutations ─────────────────────────────────────────────────────

#[tokio::test]
async fn save_new_contact_appears_and_clears_draft() {
  let coordinator = Coordinator::new(seeded().await, SortOrder::Name);
  let mut rx = coordinator.state();

  coordinator.start_new_contact();
  coordinator.edit_draft(DraftEdit::Name("Dan".into()));
  coordinator.edit_draft(DraftEdit::Number("444".into()));
  coordinator.edit_draft(DraftEdit::Email("dan@x.com".into()));
  coordinator.edit_draft(DraftEdit::Image(Some(vec![9, 9])));

  let saved = coordinator.save_contact().await.unwrap();
  assert!(saved.is_persisted());
  assert_eq!(saved.image.as_deref(), Some(&[9, 9][..]));

  let state = wait_for_names(&mut rx, &["Amy", "Bob", "Cat", "Dan"]).await;
  assert_eq!(state.draft, Draft::default());
}

#[tokio::test]
async fn new_contact_is_newest_in_date_order() {
  let coordinator = Coordinator::new(seeded().await, SortOrder::Date);
  let mut rx = coordinator.state();

  coordinator.edit_draft(DraftEdit::Name("Dan".into()));
  coordinator.save_contact().await.unwrap();

  wait_for_names(&mut rx, &["Dan", "Cat", "Amy", "Bob"]).await;
}

#[tokio::test]
async fn editing_keeps_identity_and_creation_time() {
  let s = seeded().await;
  let amy = s
    .query(&QueryKind::SearchByName("Amy".into()))
    .await
    .unwrap()
    .remove(0);

  let coordinator = Coordinator::new(s.clone(), SortOrder::Name);
  coordinator.open_for_edit(&amy);
  assert_eq!(coordinator.snapshot().draft, Draft::from_contact(&amy));

  coordinator.edit_draft(DraftEdit::Number("999".into()));
  let saved = coordinator.save_contact().await.unwrap();

  assert_eq!(saved.id, amy.id);
  assert_eq!(saved.date_of_creation, from_millis(20).unwrap());
  assert_eq!(s.count().await.unwrap(), 3);
  assert_eq!(s.get(amy.id).await.unwrap().unwrap().number, "999");
}

#[tokio::test]
async fn emissions_do_not_touch_the_draft() {
  let s = seeded().await;
  let coordinator = Coordinator::new(s.clone(), SortOrder::Name);
  let mut rx = coordinator.state();
  let state = wait_for_names(&mut rx, &["Amy", "Bob", "Cat"]).await;

  let bob = state.contacts[1].clone();
  coordinator.open_for_edit(&bob);

  s.upsert(contact("Ada", "1", "ada@x.com", 50)).await.unwrap();
  let state = wait_for_names(&mut rx, &["Ada", "Amy", "Bob", "Cat"]).await;
  assert_eq!(state.draft, Draft::from_contact(&bob));
}

#[tokio::test]
async fn delete_selected_contact() {
  let coordinator = Coordinator::new(seeded().await, SortOrder::Name);
  let mut rx = coordinator.state();
  let state = wait_for_names(&mut rx, &["Amy", "Bob", "Cat"]).await;

  coordinator.open_for_edit(&state.contacts[0]);
  assert!(coordinator.delete_contact().await.unwrap());

  let state = wait_for_names(&mut rx, &["Bob", "Cat"]).await;
  assert_eq!(state.draft, Draft::default());
}

#[tokio::test]
async fn delete_already_removed_contact_is_a_noop() {
  let s = seeded().await;
  let coordinator = Coordinator::new(s.clone(), SortOrder::Name);
  let mut rx = coordinator.state();
  let state = wait_for_names(&mut rx, &["Amy", "Bob", "Cat"]).await;

  let amy = state.contacts[0].clone();
  s.delete(&amy).await.unwrap();

  coordinator.open_for_edit(&amy);
  assert!(!coordinator.delete_contact().await.unwrap());
  assert_eq!(s.count().await.unwrap(), 2);
}

#[tokio::test]
async fn delete_without_selection_is_rejected() {
  let s = seeded().await;
  let coordinator = Coordinator::new(s.clone(), SortOrder::Name);

  let err = coordinator.delete_contact().await.unwrap_err();
  assert!(matches!(err, Error::NoSelection));
  assert_eq!(s.count().await.unwrap(), 3);
}

#[tokio::test]
async fn start_new_contact_discards_a_cancelled_edit() {
  let s = seeded().await;
  let coordinator = Coordinator::new(s.clone(), SortOrder::Name);
  let mut rx = coordinator.state();
  let state = wait_for_names(&mut rx, &["Amy", "Bob", "Cat"]).await;

  // Edit opened, then abandoned without saving.
  coordinator.open_for_edit(&state.contacts[2]);
  coordinator.start_new_contact();
  coordinator.edit_draft(DraftEdit::Name("Eve".into()));
  let saved = coordinator.save_contact().await.unwrap();

  assert_ne!(saved.id, state.contacts[2].id);
  assert_eq!(saved.number, "");
  assert_eq!(s.count().await.unwrap(), 4);
}

// ─── Live-query failures ─────────────────────────────────────────────────────

/// A store whose reads can be switched to fail.
#[derive(Clone)]
struct Flaky {
  inner:   SqliteStore,
  failing: Arc<AtomicBool>,
}

impl ContactStore for Flaky {
  type Error = roster_store_sqlite::Error;

  async fn upsert(&self, contact: Contact) -> Result<Contact, Self::Error> {
    self.inner.upsert(contact).await
  }

  async fn delete(&self, contact: &Contact) -> Result<bool, Self::Error> {
    self.inner.delete(contact).await
  }

  async fn get(&self, id: ContactId) -> Result<Option<Contact>, Self::Error> {
    self.inner.get(id).await
  }

  async fn count(&self) -> Result<usize, Self::Error> { self.inner.count().await }

  async fn query(&self, kind: &QueryKind) -> Result<Vec<Contact>, Self::Error> {
    if self.failing.load(Ordering::SeqCst) {
      return Err(roster_store_sqlite::Error::UnsupportedSchemaVersion {
        found:    9,
        expected: roster_store_sqlite::SCHEMA_VERSION,
      });
    }
    self.inner.query(kind).await
  }

  fn changes(&self) -> watch::Receiver<u64> { self.inner.changes() }
}

#[tokio::test]
async fn query_failure_is_surfaced_then_cleared_by_the_next_result() {
  let s = seeded().await;
  let failing = Arc::new(AtomicBool::new(true));
  let flaky = Flaky { inner: s.clone(), failing: Arc::clone(&failing) };

  let coordinator = Coordinator::new(flaky, SortOrder::Name);
  let mut rx = coordinator.state();

  let failed = wait_until(&mut rx, |st| st.error.is_some()).await;
  assert!(failed.is_settled());
  assert!(failed.contacts.is_empty());
  assert!(
    failed
      .error
      .as_deref()
      .is_some_and(|e| e.contains("unsupported schema version 9"))
  );

  // The subscription survives the failure and re-runs on the next write.
  failing.store(false, Ordering::SeqCst);
  s.upsert(contact("Dan", "444", "dan@x.com", 40)).await.unwrap();

  let recovered = wait_for_names(&mut rx, &["Amy", "Bob", "Cat", "Dan"]).await;
  assert_eq!(recovered.error, None);
  assert!(recovered.is_settled());
}
