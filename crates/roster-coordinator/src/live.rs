//! Live queries as explicit subscriptions.
//!
//! A [`Subscription`] owns a background task that runs one [`QueryKind`]
//! against a store, sends the snapshot, then parks on the store's change
//! feed until the next committed write. Writes that land while a query is
//! running collapse into a single re-run.

use roster_core::{Contact, QueryKind, store::ContactStore};
use tokio::{sync::mpsc, task::JoinHandle};

/// A running live query. Dropping it cancels the backing task.
pub struct Subscription<E> {
  rx:   mpsc::Receiver<Result<Vec<Contact>, E>>,
  task: JoinHandle<()>,
}

impl<E> Subscription<E> {
  /// The next snapshot. The first call yields the current contents; later
  /// calls wait for a change. `None` once the task has stopped.
  pub async fn next(&mut self) -> Option<Result<Vec<Contact>, E>> {
    self.rx.recv().await
  }

  /// Stop the query. No further snapshots are produced.
  pub fn cancel(self) { self.task.abort(); }
}

impl<E> Drop for Subscription<E> {
  fn drop(&mut self) { self.task.abort(); }
}

/// Start a live query over `store`. Must be called within a tokio runtime.
pub fn subscribe<S>(store: S, kind: QueryKind) -> Subscription<S::Error>
where
  S: ContactStore + 'static,
{
  // Capacity 1: at most one snapshot waits for the consumer.
  let (tx, rx) = mpsc::channel(1);

  let task = tokio::spawn(async move {
    let mut changes = store.changes();
    loop {
      changes.borrow_and_update();
      let snapshot = store.query(&kind).await;
      if tx.send(snapshot).await.is_err() {
        break;
      }
      if changes.changed().await.is_err() {
        break;
      }
    }
  });

  Subscription { rx, task }
}
