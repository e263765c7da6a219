//! Subcommand handlers. Each one drives a [`Coordinator`] the way an
//! interactive screen would: load the draft, apply edits, then save or
//! delete.

use std::path::PathBuf;

use anyhow::{Context as _, bail};
use chrono::Local;
use roster_coordinator::{Coordinator, DraftEdit, ScreenState};
use roster_core::{Contact, ContactId, SortOrder, store::ContactStore};
use roster_store_sqlite::SqliteStore;
use tokio::sync::watch;
use tracing::{debug, warn};

/// What `edit` does with the stored photo.
#[derive(Debug)]
pub enum ImageChange {
  Keep,
  Clear,
  Replace(PathBuf),
}

// ─── Read-only ────────────────────────────────────────────────────────────────

pub async fn list(
  store: SqliteStore,
  sort: SortOrder,
  search: Option<String>,
  json: bool,
) -> anyhow::Result<()> {
  let mut coordinator = Coordinator::new(store, sort);
  if let Some(text) = search {
    coordinator.on_search_query_change(text);
  }

  let state = settled(&mut coordinator.state()).await?;
  if let Some(err) = state.error {
    bail!("query failed: {err}");
  }

  if json {
    println!("{}", serde_json::to_string_pretty(&state.contacts)?);
  } else {
    print!("{}", render_table(&state.contacts));
  }
  Ok(())
}

pub async fn dial(store: SqliteStore, id: ContactId) -> anyhow::Result<()> {
  let contact = lookup(&store, id).await?;
  println!("{}", contact.tel_uri());
  Ok(())
}

/// Print the list whenever the result of the live query changes, until
/// Ctrl-C.
pub async fn watch(
  store: SqliteStore,
  sort: SortOrder,
  search: Option<String>,
) -> anyhow::Result<()> {
  let mut coordinator = Coordinator::new(store, sort);
  if let Some(text) = search {
    coordinator.on_search_query_change(text);
  }

  let mut rx = coordinator.state();
  let mut shown: Option<Vec<Contact>> = None;
  let ctrl_c = tokio::signal::ctrl_c();
  tokio::pin!(ctrl_c);

  loop {
    let state = rx.borrow_and_update().clone();
    if state.is_settled() {
      if let Some(err) = &state.error {
        warn!(%err, "live query failed");
      } else if shown.as_ref() != Some(&state.contacts) {
        print!("{}", render_table(&state.contacts));
        println!();
        shown = Some(state.contacts);
      }
    }

    tokio::select! {
      changed = rx.changed() => {
        if changed.is_err() {
          break;
        }
      }
      interrupted = &mut ctrl_c => {
        interrupted.context("failed to listen for Ctrl-C")?;
        debug!("interrupted");
        break;
      }
    }
  }
  Ok(())
}

// ─── Mutations ────────────────────────────────────────────────────────────────

pub async fn add(
  store: SqliteStore,
  name: String,
  number: String,
  email: String,
  image: Option<PathBuf>,
) -> anyhow::Result<()> {
  let image = match image {
    Some(path) => Some(read_image(&path).await?),
    None => None,
  };

  let coordinator = Coordinator::new(store, SortOrder::default());
  coordinator.start_new_contact();
  for edit in [
    DraftEdit::Name(name),
    DraftEdit::Number(number),
    DraftEdit::Email(email),
    DraftEdit::Image(image),
  ] {
    coordinator.edit_draft(edit);
  }

  let saved = coordinator.save_contact().await?;
  println!("added contact {}", saved.id);
  Ok(())
}

pub async fn edit(
  store: SqliteStore,
  id: ContactId,
  name: Option<String>,
  number: Option<String>,
  email: Option<String>,
  image: ImageChange,
) -> anyhow::Result<()> {
  let contact = lookup(&store, id).await?;

  let image = match image {
    ImageChange::Keep => None,
    ImageChange::Clear => Some(DraftEdit::Image(None)),
    ImageChange::Replace(path) => Some(DraftEdit::Image(Some(read_image(&path).await?))),
  };
  let edits = [
    name.map(DraftEdit::Name),
    number.map(DraftEdit::Number),
    email.map(DraftEdit::Email),
    image,
  ];

  let coordinator = Coordinator::new(store, SortOrder::default());
  coordinator.open_for_edit(&contact);
  for edit in edits.into_iter().flatten() {
    coordinator.edit_draft(edit);
  }

  let saved = coordinator.save_contact().await?;
  println!("updated contact {}", saved.id);
  Ok(())
}

pub async fn delete(store: SqliteStore, id: ContactId) -> anyhow::Result<()> {
  let Some(contact) = store.get(id).await? else {
    println!("contact {id} not found");
    return Ok(());
  };

  let coordinator = Coordinator::new(store, SortOrder::default());
  coordinator.open_for_edit(&contact);
  if coordinator.delete_contact().await? {
    println!("deleted contact {id}");
  } else {
    println!("contact {id} not found");
  }
  Ok(())
}

// ─── Helpers ──────────────────────────────────────────────────────────────────

/// Wait until the state reflects the selected query.
async fn settled(rx: &mut watch::Receiver<ScreenState>) -> anyhow::Result<ScreenState> {
  let state = rx
    .wait_for(ScreenState::is_settled)
    .await
    .context("coordinator stopped before the first result")?;
  Ok(state.clone())
}

async fn lookup(store: &SqliteStore, id: ContactId) -> anyhow::Result<Contact> {
  match store.get(id).await? {
    Some(contact) => Ok(contact),
    None => bail!("no contact with id {id}"),
  }
}

async fn read_image(path: &std::path::Path) -> anyhow::Result<Vec<u8>> {
  tokio::fs::read(path)
    .await
    .with_context(|| format!("failed to read image {}", path.display()))
}

fn render_table(contacts: &[Contact]) -> String {
  if contacts.is_empty() {
    return "no contacts\n".to_string();
  }

  let name_w = column_width(contacts, "NAME", |c| &c.name);
  let number_w = column_width(contacts, "NUMBER", |c| &c.number);
  let email_w = column_width(contacts, "EMAIL", |c| &c.email);

  let mut out = format!(
    "{:>4}  {:<name_w$}  {:<number_w$}  {:<email_w$}  {:<16}  PHOTO\n",
    "ID", "NAME", "NUMBER", "EMAIL", "CREATED",
  );
  for c in contacts {
    let created = c.date_of_creation.with_timezone(&Local).format("%Y-%m-%d %H:%M");
    let photo = if c.image.is_some() { "yes" } else { "" };
    out.push_str(&format!(
      "{:>4}  {:<name_w$}  {:<number_w$}  {:<email_w$}  {:<16}  {photo}\n",
      c.id,
      c.name,
      c.number,
      c.email,
      created.to_string(),
    ));
  }
  out
}

fn column_width(
  contacts: &[Contact],
  header: &str,
  field: impl Fn(&Contact) -> &String,
) -> usize {
  contacts
    .iter()
    .map(|c| field(c).chars().count())
    .chain([header.len()])
    .max()
    .unwrap_or(0)
}
