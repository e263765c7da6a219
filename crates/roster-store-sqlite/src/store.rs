//! The SQLite implementation of [`ContactStore`].

use std::{path::Path, sync::Arc};

use rusqlite::OptionalExtension as _;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use roster_core::{
  Contact, ContactId, QueryKind, SortOrder, contact::UNASSIGNED_ID,
  store::ContactStore,
};

use crate::{
  Error, Result,
  encode::{CONTACT_COLUMNS, RawContact, encode_like_pattern},
  schema::{self, Migration, PRAGMAS, SCHEMA_VERSION, SchemaMismatch},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Roster record store backed by a single SQLite file.
///
/// Clones share the connection and the change feed.
#[derive(Clone)]
pub struct SqliteStore {
  conn:    tokio_rusqlite::Connection,
  changes: Arc<watch::Sender<u64>>,
}

impl SqliteStore {
  /// Open (or create) a store at `path`, recreating the schema if the file
  /// carries another version.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    Self::open_with(path, SchemaMismatch::default()).await
  }

  /// Open (or create) a store at `path` with an explicit mismatch policy.
  pub async fn open_with(
    path: impl AsRef<Path>,
    on_mismatch: SchemaMismatch,
  ) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Self::init(conn, on_mismatch).await
  }

  /// Open an in-memory store. Used by the tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Self::init(conn, SchemaMismatch::default()).await
  }

  async fn init(
    conn: tokio_rusqlite::Connection,
    on_mismatch: SchemaMismatch,
  ) -> Result<Self> {
    let migration = conn
      .call(move |conn| {
        conn.execute_batch(PRAGMAS)?;
        Ok(schema::migrate(conn, on_mismatch)?)
      })
      .await?;

    match migration {
      Migration::Created => {
        info!(version = SCHEMA_VERSION, "created contact schema");
      }
      Migration::UpToDate => {
        debug!(version = SCHEMA_VERSION, "contact schema up to date");
      }
      Migration::Recreated { from } => {
        warn!(
          from,
          to = SCHEMA_VERSION,
          "schema version mismatch; dropped and recreated contact_table, \
           stored contacts were discarded"
        );
      }
      Migration::Refused { found } => {
        return Err(Error::UnsupportedSchemaVersion {
          found,
          expected: SCHEMA_VERSION,
        });
      }
    }

    let (changes, _) = watch::channel(0);
    Ok(Self { conn, changes: Arc::new(changes) })
  }

  /// Wake every live query.
  fn notify_changed(&self) { self.changes.send_modify(|generation| *generation += 1); }
}

// ─── ContactStore impl ───────────────────────────────────────────────────────

impl ContactStore for SqliteStore {
  type Error = Error;

  // ── Writes ────────────────────────────────────────────────────────────────

  async fn upsert(&self, contact: Contact) -> Result<Contact> {
    let raw = RawContact::from(contact);

    let stored: RawContact = self
      .conn
      .call(move |conn| {
        let id = if raw.id == UNASSIGNED_ID {
          conn.execute(
            "INSERT INTO contact_table (name, number, email, image, dateOfCreation)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![
              raw.name,
              raw.number,
              raw.email,
              raw.image,
              raw.date_of_creation,
            ],
          )?;
          conn.last_insert_rowid()
        } else {
          conn.execute(
            "INSERT INTO contact_table (id, name, number, email, image, dateOfCreation)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(id) DO UPDATE SET
               name           = excluded.name,
               number         = excluded.number,
               email          = excluded.email,
               image          = excluded.image,
               dateOfCreation = excluded.dateOfCreation",
            rusqlite::params![
              raw.id,
              raw.name,
              raw.number,
              raw.email,
              raw.image,
              raw.date_of_creation,
            ],
          )?;
          raw.id
        };
        Ok(RawContact { id, ..raw })
      })
      .await?;

    debug!(id = stored.id, "upserted contact");
    self.notify_changed();
    stored.into_contact()
  }

  async fn delete(&self, contact: &Contact) -> Result<bool> {
    let id = contact.id;

    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM contact_table WHERE id = ?1",
          rusqlite::params![id],
        )?)
      })
      .await?;

    debug!(id, removed, "deleted contact");
    if removed > 0 {
      self.notify_changed();
    }
    Ok(removed > 0)
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  async fn get(&self, id: ContactId) -> Result<Option<Contact>> {
    let raw: Option<RawContact> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {CONTACT_COLUMNS} FROM contact_table WHERE id = ?1"),
              rusqlite::params![id],
              RawContact::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawContact::into_contact).transpose()
  }

  async fn count(&self) -> Result<usize> {
    let n: i64 = self
      .conn
      .call(|conn| {
        Ok(conn.query_row("SELECT COUNT(*) FROM contact_table", [], |r| r.get(0))?)
      })
      .await?;
    Ok(n as usize)
  }

  async fn query(&self, kind: &QueryKind) -> Result<Vec<Contact>> {
    let order = match kind.sort() {
      SortOrder::Name => "name ASC, id ASC",
      SortOrder::Date => "dateOfCreation DESC, id DESC",
    };
    let pattern = kind.pattern().map(encode_like_pattern);

    let raws: Vec<RawContact> = self
      .conn
      .call(move |conn| {
        let filter = if pattern.is_some() {
          "WHERE name   LIKE ?1 ESCAPE '\\'
              OR number LIKE ?1 ESCAPE '\\'
              OR email  LIKE ?1 ESCAPE '\\'"
        } else {
          ""
        };
        let sql = format!(
          "SELECT {CONTACT_COLUMNS} FROM contact_table {filter} ORDER BY {order}"
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = match &pattern {
          Some(p) => stmt
            .query_map(rusqlite::params![p], RawContact::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?,
          None => stmt
            .query_map([], RawContact::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?,
        };
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawContact::into_contact).collect()
  }

  // ── Change feed ───────────────────────────────────────────────────────────

  fn changes(&self) -> watch::Receiver<u64> { self.changes.subscribe() }
}
