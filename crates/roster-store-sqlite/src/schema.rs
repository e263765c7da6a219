//! SQL schema for the Roster SQLite store and its version gate.
//!
//! The schema version lives in `PRAGMA user_version`. There is no
//! data-preserving migration path: a file stamped with any other version is
//! either wiped and recreated or refused, depending on [`SchemaMismatch`].

use rusqlite::Connection;
use serde::Deserialize;

/// Version stamped into `PRAGMA user_version` by [`migrate`].
pub const SCHEMA_VERSION: u32 = 2;

/// Per-connection pragmas. Kept outside the migration transaction because
/// the journal mode cannot change inside one.
pub const PRAGMAS: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;
";

/// Full schema DDL; idempotent thanks to `CREATE ... IF NOT EXISTS`. The
/// version stamp is written separately by [`migrate`].
pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS contact_table (
    id             INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
    name           TEXT    NOT NULL,
    number         TEXT    NOT NULL,
    email          TEXT    NOT NULL,
    image          BLOB,               -- raw encoded photo bytes or NULL
    dateOfCreation INTEGER NOT NULL    -- epoch millis; set on first insert
);

CREATE INDEX IF NOT EXISTS contact_name_idx ON contact_table(name);
CREATE INDEX IF NOT EXISTS contact_date_idx ON contact_table(dateOfCreation);
";

const DROP_ALL: &str = "DROP TABLE IF EXISTS contact_table;";

/// What to do when an existing file carries a different schema version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaMismatch {
  /// Drop every table and start over. All stored contacts are lost.
  #[default]
  Recreate,
  /// Refuse to open the file.
  Fail,
}

/// Result of [`migrate`], reported by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Migration {
  /// Empty file; schema created.
  Created,
  /// Already at [`SCHEMA_VERSION`].
  UpToDate,
  /// Found `from`, wiped and recreated.
  Recreated { from: u32 },
  /// Found `found` and the policy said to stop. Nothing was touched.
  Refused { found: u32 },
}

/// Bring `conn` to [`SCHEMA_VERSION`] in a single transaction.
pub fn migrate(
  conn: &mut Connection,
  policy: SchemaMismatch,
) -> rusqlite::Result<Migration> {
  let found: u32 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;

  let outcome = match found {
    SCHEMA_VERSION => return Ok(Migration::UpToDate),
    0 => Migration::Created,
    other => match policy {
      SchemaMismatch::Fail => return Ok(Migration::Refused { found: other }),
      SchemaMismatch::Recreate => Migration::Recreated { from: other },
    },
  };

  let tx = conn.transaction()?;
  if matches!(outcome, Migration::Recreated { .. }) {
    tx.execute_batch(DROP_ALL)?;
  }
  tx.execute_batch(SCHEMA)?;
  tx.pragma_update(None, "user_version", SCHEMA_VERSION)?;
  tx.commit()?;

  Ok(outcome)
}
