//! Encoding and decoding helpers between Rust domain types and the column
//! values stored in SQLite.
//!
//! `dateOfCreation` is stored as integer epoch milliseconds. Photos are stored
//! as raw blobs. Search patterns become `LIKE` patterns with `\` as the escape
//! character.

use roster_core::{
  Contact, ContactId,
  contact::{from_millis, to_millis},
};

use crate::Result;

/// Columns selected by every contact read, in [`RawContact`] order.
pub const CONTACT_COLUMNS: &str =
  "id, name, number, email, image, dateOfCreation";

// ─── LIKE patterns ───────────────────────────────────────────────────────────

/// Turn a user search into a substring `LIKE` pattern. `%`, `_` and `\` in the
/// input match themselves.
///
/// SQLite's `LIKE` folds case for ASCII letters only: "ali" finds "Alice",
/// but "ñan" does not find "Ñandú".
pub fn encode_like_pattern(search: &str) -> String {
  let mut pattern = String::with_capacity(search.len() + 2);
  pattern.push('%');
  for ch in search.chars() {
    if matches!(ch, '%' | '_' | '\\') {
      pattern.push('\\');
    }
    pattern.push(ch);
  }
  pattern.push('%');
  pattern
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `contact_table` row.
pub struct RawContact {
  pub id:               ContactId,
  pub name:             String,
  pub number:           String,
  pub email:            String,
  pub image:            Option<Vec<u8>>,
  pub date_of_creation: i64,
}

impl RawContact {
  /// Read a row selected with [`CONTACT_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:               row.get(0)?,
      name:             row.get(1)?,
      number:           row.get(2)?,
      email:            row.get(3)?,
      image:            row.get(4)?,
      date_of_creation: row.get(5)?,
    })
  }

  pub fn into_contact(self) -> Result<Contact> {
    Ok(Contact {
      id:               self.id,
      name:             self.name,
      number:           self.number,
      email:            self.email,
      image:            self.image,
      date_of_creation: from_millis(self.date_of_creation)?,
    })
  }
}

impl From<Contact> for RawContact {
  fn from(c: Contact) -> Self {
    Self {
      id:               c.id,
      name:             c.name,
      number:           c.number,
      email:            c.email,
      image:            c.image,
      date_of_creation: to_millis(c.date_of_creation),
    }
  }
}
