//! The contact record, the single entity Roster persists.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Row identity. `0` marks a contact that has not been persisted yet; the
/// store assigns a real id on first insert.
pub type ContactId = i64;

/// Identity value carried by contacts that were never saved.
pub const UNASSIGNED_ID: ContactId = 0;

// ─── Contact ─────────────────────────────────────────────────────────────────

/// A persisted contact row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
  pub id:               ContactId,
  pub name:             String,
  /// Free text; never validated.
  pub number:           String,
  /// Free text; never validated.
  pub email:            String,
  /// Raw encoded photo bytes, stored opaquely.
  #[serde(default, with = "image_base64")]
  pub image:            Option<Vec<u8>>,
  /// Set once at first insert. Upserts store whatever the caller passes, so
  /// edits must carry the original value forward.
  pub date_of_creation: DateTime<Utc>,
}

impl Contact {
  /// A not-yet-persisted contact with no photo.
  pub fn new(
    name: impl Into<String>,
    number: impl Into<String>,
    email: impl Into<String>,
    date_of_creation: DateTime<Utc>,
  ) -> Self {
    Self {
      id: UNASSIGNED_ID,
      name: name.into(),
      number: number.into(),
      email: email.into(),
      image: None,
      date_of_creation,
    }
  }

  pub fn is_persisted(&self) -> bool { self.id != UNASSIGNED_ID }

  /// The URI handed to the platform dialer.
  pub fn tel_uri(&self) -> String { format!("tel:{}", self.number) }
}

// ─── Timestamps ──────────────────────────────────────────────────────────────

/// Epoch milliseconds, the on-disk form of `date_of_creation`.
pub fn to_millis(dt: DateTime<Utc>) -> i64 { dt.timestamp_millis() }

pub fn from_millis(ms: i64) -> Result<DateTime<Utc>> {
  DateTime::from_timestamp_millis(ms).ok_or(Error::TimestampOutOfRange(ms))
}

// ─── Serde helpers ───────────────────────────────────────────────────────────

/// Photos travel as standard base64 in JSON.
mod image_base64 {
  use base64::{Engine as _, engine::general_purpose::STANDARD};
  use serde::{Deserialize, Deserializer, Serializer};

  pub fn serialize<S: Serializer>(
    image: &Option<Vec<u8>>,
    serializer: S,
  ) -> Result<S::Ok, S::Error> {
    match image {
      Some(bytes) => serializer.serialize_some(&STANDARD.encode(bytes)),
      None => serializer.serialize_none(),
    }
  }

  pub fn deserialize<'de, D: Deserializer<'de>>(
    deserializer: D,
  ) -> Result<Option<Vec<u8>>, D::Error> {
    Option::<String>::deserialize(deserializer)?
      .map(|encoded| STANDARD.decode(encoded).map_err(serde::de::Error::custom))
      .transpose()
  }
}
