//! Screen state and the add/edit draft.
//!
//! Both are plain values. Every transition builds a new value; nothing is
//! patched field by field from the outside.

use chrono::{DateTime, Utc};
use roster_core::{
  Contact, ContactId, QueryKind, SortOrder, contact::UNASSIGNED_ID,
};

// ─── Draft ───────────────────────────────────────────────────────────────────

/// In-progress input for the add/edit form. Detached from storage until
/// saved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
  /// [`UNASSIGNED_ID`] for a contact that does not exist yet.
  pub id:               ContactId,
  pub name:             String,
  pub number:           String,
  pub email:            String,
  pub image:            Option<Vec<u8>>,
  /// Carried over from the contact being edited; `None` for a new one.
  pub date_of_creation: Option<DateTime<Utc>>,
}

/// A single user edit to the draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftEdit {
  Name(String),
  Number(String),
  Email(String),
  /// Bytes from the image picker, or `None` to remove the photo.
  Image(Option<Vec<u8>>),
}

impl Draft {
  /// Copy every field of `contact` for editing.
  pub fn from_contact(contact: &Contact) -> Self {
    Self {
      id:               contact.id,
      name:             contact.name.clone(),
      number:           contact.number.clone(),
      email:            contact.email.clone(),
      image:            contact.image.clone(),
      date_of_creation: Some(contact.date_of_creation),
    }
  }

  pub fn is_new(&self) -> bool { self.id == UNASSIGNED_ID }

  #[must_use]
  pub fn apply(self, edit: DraftEdit) -> Self {
    match edit {
      DraftEdit::Name(name) => Self { name, ..self },
      DraftEdit::Number(number) => Self { number, ..self },
      DraftEdit::Email(email) => Self { email, ..self },
      DraftEdit::Image(image) => Self { image, ..self },
    }
  }

  /// The contact to upsert. `now` is used only when the draft has no
  /// creation time of its own.
  pub fn into_contact(self, now: DateTime<Utc>) -> Contact {
    Contact {
      id:               self.id,
      name:             self.name,
      number:           self.number,
      email:            self.email,
      image:            self.image,
      date_of_creation: self.date_of_creation.unwrap_or(now),
    }
  }
}

// ─── ScreenState ─────────────────────────────────────────────────────────────

/// Everything a front end needs to render the contact list and the form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScreenState {
  /// Latest result of the active live query.
  pub contacts:     Vec<Contact>,
  pub draft:        Draft,
  pub sort:         SortOrder,
  pub search_query: String,
  /// Last live-query failure; cleared by the next successful result.
  pub error:        Option<String>,
  /// The query `contacts` came from. `None` until the first result lands.
  pub source:       Option<QueryKind>,
}

impl ScreenState {
  /// The query the current sort and search select.
  pub fn active_query(&self) -> QueryKind {
    QueryKind::select(self.sort, &self.search_query)
  }

  /// Whether `contacts` reflects the current sort and search rather than a
  /// query that has since been replaced.
  pub fn is_settled(&self) -> bool {
    self.source.as_ref() == Some(&self.active_query())
  }
}
