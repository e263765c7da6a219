//! Sort modes and the four live queries a session can be subscribed to.

use serde::{Deserialize, Serialize};

/// How the contact list is ordered.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
  /// Name ascending.
  #[default]
  Name,
  /// Creation time descending, newest first.
  Date,
}

impl SortOrder {
  pub fn toggled(self) -> Self {
    match self {
      Self::Name => Self::Date,
      Self::Date => Self::Name,
    }
  }
}

/// One of the store's four queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryKind {
  ByName,
  ByDate,
  /// Contacts whose name, number or email contains the pattern, by name.
  SearchByName(String),
  /// Contacts whose name, number or email contains the pattern, newest first.
  SearchByDate(String),
}

impl QueryKind {
  /// Pick the query for a sort mode and the current search text. An empty
  /// search selects the unfiltered variant.
  pub fn select(sort: SortOrder, search: &str) -> Self {
    match (sort, search.is_empty()) {
      (SortOrder::Name, true) => Self::ByName,
      (SortOrder::Date, true) => Self::ByDate,
      (SortOrder::Name, false) => Self::SearchByName(search.to_owned()),
      (SortOrder::Date, false) => Self::SearchByDate(search.to_owned()),
    }
  }

  pub fn sort(&self) -> SortOrder {
    match self {
      Self::ByName | Self::SearchByName(_) => SortOrder::Name,
      Self::ByDate | Self::SearchByDate(_) => SortOrder::Date,
    }
  }

  /// The search pattern, if this is a filtered query.
  pub fn pattern(&self) -> Option<&str> {
    match self {
      Self::ByName | Self::ByDate => None,
      Self::SearchByName(p) | Self::SearchByDate(p) => Some(p),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn select_covers_all_four_queries() {
    assert_eq!(QueryKind::select(SortOrder::Name, ""), QueryKind::ByName);
    assert_eq!(QueryKind::select(SortOrder::Date, ""), QueryKind::ByDate);
    assert_eq!(
      QueryKind::select(SortOrder::Name, "li"),
      QueryKind::SearchByName("li".into())
    );
    assert_eq!(
      QueryKind::select(SortOrder::Date, "li"),
      QueryKind::SearchByDate("li".into())
    );
  }

  #[test]
  fn whitespace_is_a_real_search() {
    assert_eq!(
      QueryKind::select(SortOrder::Name, " "),
      QueryKind::SearchByName(" ".into())
    );
  }

  #[test]
  fn toggling_twice_is_identity() {
    assert_eq!(SortOrder::Name.toggled(), SortOrder::Date);
    assert_eq!(SortOrder::Name.toggled().toggled(), SortOrder::Name);
  }

  #[test]
  fn sort_and_pattern_accessors() {
    let q = QueryKind::SearchByDate("ph".into());
    assert_eq!(q.sort(), SortOrder::Date);
    assert_eq!(q.pattern(), Some("ph"));
    assert_eq!(QueryKind::ByName.pattern(), None);
  }
}
