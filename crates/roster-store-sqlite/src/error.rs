//! Error type for `roster-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] roster_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  /// The file carries another schema version and the open policy is
  /// [`SchemaMismatch::Fail`](crate::SchemaMismatch::Fail).
  #[error("unsupported schema version {found} (expected {expected})")]
  UnsupportedSchemaVersion { found: u32, expected: u32 },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
