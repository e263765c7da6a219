//! Error types for `roster-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("timestamp out of range: {0} ms since the epoch")]
  TimestampOutOfRange(i64),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
