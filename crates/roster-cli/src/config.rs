//! Layered settings for the `roster` binary.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use roster_core::SortOrder;
use roster_store_sqlite::SchemaMismatch;
use serde::Deserialize;

/// Database file used when nothing else is configured.
pub const DEFAULT_STORE_PATH: &str = "ContactApp.db";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RosterConfig {
  pub store_path:      PathBuf,
  /// Order used by `list` and `watch` when `--sort` is not given.
  pub default_sort:    SortOrder,
  /// What to do when the database file has another schema version.
  pub schema_mismatch: SchemaMismatch,
}

impl RosterConfig {
  /// Defaults, then `file` if it exists, then `ROSTER_*` variables, then
  /// `store_override`.
  pub fn load(file: &Path, store_override: Option<&Path>) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .set_default("store_path", DEFAULT_STORE_PATH)?
      .set_default("default_sort", "name")?
      .set_default("schema_mismatch", "recreate")?
      .add_source(config::File::from(file).required(false))
      .add_source(config::Environment::with_prefix("ROSTER"))
      .set_override_option(
        "store_path",
        store_override.map(|p| p.to_string_lossy().into_owned()),
      )?
      .build()
      .with_context(|| format!("failed to read config file {}", file.display()))?;

    settings
      .try_deserialize()
      .context("failed to deserialise RosterConfig")
  }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
