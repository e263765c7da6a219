//! `roster`: command-line front end for the Roster contacts store.
//!
//! # Usage
//!
//! ```text
//! roster list --sort date --search ali
//! roster add --name Alice --number 555-0100 --email alice@example.com
//! roster edit 3 --email alice@new.example.com --image ~/alice.jpg
//! roster delete 3
//! roster watch --search ali
//! ```
//!
//! Settings come from `roster.toml` (or `--config`), then `ROSTER_*`
//! environment variables, then flags.

mod commands;
mod config;

use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use roster_core::{ContactId, SortOrder};
use roster_store_sqlite::SqliteStore;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::config::{RosterConfig, expand_tilde};

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "roster", author, version, about = "Local contacts manager")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, global = true, default_value = "roster.toml")]
  config: PathBuf,

  /// Database file, overriding `store_path` from the config.
  #[arg(long, global = true, value_name = "FILE")]
  store: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Print the contact list.
  List {
    #[arg(long, value_enum)]
    sort:   Option<SortArg>,
    /// Only contacts whose name, number or email contains this text.
    #[arg(long)]
    search: Option<String>,
    /// Emit JSON instead of a table.
    #[arg(long)]
    json:   bool,
  },

  /// Add a new contact.
  Add {
    #[arg(long)]
    name:   String,
    #[arg(long)]
    number: String,
    #[arg(long)]
    email:  String,
    /// Photo to attach, stored as raw bytes.
    #[arg(long, value_name = "FILE")]
    image:  Option<PathBuf>,
  },

  /// Change fields of an existing contact.
  Edit {
    id:          ContactId,
    #[arg(long)]
    name:        Option<String>,
    #[arg(long)]
    number:      Option<String>,
    #[arg(long)]
    email:       Option<String>,
    #[arg(long, value_name = "FILE", conflicts_with = "clear_image")]
    image:       Option<PathBuf>,
    /// Remove the stored photo.
    #[arg(long)]
    clear_image: bool,
  },

  /// Delete a contact.
  Delete { id: ContactId },

  /// Print the `tel:` URI for a contact's number.
  Dial { id: ContactId },

  /// Print the list again after every change until interrupted.
  Watch {
    #[arg(long, value_enum)]
    sort:   Option<SortArg>,
    #[arg(long)]
    search: Option<String>,
  },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum SortArg {
  Name,
  Date,
}

impl From<SortArg> for SortOrder {
  fn from(arg: SortArg) -> Self {
    match arg {
      SortArg::Name => SortOrder::Name,
      SortArg::Date => SortOrder::Date,
    }
  }
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Logs go to stderr so stdout stays clean for `--json`.
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let settings = RosterConfig::load(&cli.config, cli.store.as_deref())?;
  let store_path = expand_tilde(&settings.store_path);

  tracing::debug!(?store_path, policy = ?settings.schema_mismatch, "opening store");
  let store = SqliteStore::open_with(&store_path, settings.schema_mismatch)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  match cli.command {
    Command::List { sort, search, json } => {
      let sort = sort.map_or(settings.default_sort, SortOrder::from);
      commands::list(store, sort, search, json).await
    }
    Command::Add { name, number, email, image } => {
      commands::add(store, name, number, email, image).await
    }
    Command::Edit { id, name, number, email, image, clear_image } => {
      let image = match (image, clear_image) {
        (Some(path), _) => commands::ImageChange::Replace(path),
        (None, true) => commands::ImageChange::Clear,
        (None, false) => commands::ImageChange::Keep,
      };
      commands::edit(store, id, name, number, email, image).await
    }
    Command::Delete { id } => commands::delete(store, id).await,
    Command::Dial { id } => commands::dial(store, id).await,
    Command::Watch { sort, search } => {
      let sort = sort.map_or(settings.default_sort, SortOrder::from);
      commands::watch(store, sort, search).await
    }
  }
}
