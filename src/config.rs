//! Runtime configuration
//!
//! Every option can come from a flag or an environment variable:
//!
//! | Flag | Variable | Default |
//! |------|----------|---------|
//! | `--database` | `ROSTER_DATABASE` | `.` |
//! | `--store` | `ROSTER_STORE` | `markdown` |
//! | `--log-json` | `ROSTER_LOG_JSON` | off |
//! | `serve --bind` | `ROSTER_BIND` | `127.0.0.1:3000` |
//!
//! Log levels come from `RUST_LOG` and default to `info`.

use clap::{Args, ValueEnum};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use crate::error::Result;
use crate::storage::{MarkdownStore, MemoryStore, StudentStore};

/// Default listen address for `serve`
pub const DEFAULT_BIND: &str = "127.0.0.1:3000";

/// Which backend holds the records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum StoreKind {
    /// Markdown files in a git repository under `--database`
    #[default]
    Markdown,
    /// In-process map, lost on exit
    Memory,
}

/// Options shared by every command
#[derive(Debug, Clone, Args)]
pub struct Config {
    /// Store root (defaults to current directory)
    #[arg(short, long, env = "ROSTER_DATABASE", default_value = ".", global = true)]
    pub database: PathBuf,

    /// Storage backend
    #[arg(long, env = "ROSTER_STORE", value_enum, default_value_t = StoreKind::Markdown, global = true)]
    pub store: StoreKind,

    /// Emit logs as JSON lines
    #[arg(long, env = "ROSTER_LOG_JSON", global = true)]
    pub log_json: bool,
}

impl Config {
    /// Open the configured backend
    pub async fn open_store(&self) -> Result<Arc<dyn StudentStore>> {
        let store: Arc<dyn StudentStore> = match self.store {
            StoreKind::Markdown => Arc::new(MarkdownStore::open(&self.database).await?),
            StoreKind::Memory => Arc::new(MemoryStore::new()),
        };
        tracing::debug!("Opened {:?} store at {:?}", self.store, self.database);
        Ok(store)
    }
}

/// Options for the HTTP server
#[derive(Debug, Clone, Args)]
pub struct ServeConfig {
    /// Address to listen on
    #[arg(long, env = "ROSTER_BIND", default_value = DEFAULT_BIND)]
    pub bind: SocketAddr,
}

/// Install the global subscriber
pub fn init_logging(json: bool) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let installed = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    installed.map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))
}
