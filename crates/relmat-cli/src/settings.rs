//! Process settings resolved from flags and environment

use std::path::PathBuf;

use clap::{Args, ValueEnum};
use relmat_core::logging_facility::Profile;
use rusqlite::Connection;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    pub fn profile(self) -> Profile {
        match self {
            LogFormat::Pretty => Profile::Development,
            LogFormat::Json => Profile::Production,
        }
    }
}

#[derive(Debug, Args)]
pub struct Settings {
    /// SQLite database file, created and migrated on first use
    #[arg(long, global = true, env = "RELMAT_DB", default_value = "relmat.db")]
    pub db: PathBuf,

    /// Log output format (logs go to stderr; filter with RUST_LOG)
    #[arg(
        long,
        global = true,
        env = "RELMAT_LOG",
        value_enum,
        default_value_t = LogFormat::Pretty
    )]
    pub log: LogFormat,
}

impl Settings {
    /// Open the configured database with foreign keys on and migrations applied
    pub fn open(&self) -> Result<Connection, Box<dyn std::error::Error>> {
        if let Some(parent) = self.db.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Ok(relmat_store::db::open(&self.db)?)
    }
}
