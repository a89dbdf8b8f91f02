//! Server Configuration
//!
//! Command-line options for the `keyspan` binary.

use crate::commands::ExecutorConfig;
use crate::{DEFAULT_HOST, DEFAULT_PORT};
use clap::Parser;
use std::path::PathBuf;

/// Default location of the database file
pub const DEFAULT_DATA_PATH: &str = "keyspan.redb";

/// keyspan - a Redis-compatible key-value server over an ordered store
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct ServerConfig {
    /// Host to bind to
    #[arg(long, default_value = DEFAULT_HOST)]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Database file
    #[arg(long, default_value = DEFAULT_DATA_PATH)]
    pub data: PathBuf,

    /// Keep everything in memory instead of opening the database file
    #[arg(long, conflicts_with = "data")]
    pub in_memory: bool,

    /// Reject every command that modifies data
    #[arg(long)]
    pub read_only: bool,

    /// Do not wait for writes to reach stable storage
    #[arg(long)]
    pub no_sync: bool,
}

impl ServerConfig {
    /// The executor switches selected on the command line.
    pub fn executor_config(&self) -> ExecutorConfig {
        ExecutorConfig {
            read_only: self.read_only,
            no_sync: self.no_sync,
        }
    }

    /// Returns the bind address as a string
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
