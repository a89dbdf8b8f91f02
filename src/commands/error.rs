//! Command Errors
//!
//! Everything a command can fail with. All variants except
//! [`CommandError::Store`] are the client's fault: they are answered with an
//! error reply and the connection carries on. A store failure is handed back
//! to the caller of `execute` instead.

use crate::storage::StoreError;
use thiserror::Error;

/// A failed command. The `Display` text is the RESP error reply.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("ERR empty command")]
    EmptyCommand,

    #[error("ERR unknown command '{0}'")]
    UnknownCommand(String),

    #[error("ERR wrong number of arguments for '{0}' command")]
    WrongArity(&'static str),

    #[error("READONLY You can't write against a read only replica")]
    ReadOnly,

    /// Malformed SCAN options
    #[error("ERR syntax error")]
    Syntax,

    #[error("ERR invalid cursor")]
    InvalidCursor,

    #[error("ERR value is not an integer or out of range")]
    InvalidCount,

    #[error("ERR internal store error: {0}")]
    Store(#[from] StoreError),
}

impl CommandError {
    /// Builds an `UnknownCommand` from raw name bytes.
    pub fn unknown(name: &[u8]) -> Self {
        CommandError::UnknownCommand(String::from_utf8_lossy(name).into_owned())
    }
}
