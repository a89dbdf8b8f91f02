//! Connection Handler Module
//!
//! This module handles individual client connections to keyspan.
//! Each client gets its own handler task that runs in a loop,
//! reading commands and sending responses.
//!
//! ## Connection Lifecycle
//!
//! ```text
//! 1. Client connects (TCP handshake)
//!        │
//!        ▼
//! 2. ConnectionHandler spawned
//!        │
//!        ▼
//! 3. ┌──────────────────────────────────┐
//!    │      Main Loop                   │
//!    │                                  │
//!    │  Read bytes from socket          │
//!    │              │                   │
//!    │              ▼                   │
//!    │  Parse argument vector           │
//!    │              │                   │
//!    │              ▼                   │
//!    │  Execute on the blocking pool    │
//!    │              │                   │
//!    │              ▼                   │
//!    │  Flush reply                     │
//!    │              │                   │
//!    │              ▼                   │
//!    │         [Loop back]              │
//!    └──────────────────────────────────┘
//!        │
//!        ▼
//! 4. QUIT / client disconnects / protocol error
//!        │
//!        ▼
//! 5. Handler task ends
//! ```
//!
//! ## Blocking Work
//!
//! Store calls block: a durable write waits for an fsync and a KEYS walk
//! can visit the whole keyspace. Commands therefore run through
//! `tokio::task::spawn_blocking`, with the reply buffer moved into the task
//! and handed back with the result.
//!
//! ## Failures
//!
//! - A malformed request gets `-ERR Protocol error: ...` and the connection
//!   is closed, since the stream cannot be resynchronized.
//! - A store failure is logged and answered with `-ERR internal store error`.
//!   The connection stays open.

use crate::commands::{CommandExecutor, Flow};
use crate::protocol::{Args, ParseError, ReplyBuffer, RequestParser};
use bytes::BytesMut;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufWriter};
use tokio::net::TcpStream;
use tracing::{debug, error, info, trace, warn};

/// Maximum amount of unparsed input held for one client (1 GB)
const MAX_BUFFER_SIZE: usize = 1024 * 1024 * 1024;

/// Initial buffer capacity
const INITIAL_BUFFER_SIZE: usize = 4096;

/// Reply sent in place of a command whose store call failed
const STORE_FAILURE_REPLY: &str = "ERR internal store error";

/// Statistics for connection handling
#[derive(Debug, Default)]
pub struct ConnectionStats {
    /// Total number of connections accepted
    pub connections_accepted: AtomicU64,
    /// Currently active connections
    pub active_connections: AtomicU64,
    /// Total commands processed
    pub commands_processed: AtomicU64,
    /// Commands that failed in the store
    pub store_errors: AtomicU64,
    /// Total bytes read
    pub bytes_read: AtomicU64,
    /// Total bytes written
    pub bytes_written: AtomicU64,
}

impl ConnectionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connection_opened(&self) {
        self.connections_accepted.fetch_add(1, Ordering::Relaxed);
        self.active_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn connection_closed(&self) {
        self.active_connections.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn command_processed(&self) {
        self.commands_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn store_error(&self) {
        self.store_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn bytes_read(&self, count: usize) {
        self.bytes_read.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn bytes_written(&self, count: usize) {
        self.bytes_written
            .fetch_add(count as u64, Ordering::Relaxed);
    }
}

/// Handles a single client connection.
pub struct ConnectionHandler {
    /// The TCP stream for this connection
    stream: BufWriter<TcpStream>,

    /// Client's address (for logging)
    addr: SocketAddr,

    /// Buffer for incoming data
    buffer: BytesMut,

    /// Replies waiting to be flushed
    reply: ReplyBuffer,

    /// The command executor (shared across connections)
    executor: Arc<CommandExecutor>,

    parser: RequestParser,

    /// Connection statistics (shared)
    stats: Arc<ConnectionStats>,
}

impl ConnectionHandler {
    /// Creates a new connection handler.
    ///
    /// # Arguments
    ///
    /// * `stream` - The TCP stream for this connection
    /// * `addr` - The client's socket address
    /// * `executor` - The executor shared by all connections
    /// * `stats` - Shared connection statistics
    pub fn new(
        stream: TcpStream,
        addr: SocketAddr,
        executor: Arc<CommandExecutor>,
        stats: Arc<ConnectionStats>,
    ) -> Self {
        stats.connection_opened();

        Self {
            stream: BufWriter::new(stream),
            addr,
            buffer: BytesMut::with_capacity(INITIAL_BUFFER_SIZE),
            reply: ReplyBuffer::with_capacity(INITIAL_BUFFER_SIZE),
            executor,
            parser: RequestParser::new(),
            stats,
        }
    }

    /// Runs the main connection loop.
    ///
    /// Returns `Ok(())` when the client sent QUIT.
    pub async fn run(mut self) -> Result<(), ConnectionError> {
        info!(client = %self.addr, "Client connected");

        let result = self.main_loop().await;

        match &result {
            Ok(()) => info!(client = %self.addr, "Client quit"),
            Err(e) => match e {
                ConnectionError::ClientDisconnected => {
                    debug!(client = %self.addr, "Client disconnected")
                }
                ConnectionError::IoError(io_err)
                    if io_err.kind() == std::io::ErrorKind::ConnectionReset =>
                {
                    debug!(client = %self.addr, "Connection reset by client")
                }
                _ => warn!(client = %self.addr, error = %e, "Connection error"),
            },
        }

        debug!(
            client = %self.addr,
            commands = self.parser.parsed(),
            "Connection closed"
        );
        self.stats.connection_closed();
        result
    }

    /// The main read-execute-respond loop.
    async fn main_loop(&mut self) -> Result<(), ConnectionError> {
        loop {
            // Drain every complete command already buffered
            while let Some(args) = self.try_parse_command().await? {
                // Empty requests get no reply
                if args.is_empty() {
                    continue;
                }

                let flow = self.execute(args).await?;
                self.stats.command_processed();

                // Send the reply
                self.send_replies().await?;

                // QUIT: the +OK is already flushed
                if flow == Flow::Close {
                    return Ok(());
                }
            }

            // Need more data - read from the socket
            self.read_more_data().await?;
        }
    }

    /// Attempts to parse a command from the buffer.
    ///
    /// A parse error is reported to the client before it is returned.
    async fn try_parse_command(&mut self) -> Result<Option<Args>, ConnectionError> {
        if self.buffer.is_empty() {
            return Ok(None);
        }

        match self.parser.parse(&self.buffer) {
            Ok(Some((args, consumed))) => {
                // Successfully parsed a command - consume the bytes
                let _ = self.buffer.split_to(consumed);
                trace!(
                    client = %self.addr,
                    consumed = consumed,
                    remaining = self.buffer.len(),
                    "Parsed command"
                );
                Ok(Some(args))
            }
            Ok(None) => {
                // Incomplete data - need to read more
                trace!(
                    client = %self.addr,
                    buffered = self.buffer.len(),
                    "Incomplete command, need more data"
                );
                Ok(None)
            }
            Err(e) => {
                // The stream can't be resynchronized, so report and close
                warn!(client = %self.addr, error = %e, "Parse error");
                self.reply.write_error(&format!("ERR Protocol error: {}", e));
                self.send_replies().await?;
                Err(ConnectionError::ParseError(e))
            }
        }
    }

    /// Runs one command on the blocking pool, appending its reply.
    async fn execute(&mut self, args: Args) -> Result<Flow, ConnectionError> {
        let executor = Arc::clone(&self.executor);
        // The task owns the reply buffer and hands it back
        let mut out = std::mem::take(&mut self.reply);

        let (result, out) = tokio::task::spawn_blocking(move || {
            let result = executor.execute(&args, &mut out);
            (result, out)
        })
        .await?;
        self.reply = out;

        match result {
            Ok(flow) => Ok(flow),
            Err(e) => {
                // Partial output is already gone; the client just sees an error
                error!(client = %self.addr, error = %e, "Store failure");
                self.stats.store_error();
                self.reply.write_error(STORE_FAILURE_REPLY);
                Ok(Flow::Continue)
            }
        }
    }

    /// Reads more data from the socket into the buffer.
    async fn read_more_data(&mut self) -> Result<(), ConnectionError> {
        // Check buffer size limit
        if self.buffer.len() >= MAX_BUFFER_SIZE {
            error!(
                client = %self.addr,
                size = self.buffer.len(),
                "Buffer size limit exceeded"
            );
            return Err(ConnectionError::BufferFull);
        }

        // Ensure we have some capacity
        if self.buffer.capacity() - self.buffer.len() < 1024 {
            self.buffer.reserve(4096);
        }

        // Read data
        let n = self.stream.get_mut().read_buf(&mut self.buffer).await?;

        if n == 0 {
            // Connection closed by client
            if self.buffer.is_empty() {
                return Err(ConnectionError::ClientDisconnected);
            } else {
                // Partial command in buffer
                return Err(ConnectionError::UnexpectedEof);
            }
        }

        self.stats.bytes_read(n);
        trace!(client = %self.addr, bytes = n, "Read data");

        Ok(())
    }

    /// Flushes every pending reply to the client.
    async fn send_replies(&mut self) -> Result<(), ConnectionError> {
        if self.reply.is_empty() {
            return Ok(());
        }
        // Everything queued so far goes out in one write
        let bytes = self.reply.take();
        self.stream.write_all(&bytes).await?;
        self.stream.flush().await?;
        self.stats.bytes_written(bytes.len());
        trace!(
            client = %self.addr,
            bytes = bytes.len(),
            "Sent response"
        );
        Ok(())
    }
}

/// Errors that can occur while handling a connection.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    /// I/O error (network issue)
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Malformed request
    #[error("Parse error: {0}")]
    ParseError(#[from] ParseError),

    /// The blocking task running a command panicked or was cancelled
    #[error("Command task failed: {0}")]
    TaskFailed(#[from] tokio::task::JoinError),

    /// Client disconnected normally
    #[error("Client disconnected")]
    ClientDisconnected,

    /// Unexpected end of stream (partial command)
    #[error("Unexpected end of stream")]
    UnexpectedEof,

    /// Buffer size limit exceeded
    #[error("Buffer size limit exceeded")]
    BufferFull,
}

/// Handles a client connection.
///
/// Creates a [`ConnectionHandler`] and runs it to completion, logging
/// anything more interesting than a normal disconnect.
pub async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    executor: Arc<CommandExecutor>,
    stats: Arc<ConnectionStats>,
) {
    let handler = ConnectionHandler::new(stream, addr, executor, stats);
    if let Err(e) = handler.run().await {
        match e {
            ConnectionError::ClientDisconnected => {}
            ConnectionError::IoError(ref io_err)
                if io_err.kind() == std::io::ErrorKind::ConnectionReset => {}
            _ => {
                debug!(client = %addr, error = %e, "Connection ended with error");
            }
        }
    }
}
