//! Command Executor
//!
//! Takes one argument vector, finds the command, checks it and runs it
//! against the store, writing the reply into a [`ReplyBuffer`].
//!
//! ## Supported Commands
//!
//! - `SET key value` - Set a key
//! - `GET key` - Get a key's value
//! - `DEL key` - Delete a key, replying `:1` if it existed
//! - `MSET key value [key value ...]` - Set several keys in one atomic batch
//! - `MGET key [key ...]` - Get several keys
//! - `FLUSHDB` - Remove every key
//! - `QUIT` - Close the connection
//! - `KEYS pattern` - Every key matching a glob pattern
//! - `SCAN cursor [MATCH pattern] [COUNT count]` - Page through matching keys
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     CommandExecutor                         │
//! │                                                             │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐      │
//! │  │   lookup    │───>│ arity and   │───>│  handler    │      │
//! │  │ (COMMANDS)  │    │ read-only   │    │   cmd_*     │      │
//! │  └─────────────┘    └─────────────┘    └─────────────┘      │
//! │                                               │             │
//! │                                               ▼             │
//! │                                        dyn Store            │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Client mistakes (unknown command, wrong arity, bad SCAN options, writes
//! to a read-only server) become error replies. A failing store is
//! different: whatever the command had written is rolled back and the
//! [`StoreError`] is returned, leaving the caller to decide how to report it.

use crate::commands::error::CommandError;
use crate::commands::scan::{self, ScanMode, DEFAULT_COUNT};
use crate::pattern::GlobPattern;
use crate::protocol::ReplyBuffer;
use crate::storage::{Store, StoreError, WriteOptions};
use bytes::Bytes;
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::{debug, trace};

/// Behaviour switches fixed at startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecutorConfig {
    /// Reject every command that would modify the store
    pub read_only: bool,
    /// Let the store buffer writes instead of waiting for persistence
    pub no_sync: bool,
}

impl ExecutorConfig {
    /// Durability for every mutating store call.
    pub fn write_options(&self) -> WriteOptions {
        WriteOptions {
            sync: !self.no_sync,
        }
    }
}

/// What the connection should do after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Keep reading commands.
    Continue,
    /// Flush the reply, then close this connection.
    Close,
}

/// Accepted argument counts, command name included.
#[derive(Debug, Clone, Copy)]
enum Arity {
    Exact(usize),
    AtLeast(usize),
    /// The name followed by one or more key/value pairs
    Pairs,
    Any,
}

impl Arity {
    fn admits(self, argc: usize) -> bool {
        match self {
            Arity::Exact(n) => argc == n,
            Arity::AtLeast(n) => argc >= n,
            Arity::Pairs => argc >= 3 && argc % 2 == 1,
            Arity::Any => true,
        }
    }
}

type Handler = fn(&CommandExecutor, &[Bytes], &mut ReplyBuffer) -> Result<Flow, CommandError>;

struct CommandSpec {
    /// Lowercase name, also used in arity errors
    name: &'static str,
    arity: Arity,
    mutates: bool,
    handler: Handler,
}

/// The command table. Must stay sorted by name.
static COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        name: "del",
        arity: Arity::Exact(2),
        mutates: true,
        handler: CommandExecutor::cmd_del,
    },
    CommandSpec {
        name: "flushdb",
        arity: Arity::Exact(1),
        mutates: true,
        handler: CommandExecutor::cmd_flushdb,
    },
    CommandSpec {
        name: "get",
        arity: Arity::Exact(2),
        mutates: false,
        handler: CommandExecutor::cmd_get,
    },
    CommandSpec {
        name: "keys",
        arity: Arity::Exact(2),
        mutates: false,
        handler: CommandExecutor::cmd_keys,
    },
    CommandSpec {
        name: "mget",
        arity: Arity::AtLeast(2),
        mutates: false,
        handler: CommandExecutor::cmd_mget,
    },
    CommandSpec {
        name: "mset",
        arity: Arity::Pairs,
        mutates: true,
        handler: CommandExecutor::cmd_mset,
    },
    CommandSpec {
        name: "quit",
        arity: Arity::Any,
        mutates: false,
        handler: CommandExecutor::cmd_quit,
    },
    CommandSpec {
        name: "scan",
        arity: Arity::AtLeast(2),
        mutates: false,
        handler: CommandExecutor::cmd_scan,
    },
    CommandSpec {
        name: "set",
        arity: Arity::Exact(3),
        mutates: true,
        handler: CommandExecutor::cmd_set,
    },
];

/// Compares byte strings with ASCII letters folded to lowercase.
fn cmp_folded(a: &[u8], b: &[u8]) -> Ordering {
    a.iter()
        .map(u8::to_ascii_lowercase)
        .cmp(b.iter().map(u8::to_ascii_lowercase))
}

fn eq_folded(a: &[u8], b: &[u8]) -> bool {
    a.eq_ignore_ascii_case(b)
}

fn lookup(name: &[u8]) -> Option<&'static CommandSpec> {
    COMMANDS
        .binary_search_by(|spec| cmp_folded(spec.name.as_bytes(), name))
        .ok()
        .map(|i| &COMMANDS[i])
}

/// Parses a non-negative decimal integer.
fn parse_u64(arg: &[u8]) -> Option<u64> {
    if arg.is_empty() || !arg.iter().all(u8::is_ascii_digit) {
        return None;
    }
    std::str::from_utf8(arg).ok()?.parse().ok()
}

/// Executes commands against a shared store.
#[derive(Clone)]
pub struct CommandExecutor {
    store: Arc<dyn Store>,
    config: ExecutorConfig,
}

impl CommandExecutor {
    /// Creates an executor over `store`.
    pub fn new(store: Arc<dyn Store>, config: ExecutorConfig) -> Self {
        Self { store, config }
    }

    /// Executes one command, appending exactly one reply to `out`.
    ///
    /// # Returns
    ///
    /// * `Ok(Flow)` - A reply (possibly an error reply) was written
    /// * `Err(StoreError)` - The store failed; nothing was appended
    pub fn execute(&self, args: &[Bytes], out: &mut ReplyBuffer) -> Result<Flow, StoreError> {
        let mark = out.mark();
        match self.dispatch(args, out) {
            Ok(flow) => Ok(flow),
            Err(CommandError::Store(e)) => {
                out.truncate(mark);
                Err(e)
            }
            Err(e) => {
                out.truncate(mark);
                out.write_error(&e.to_string());
                Ok(Flow::Continue)
            }
        }
    }

    fn dispatch(&self, args: &[Bytes], out: &mut ReplyBuffer) -> Result<Flow, CommandError> {
        let name = args.first().ok_or(CommandError::EmptyCommand)?;
        let spec = lookup(name).ok_or_else(|| CommandError::unknown(name))?;

        if !spec.arity.admits(args.len()) {
            return Err(CommandError::WrongArity(spec.name));
        }
        if spec.mutates && self.config.read_only {
            debug!(command = spec.name, "Rejected write on read-only server");
            return Err(CommandError::ReadOnly);
        }

        trace!(command = spec.name, argc = args.len(), "Executing");
        (spec.handler)(self, args, out)
    }

    // ========================================================================
    // Scalar and batch commands
    // ========================================================================

    /// SET key value
    fn cmd_set(&self, args: &[Bytes], out: &mut ReplyBuffer) -> Result<Flow, CommandError> {
        self.store
            .put(&args[1], &args[2], self.config.write_options())?;
        out.write_ok();
        Ok(Flow::Continue)
    }

    /// GET key
    fn cmd_get(&self, args: &[Bytes], out: &mut ReplyBuffer) -> Result<Flow, CommandError> {
        match self.store.get(&args[1])? {
            Some(value) => out.write_bulk(&value),
            None => out.write_null(),
        }
        Ok(Flow::Continue)
    }

    /// DEL key
    fn cmd_del(&self, args: &[Bytes], out: &mut ReplyBuffer) -> Result<Flow, CommandError> {
        let key = &args[1];
        if self.store.get(key)?.is_none() {
            out.write_integer(0);
            return Ok(Flow::Continue);
        }
        self.store.delete(key, self.config.write_options())?;
        out.write_integer(1);
        Ok(Flow::Continue)
    }

    /// MSET key value [key value ...]
    fn cmd_mset(&self, args: &[Bytes], out: &mut ReplyBuffer) -> Result<Flow, CommandError> {
        let puts: Vec<(Bytes, Bytes)> = args[1..]
            .chunks_exact(2)
            .map(|pair| (pair[0].clone(), pair[1].clone()))
            .collect();
        self.store
            .batch_write(&puts, self.config.write_options())?;
        out.write_ok();
        Ok(Flow::Continue)
    }

    /// MGET key [key ...]
    fn cmd_mget(&self, args: &[Bytes], out: &mut ReplyBuffer) -> Result<Flow, CommandError> {
        let values = self
            .store
            .multi_get(&args[1..])
            .into_iter()
            .collect::<Result<Vec<_>, _>>()?;

        out.write_array_len(values.len());
        for value in values {
            match value {
                Some(v) => out.write_bulk(&v),
                None => out.write_null(),
            }
        }
        Ok(Flow::Continue)
    }

    /// FLUSHDB
    fn cmd_flushdb(&self, _args: &[Bytes], out: &mut ReplyBuffer) -> Result<Flow, CommandError> {
        self.store.clear_all(self.config.write_options())?;
        debug!("Keyspace flushed");
        out.write_ok();
        Ok(Flow::Continue)
    }

    /// QUIT
    fn cmd_quit(&self, _args: &[Bytes], out: &mut ReplyBuffer) -> Result<Flow, CommandError> {
        out.write_ok();
        Ok(Flow::Close)
    }

    // ========================================================================
    // Key enumeration
    // ========================================================================

    /// KEYS pattern
    fn cmd_keys(&self, args: &[Bytes], out: &mut ReplyBuffer) -> Result<Flow, CommandError> {
        let pattern = GlobPattern::new(args[1].clone());
        scan::write_scan_reply(self.store.as_ref(), &pattern, 0, ScanMode::Keys, out)?;
        Ok(Flow::Continue)
    }

    /// SCAN cursor [MATCH pattern] [COUNT count]
    fn cmd_scan(&self, args: &[Bytes], out: &mut ReplyBuffer) -> Result<Flow, CommandError> {
        let cursor = parse_u64(&args[1]).ok_or(CommandError::InvalidCursor)?;

        let mut pattern = GlobPattern::new(Bytes::from_static(b"*"));
        let mut count = DEFAULT_COUNT;

        let mut options = args[2..].iter();
        while let Some(option) = options.next() {
            let value = options.next().ok_or(CommandError::Syntax)?;
            if eq_folded(option, b"match") {
                pattern = GlobPattern::new(value.clone());
            } else if eq_folded(option, b"count") {
                count = parse_u64(value)
                    .and_then(|n| usize::try_from(n).ok())
                    .ok_or(CommandError::InvalidCount)?;
                if count == 0 {
                    return Err(CommandError::Syntax);
                }
            } else {
                return Err(CommandError::Syntax);
            }
        }

        scan::write_scan_reply(
            self.store.as_ref(),
            &pattern,
            cursor,
            ScanMode::Scan { count },
            out,
        )?;
        Ok(Flow::Continue)
    }
}

impl std::fmt::Debug for CommandExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandExecutor")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::FaultyStore;
    use crate::storage::MemoryStore;

    fn create_executor() -> (CommandExecutor, Arc<MemoryStore>) {
        create_executor_with(ExecutorConfig::default())
    }

    fn create_executor_with(config: ExecutorConfig) -> (CommandExecutor, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (CommandExecutor::new(store.clone(), config), store)
    }

    fn make_command(args: &[&str]) -> Vec<Bytes> {
        args.iter().map(|s| Bytes::from(s.to_string())).collect()
    }

    /// Runs one command and returns the raw reply.
    fn run(executor: &CommandExecutor, args: &[&str]) -> Vec<u8> {
        let mut out = ReplyBuffer::new();
        let flow = executor.execute(&make_command(args), &mut out).unwrap();
        assert_eq!(flow, Flow::Continue);
        out.as_bytes().to_vec()
    }

    #[test]
    fn test_command_table_is_sorted() {
        for pair in COMMANDS.windows(2) {
            assert_eq!(
                cmp_folded(pair[0].name.as_bytes(), pair[1].name.as_bytes()),
                Ordering::Less,
                "{} must sort before {}",
                pair[0].name,
                pair[1].name
            );
        }
        for spec in COMMANDS {
            assert_eq!(spec.name, spec.name.to_ascii_lowercase());
        }
    }

    #[test]
    fn test_lookup_folds_ascii_case_only() {
        assert_eq!(lookup(b"GET").map(|s| s.name), Some("get"));
        assert_eq!(lookup(b"gEt").map(|s| s.name), Some("get"));
        assert_eq!(lookup(b"FlushDB").map(|s| s.name), Some("flushdb"));
        // Only A-Z fold. 0xc5 and 0xe5 differ by 0x20 but are not letters.
        assert!(lookup(b"g\xc5t").is_none());
        assert!(lookup(b"get\x00").is_none());
        assert!(lookup(b"ge").is_none());
    }

    #[test]
    fn test_set_get() {
        let (executor, _) = create_executor();
        assert_eq!(run(&executor, &["SET", "key", "value"]), b"+OK\r\n");
        assert_eq!(run(&executor, &["GET", "key"]), b"$5\r\nvalue\r\n");
    }

    #[test]
    fn test_set_get_binary_value() {
        let (executor, _) = create_executor();
        let value = Bytes::from_static(b"\x00\xff\r\nbin");
        let mut out = ReplyBuffer::new();
        let set = vec![Bytes::from("SET"), Bytes::from("k"), value.clone()];
        executor.execute(&set, &mut out).unwrap();
        executor
            .execute(&[Bytes::from("GET"), Bytes::from("k")], &mut out)
            .unwrap();
        assert_eq!(out.as_bytes(), b"+OK\r\n$7\r\n\x00\xff\r\nbin\r\n");
    }

    #[test]
    fn test_get_nonexistent() {
        let (executor, _) = create_executor();
        assert_eq!(run(&executor, &["GET", "nonexistent"]), b"$-1\r\n");
    }

    #[test]
    fn test_del() {
        let (executor, store) = create_executor();
        run(&executor, &["SET", "key1", "value1"]);

        assert_eq!(run(&executor, &["DEL", "key1"]), b":1\r\n");
        assert_eq!(store.get(b"key1").unwrap(), None);
        assert_eq!(run(&executor, &["DEL", "key1"]), b":0\r\n");
    }

    #[test]
    fn test_del_absent_key_does_not_write() {
        let (executor, store) = create_executor();
        let before = store.write_count();
        run(&executor, &["DEL", "missing"]);
        assert_eq!(store.write_count(), before);
    }

    #[test]
    fn test_mset_mget() {
        let (executor, _) = create_executor();
        assert_eq!(
            run(&executor, &["MSET", "k1", "v1", "k2", "v2"]),
            b"+OK\r\n"
        );
        assert_eq!(
            run(&executor, &["MGET", "k1", "missing", "k2"]),
            b"*3\r\n$2\r\nv1\r\n$-1\r\n$2\r\nv2\r\n"
        );
    }

    #[test]
    fn test_mset_later_pair_wins() {
        let (executor, _) = create_executor();
        run(&executor, &["MSET", "k", "first", "k", "second"]);
        assert_eq!(run(&executor, &["GET", "k"]), b"$6\r\nsecond\r\n");
    }

    #[test]
    fn test_mset_is_atomic_when_batch_fails() {
        let store = Arc::new(FaultyStore::new());
        store.fail_batches();
        let executor = CommandExecutor::new(store.clone(), ExecutorConfig::default());

        let mut out = ReplyBuffer::new();
        let result = executor.execute(&make_command(&["MSET", "k1", "v1", "k2", "v2"]), &mut out);

        assert!(result.is_err());
        assert!(out.is_empty());
        assert!(store.inner().is_empty());
    }

    #[test]
    fn test_mget_fails_fast() {
        let store = Arc::new(FaultyStore::new());
        store.put(b"k1", b"v1", WriteOptions::relaxed()).unwrap();
        store.fail_reads();
        let executor = CommandExecutor::new(store, ExecutorConfig::default());

        let mut out = ReplyBuffer::new();
        out.write_ok();
        let result = executor.execute(&make_command(&["MGET", "k1", "k2"]), &mut out);

        assert!(matches!(result, Err(StoreError::Storage(_))));
        assert_eq!(out.as_bytes(), b"+OK\r\n");
    }

    #[test]
    fn test_flushdb() {
        let (executor, store) = create_executor();
        run(&executor, &["MSET", "a", "1", "b", "2"]);
        assert_eq!(run(&executor, &["FLUSHDB"]), b"+OK\r\n");
        assert!(store.is_empty());
        assert_eq!(run(&executor, &["KEYS", "*"]), b"*0\r\n");
    }

    #[test]
    fn test_quit_closes() {
        let (executor, _) = create_executor();
        let mut out = ReplyBuffer::new();
        let flow = executor
            .execute(&make_command(&["quit", "extra", "args"]), &mut out)
            .unwrap();
        assert_eq!(flow, Flow::Close);
        assert_eq!(out.as_bytes(), b"+OK\r\n");
    }

    #[test]
    fn test_wrong_arity_never_mutates() {
        let (executor, store) = create_executor();
        let cases: &[(&[&str], &str)] = &[
            (&["SET", "k"], "set"),
            (&["SET", "k", "v", "x"], "set"),
            (&["GET"], "get"),
            (&["DEL"], "del"),
            (&["DEL", "a", "b"], "del"),
            (&["MSET"], "mset"),
            (&["MSET", "k"], "mset"),
            (&["MSET", "k", "v", "k2"], "mset"),
            (&["MGET"], "mget"),
            (&["FLUSHDB", "now"], "flushdb"),
            (&["KEYS"], "keys"),
            (&["SCAN"], "scan"),
        ];
        for (args, name) in cases {
            let reply = run(&executor, args);
            let expected = format!("-ERR wrong number of arguments for '{}' command\r\n", name);
            assert_eq!(reply, expected.as_bytes(), "{:?}", args);
        }
        assert_eq!(store.write_count(), 0);
    }

    #[test]
    fn test_unknown_command() {
        let (executor, _) = create_executor();
        assert_eq!(
            run(&executor, &["UNKNOWNCMD"]),
            b"-ERR unknown command 'UNKNOWNCMD'\r\n"
        );
    }

    #[test]
    fn test_empty_command() {
        let (executor, _) = create_executor();
        let mut out = ReplyBuffer::new();
        executor.execute(&[], &mut out).unwrap();
        assert_eq!(out.as_bytes(), b"-ERR empty command\r\n");
    }

    #[test]
    fn test_read_only_rejects_writes() {
        let config = ExecutorConfig {
            read_only: true,
            no_sync: false,
        };
        let store = Arc::new(MemoryStore::new());
        store.put(b"user:1", b"ariz", WriteOptions::relaxed()).unwrap();
        let before = store.write_count();
        let executor = CommandExecutor::new(store.clone(), config);

        for args in [
            &["SET", "k", "v"][..],
            &["MSET", "k", "v"],
            &["DEL", "user:1"],
            &["FLUSHDB"],
        ] {
            assert_eq!(
                run(&executor, args),
                b"-READONLY You can't write against a read only replica\r\n"
            );
        }
        assert_eq!(store.write_count(), before);

        assert_eq!(run(&executor, &["GET", "user:1"]), b"$4\r\nariz\r\n");
        assert_eq!(run(&executor, &["MGET", "user:1"]), b"*1\r\n$4\r\nariz\r\n");
        assert_eq!(run(&executor, &["KEYS", "*"]), b"*1\r\n$6\r\nuser:1\r\n");
        assert_eq!(
            run(&executor, &["SCAN", "0"]),
            b"*2\r\n$1\r\n0\r\n*1\r\n$6\r\nuser:1\r\n"
        );
    }

    #[test]
    fn test_arity_checked_before_read_only() {
        let (executor, _) = create_executor_with(ExecutorConfig {
            read_only: true,
            no_sync: true,
        });
        assert_eq!(
            run(&executor, &["SET", "k"]),
            b"-ERR wrong number of arguments for 'set' command\r\n"
        );
    }

    #[test]
    fn test_write_options_follow_no_sync() {
        assert!(ExecutorConfig::default().write_options().sync);
        let relaxed = ExecutorConfig {
            read_only: false,
            no_sync: true,
        };
        assert!(!relaxed.write_options().sync);
    }

    fn seed_users(executor: &CommandExecutor) {
        run(executor, &["SET", "a", "x"]);
        for i in 1..=5 {
            run(executor, &["SET", &format!("user:{}", i), "x"]);
        }
        run(executor, &["SET", "zeta", "x"]);
    }

    #[test]
    fn test_scan_pagination() {
        let (executor, _) = create_executor();
        seed_users(&executor);

        assert_eq!(
            run(&executor, &["SCAN", "0", "MATCH", "user:*", "COUNT", "2"]),
            b"*2\r\n$1\r\n2\r\n*2\r\n$6\r\nuser:1\r\n$6\r\nuser:2\r\n"
        );
        assert_eq!(
            run(&executor, &["SCAN", "2", "MATCH", "user:*", "COUNT", "2"]),
            b"*2\r\n$1\r\n4\r\n*2\r\n$6\r\nuser:3\r\n$6\r\nuser:4\r\n"
        );
        assert_eq!(
            run(&executor, &["SCAN", "4", "MATCH", "user:*", "COUNT", "2"]),
            b"*2\r\n$1\r\n0\r\n*1\r\n$6\r\nuser:5\r\n"
        );
    }

    #[test]
    fn test_keys_returns_store_order() {
        let (executor, _) = create_executor();
        seed_users(&executor);
        assert_eq!(
            run(&executor, &["KEYS", "user:*"]),
            b"*5\r\n$6\r\nuser:1\r\n$6\r\nuser:2\r\n$6\r\nuser:3\r\n$6\r\nuser:4\r\n$6\r\nuser:5\r\n"
        );
    }

    #[test]
    fn test_keys_pattern_ignores_case() {
        let (executor, _) = create_executor();
        run(&executor, &["SET", "user:1", "x"]);
        assert_eq!(run(&executor, &["KEYS", "*SER:1"]), b"*1\r\n$6\r\nuser:1\r\n");
        assert_eq!(run(&executor, &["KEYS", "USER:*"]), b"*1\r\n$6\r\nuser:1\r\n");
        assert_eq!(
            run(&executor, &["SCAN", "0", "MATCH", "User:[0-9]"]),
            b"*2\r\n$1\r\n0\r\n*1\r\n$6\r\nuser:1\r\n"
        );
    }

    #[test]
    fn test_scan_empty_store() {
        let (executor, _) = create_executor();
        assert_eq!(run(&executor, &["SCAN", "0"]), b"*2\r\n$1\r\n0\r\n*0\r\n");
    }

    #[test]
    fn test_scan_default_count_is_ten() {
        let (executor, _) = create_executor();
        for i in 0..15 {
            run(&executor, &["SET", &format!("k{:02}", i), "v"]);
        }
        let reply = run(&executor, &["SCAN", "0"]);
        assert!(reply.starts_with(b"*2\r\n$2\r\n10\r\n*10\r\n"));
    }

    #[test]
    fn test_scan_options() {
        let (executor, _) = create_executor();
        seed_users(&executor);

        // Case-insensitive, repeatable, last one wins
        assert_eq!(
            run(&executor, &["scan", "0", "match", "a*", "Match", "z*", "count", "1", "COUNT", "5"]),
            b"*2\r\n$1\r\n0\r\n*1\r\n$4\r\nzeta\r\n"
        );
    }

    #[test]
    fn test_scan_option_errors() {
        let (executor, _) = create_executor();
        let cases: &[(&[&str], &[u8])] = &[
            (&["SCAN", "x"], b"-ERR invalid cursor\r\n"),
            (&["SCAN", "-1"], b"-ERR invalid cursor\r\n"),
            (&["SCAN", "0", "MATCH"], b"-ERR syntax error\r\n"),
            (&["SCAN", "0", "COUNT"], b"-ERR syntax error\r\n"),
            (&["SCAN", "0", "LIMIT", "5"], b"-ERR syntax error\r\n"),
            (&["SCAN", "0", "COUNT", "0"], b"-ERR syntax error\r\n"),
            (
                &["SCAN", "0", "COUNT", "ten"],
                b"-ERR value is not an integer or out of range\r\n",
            ),
            (
                &["SCAN", "0", "COUNT", "-3"],
                b"-ERR value is not an integer or out of range\r\n",
            ),
        ];
        for (args, expected) in cases {
            assert_eq!(run(&executor, args), *expected, "{:?}", args);
        }
    }

    #[test]
    fn test_error_reply_keeps_earlier_output() {
        let (executor, _) = create_executor();
        let mut out = ReplyBuffer::new();
        executor
            .execute(&make_command(&["SET", "k", "v"]), &mut out)
            .unwrap();
        executor
            .execute(&make_command(&["SCAN", "0", "COUNT", "0"]), &mut out)
            .unwrap();
        assert_eq!(out.as_bytes(), b"+OK\r\n-ERR syntax error\r\n");
    }

    #[test]
    fn test_scan_store_failure_leaves_no_partial_reply() {
        let store = Arc::new(FaultyStore::new());
        for i in 0..10 {
            store
                .put(format!("k{}", i).as_bytes(), b"v", WriteOptions::relaxed())
                .unwrap();
        }
        store.fail_iteration_after(4);
        let executor = CommandExecutor::new(store, ExecutorConfig::default());

        let mut out = ReplyBuffer::new();
        let result = executor.execute(&make_command(&["KEYS", "*"]), &mut out);
        assert!(result.is_err());
        assert!(out.is_empty());
    }
}
