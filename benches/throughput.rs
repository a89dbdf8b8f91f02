//! Throughput Benchmark for keyspan
//!
//! Measures the command executor, the scan engine and the store adapters
//! under various workloads.

use bytes::Bytes;
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use keyspan::commands::{CommandExecutor, ExecutorConfig};
use keyspan::pattern::glob_match;
use keyspan::protocol::ReplyBuffer;
use keyspan::storage::{MemoryStore, RedbStore, Store, WriteOptions};
use std::sync::Arc;
use std::time::Duration;

fn command(args: &[&str]) -> Vec<Bytes> {
    args.iter().map(|s| Bytes::from(s.to_string())).collect()
}

fn memory_executor() -> (CommandExecutor, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let executor = CommandExecutor::new(store.clone(), ExecutorConfig::default());
    (executor, store)
}

/// Benchmark SET and GET through the executor
fn bench_executor(c: &mut Criterion) {
    let (executor, store) = memory_executor();
    for i in 0..100_000 {
        store
            .put(
                format!("key:{}", i).as_bytes(),
                format!("value:{}", i).as_bytes(),
                WriteOptions::relaxed(),
            )
            .unwrap();
    }

    let mut group = c.benchmark_group("executor");
    group.throughput(Throughput::Elements(1));

    group.bench_function("set_small", |b| {
        let mut out = ReplyBuffer::new();
        let mut i = 0u64;
        b.iter(|| {
            let args = command(&["SET", &format!("new:{}", i), "small_value"]);
            executor.execute(&args, &mut out).unwrap();
            out.take();
            i += 1;
        });
    });

    group.bench_function("get_existing", |b| {
        let mut out = ReplyBuffer::new();
        let mut i = 0u64;
        b.iter(|| {
            let args = command(&["GET", &format!("key:{}", i % 100_000)]);
            executor.execute(&args, &mut out).unwrap();
            black_box(out.take());
            i += 1;
        });
    });

    group.bench_function("mget_10", |b| {
        let mut out = ReplyBuffer::new();
        let mut args = vec![Bytes::from("MGET")];
        args.extend((0..10).map(|i| Bytes::from(format!("key:{}", i * 997))));
        b.iter(|| {
            executor.execute(&args, &mut out).unwrap();
            black_box(out.take());
        });
    });

    group.finish();
}

/// Benchmark glob matching on its own
fn bench_glob(c: &mut Criterion) {
    let mut group = c.benchmark_group("glob");
    group.throughput(Throughput::Elements(1));

    group.bench_function("prefix_star", |b| {
        b.iter(|| black_box(glob_match(b"user:*", b"user:12345:profile")));
    });

    group.bench_function("multi_star_backtrack", |b| {
        let text = "a".repeat(64) + "b";
        b.iter(|| black_box(glob_match(b"*a*a*a*a*c", text.as_bytes())));
    });

    group.bench_function("class_and_escape", |b| {
        b.iter(|| black_box(glob_match(b"user:[0-9]*\\*", b"user:7:name*")));
    });

    group.finish();
}

/// Benchmark KEYS and SCAN over a mixed keyspace
fn bench_scan(c: &mut Criterion) {
    let (executor, store) = memory_executor();
    for i in 0..1_000 {
        for prefix in ["user", "session", "cache"] {
            store
                .put(
                    format!("{}:{}", prefix, i).as_bytes(),
                    b"data",
                    WriteOptions::relaxed(),
                )
                .unwrap();
        }
    }

    let mut group = c.benchmark_group("scan");

    let cases = [
        ("keys_prefix", command(&["KEYS", "user:*"])),
        ("keys_leading_star", command(&["KEYS", "*:999"])),
        ("keys_all", command(&["KEYS", "*"])),
        ("scan_prefix_first_page", command(&["SCAN", "0", "MATCH", "user:*"])),
        (
            "scan_prefix_deep_page",
            command(&["SCAN", "900", "MATCH", "user:*", "COUNT", "10"]),
        ),
    ];
    for (name, args) in cases {
        group.bench_function(name, |b| {
            let mut out = ReplyBuffer::new();
            b.iter(|| {
                executor.execute(&args, &mut out).unwrap();
                black_box(out.take());
            });
        });
    }

    group.finish();
}

/// Benchmark redb writes with and without waiting for persistence
fn bench_redb(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let store = RedbStore::open(&dir.path().join("bench.redb")).unwrap();

    let mut group = c.benchmark_group("redb");
    group.throughput(Throughput::Elements(1));
    group.measurement_time(Duration::from_secs(10));

    for (name, opts) in [
        ("put_durable", WriteOptions::durable()),
        ("put_relaxed", WriteOptions::relaxed()),
    ] {
        group.bench_function(name, |b| {
            let mut i = 0u64;
            b.iter(|| {
                store
                    .put(format!("key:{}", i).as_bytes(), b"value", opts)
                    .unwrap();
                i += 1;
            });
        });
    }

    group.bench_function("batch_100_relaxed", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let puts: Vec<(Bytes, Bytes)> = (0..100)
                .map(|j| {
                    (
                        Bytes::from(format!("batch:{}:{}", i, j)),
                        Bytes::from_static(b"value"),
                    )
                })
                .collect();
            store.batch_write(&puts, WriteOptions::relaxed()).unwrap();
            i += 1;
        });
    });

    group.finish();
}

/// Benchmark concurrent access through a shared executor
fn bench_concurrent(c: &mut Criterion) {
    use std::thread;

    let mut group = c.benchmark_group("concurrent");
    group.measurement_time(Duration::from_secs(10));

    group.bench_function("4_threads_mixed", |b| {
        b.iter(|| {
            let (executor, store) = memory_executor();
            let executor = Arc::new(executor);
            let handles: Vec<_> = (0..4)
                .map(|t| {
                    let executor = Arc::clone(&executor);
                    thread::spawn(move || {
                        let mut out = ReplyBuffer::new();
                        for i in 0..10_000 {
                            let key = format!("key:{}:{}", t, i);
                            executor
                                .execute(&command(&["SET", &key, "value"]), &mut out)
                                .unwrap();
                            executor
                                .execute(&command(&["GET", &key]), &mut out)
                                .unwrap();
                            out.take();
                        }
                    })
                })
                .collect();

            for handle in handles {
                handle.join().unwrap();
            }

            black_box(store.len());
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_executor,
    bench_glob,
    bench_scan,
    bench_redb,
    bench_concurrent,
);

criterion_main!(benches);
