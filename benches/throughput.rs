//! Throughput Benchmarks
//!
//! Measures the sharded engine, command lookup, the generic connection
//! over the memory and redb backends, and full command-line execution
//! through a driver.

use bytes::Bytes;
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use kvbridge::backends::{MemoryBackend, RedbBackend};
use kvbridge::commands::{command_table, split_command_line, CommandHandler};
use kvbridge::connection::{Connection, InterruptFlag};
use kvbridge::driver::{BackendDriver, Driver, NullSink, Request};
use kvbridge::storage::StorageEngine;
use kvbridge::{Key, LocalConfig, NDbKValue, Value};
use std::sync::Arc;
use std::time::Duration;

fn memory_connection() -> Connection<MemoryBackend> {
    let mut conn = Connection::new(LocalConfig::new("bench"), InterruptFlag::new());
    conn.connect().unwrap();
    conn
}

/// Benchmark the raw engine behind the memory backend
fn bench_engine(c: &mut Criterion) {
    let engine = StorageEngine::new();
    for i in 0..100_000 {
        engine.set(Bytes::from(format!("key:{}", i)), Bytes::from("value"));
    }

    let mut group = c.benchmark_group("engine");
    group.throughput(Throughput::Elements(1));

    group.bench_function("set_1kb", |b| {
        let value = Bytes::from(vec![b'x'; 1024]);
        let mut i = 0u64;
        b.iter(|| {
            engine.set(Bytes::from(format!("big:{}", i % 10_000)), value.clone());
            i += 1;
        });
    });

    group.bench_function("get_existing", |b| {
        let mut i = 0u64;
        b.iter(|| {
            black_box(engine.get(format!("key:{}", i % 100_000).as_bytes()));
            i += 1;
        });
    });

    group.bench_function("expire_existing", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let key = format!("key:{}", i % 100_000);
            black_box(engine.expire(key.as_bytes(), Duration::from_secs(3600)));
            i += 1;
        });
    });

    group.finish();

    let mut group = c.benchmark_group("engine_scan");
    group.measurement_time(Duration::from_secs(10));
    group.bench_function("sorted_keys_100k", |b| {
        b.iter(|| black_box(engine.sorted_keys().len()))
    });
    group.finish();
}

/// Benchmark longest-name command lookup
fn bench_lookup(c: &mut Criterion) {
    let table = command_table::<MemoryBackend>();
    let short = split_command_line("GET key").unwrap();
    let multi = split_command_line("CONFIG GET delimiter").unwrap();
    let unknown = split_command_line("NOPE a b").unwrap();

    let mut group = c.benchmark_group("lookup");
    group.throughput(Throughput::Elements(1));

    group.bench_function("single_word", |b| b.iter(|| black_box(table.find(&short))));
    group.bench_function("multi_word", |b| b.iter(|| black_box(table.find(&multi))));
    group.bench_function("unknown", |b| b.iter(|| black_box(table.find(&unknown))));

    group.bench_function("tokenize", |b| {
        b.iter(|| black_box(split_command_line("SET \"user name\" 'Ariz K' extra")))
    });

    group.finish();
}

/// Benchmark SET / GET through the generic connection
fn bench_memory(c: &mut Criterion) {
    let mut conn = memory_connection();

    let mut group = c.benchmark_group("memory");
    group.throughput(Throughput::Elements(1));

    group.bench_function("set_string", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let item = NDbKValue::new(format!("key:{}", i), Value::string("small_value"));
            black_box(conn.set(item).unwrap());
            i += 1;
        });
    });

    group.bench_function("set_hash", |b| {
        let value = Value::Hash(
            (0..16)
                .map(|f| (Value::string(format!("field{}", f)), Value::Integer(f)))
                .collect(),
        );
        let mut i = 0u64;
        b.iter(|| {
            let item = NDbKValue::new(format!("hash:{}", i % 1_000), value.clone());
            black_box(conn.set(item).unwrap());
            i += 1;
        });
    });

    for i in 0..10_000 {
        conn.set(NDbKValue::new(format!("get:{}", i), Value::Integer(i)))
            .unwrap();
    }

    group.bench_function("get_existing", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let key = Key::from(format!("get:{}", i % 10_000));
            black_box(conn.get(&key).unwrap());
            i += 1;
        });
    });

    group.finish();
}

/// Benchmark SCAN pages over a populated database
fn bench_scan(c: &mut Criterion) {
    let mut conn = memory_connection();
    for i in 0..1_000 {
        conn.set(NDbKValue::new(format!("user:{}", i), Value::Null)).unwrap();
        conn.set(NDbKValue::new(format!("session:{}", i), Value::Null)).unwrap();
    }

    let mut group = c.benchmark_group("scan");

    group.bench_function("first_page", |b| {
        b.iter(|| black_box(conn.scan(0, "user:*", 100).unwrap()))
    });

    group.bench_function("full_scan", |b| {
        b.iter(|| {
            let mut cursor = 0;
            loop {
                let (keys, next) = conn.scan(cursor, "*", 500).unwrap();
                black_box(keys);
                if next == 0 {
                    break;
                }
                cursor = next;
            }
        })
    });

    group.finish();
}

/// Benchmark single writes against a redb file
fn bench_redb(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let mut config = LocalConfig::new(dir.path().join("bench.redb").display().to_string());
    config.create_if_missing = true;

    let mut conn: Connection<RedbBackend> = Connection::new(config, InterruptFlag::new());
    conn.connect().unwrap();

    let mut group = c.benchmark_group("redb");
    group.throughput(Throughput::Elements(1));

    group.bench_function("set_commit", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let item = NDbKValue::new(format!("key:{}", i), Value::string("value"));
            black_box(conn.set(item).unwrap());
            i += 1;
        });
    });

    group.bench_function("get", |b| {
        let mut i = 0u64;
        b.iter(|| {
            black_box(conn.get(&Key::from(format!("key:{}", i % 100))).ok());
            i += 1;
        });
    });

    group.finish();
}

/// Benchmark full command-line execution through a driver
fn bench_execute(c: &mut Criterion) {
    let table = Arc::new(command_table::<MemoryBackend>());
    let mut driver = Driver::<MemoryBackend>::new(LocalConfig::new("bench"), Arc::clone(&table));
    driver.handle(Request::Connect, &mut NullSink).unwrap();

    let handler = CommandHandler::new(table);
    let mut conn = memory_connection();
    let argv = split_command_line("SET greeting hello").unwrap();

    let mut group = c.benchmark_group("execute");
    group.throughput(Throughput::Elements(1));

    group.bench_function("handler_set", |b| {
        b.iter(|| {
            let mut out = Vec::new();
            handler.execute(&mut conn, &argv, &mut out).unwrap();
            black_box(out);
        })
    });

    group.bench_function("driver_script", |b| {
        b.iter(|| {
            let request = Request::Execute {
                text: "SET a 1\nGET a\nDEL a".to_string(),
            };
            black_box(driver.handle(request, &mut NullSink).unwrap());
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_engine,
    bench_lookup,
    bench_memory,
    bench_scan,
    bench_redb,
    bench_execute,
);

criterion_main!(benches);
