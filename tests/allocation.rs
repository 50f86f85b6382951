//! Allocation accounting through the tracking allocator and the SQLite hook.
//!
//! Kept as a single test: the counter is process-wide, so concurrently
//! running tests in this binary would show up in the measurement. The hook
//! also has to go in before this binary opens its first connection.

use orm_sql_bench::harness::Runner;
use orm_sql_bench::metrics::{allocated_bytes, AllocatorMetrics, TrackingAllocator};
use orm_sql_bench::operation::FnOperation;
use orm_sql_bench::workloads::{self, Database, StatementMode};
use std::hint::black_box;

#[global_allocator]
static GLOBAL: TrackingAllocator = TrackingAllocator;

const KIB: usize = 1024;

#[test]
fn test_fixed_allocation_per_call() {
    workloads::track_sqlite_allocations().unwrap();
    // Second call reports the first outcome.
    workloads::track_sqlite_allocations().unwrap();

    let before = allocated_bytes();
    let v = black_box(vec![0u8; 4 * KIB]);
    assert!(allocated_bytes() - before >= 4 * KIB as u64);
    drop(v);

    let runner = Runner::new(AllocatorMetrics);

    let k = 256 * KIB;
    let mut alloc_op = FnOperation::new("alloc 256KiB", |_| {
        let buf = vec![0u8; k];
        black_box(&buf);
        Ok(())
    });
    let r = runner.run(&mut alloc_op, 20).unwrap();
    let expected_mb = k as f64 / (1024.0 * 1024.0);
    assert!(
        (r.avg_ram_mb - expected_mb).abs() / expected_mb < 0.05,
        "avg_ram_mb {} vs expected {}",
        r.avg_ram_mb,
        expected_mb
    );
    assert_eq!(r.gc_pause_ms, 0.0);

    let mut idle_op = FnOperation::new("idle", |i| {
        black_box(i);
        Ok(())
    });
    let r = runner.run(&mut idle_op, 20).unwrap();
    assert!(r.avg_ram_mb < expected_mb / 100.0, "idle op allocated {} MB", r.avg_ram_mb);

    // SQLite's blob comes from its own heap, not the Rust global allocator.
    let db = Database::open_in_memory(StatementMode::Cached).unwrap();
    let mut blob_op = FnOperation::new("sqlite randomblob 1MiB", |_| {
        let len: i64 = db
            .connection()
            .query_row("SELECT length(randomblob(1048576))", [], |row| row.get(0))?;
        black_box(len);
        Ok(())
    });
    let r = runner.run(&mut blob_op, 20).unwrap();
    assert!(
        r.avg_ram_mb >= 0.99 && r.avg_ram_mb < 2.0,
        "sqlite randomblob counted {} MB per call",
        r.avg_ram_mb
    );
}
