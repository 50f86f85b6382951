//! Process-wide allocation counters and the sources that read them.
//!
//! Install [`TrackingAllocator`] as the global allocator to make
//! [`AllocatorMetrics`] report real numbers:
//!
//! ```rust,ignore
//! use orm_sql_bench::metrics::TrackingAllocator;
//!
//! #[global_allocator]
//! static GLOBAL: TrackingAllocator = TrackingAllocator;
//! ```

use std::alloc::{GlobalAlloc, Layout, System};
use std::sync::atomic::{AtomicU64, Ordering};

static ALLOCATED_BYTES: AtomicU64 = AtomicU64::new(0);

/// Point-in-time read of cumulative allocator and collector counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuntimeSnapshot {
    /// Bytes allocated since process start.
    pub bytes_allocated: u64,
    /// Collector pause time since process start.
    pub gc_pause_ns: u64,
}

impl RuntimeSnapshot {
    /// Counter growth from `start` to `self`.
    pub fn since(&self, start: &RuntimeSnapshot) -> RuntimeSnapshot {
        RuntimeSnapshot {
            bytes_allocated: self.bytes_allocated.saturating_sub(start.bytes_allocated),
            gc_pause_ns: self.gc_pause_ns.saturating_sub(start.gc_pause_ns),
        }
    }
}

/// Where the runner reads runtime counters from.
pub trait MetricsSource {
    /// Settle deferred runtime work before a baseline snapshot.
    fn collect(&self) {}

    fn snapshot(&self) -> RuntimeSnapshot;
}

impl<M: MetricsSource + ?Sized> MetricsSource for &M {
    fn collect(&self) {
        (**self).collect()
    }

    fn snapshot(&self) -> RuntimeSnapshot {
        (**self).snapshot()
    }
}

/// Global allocator that counts bytes handed out by [`System`].
pub struct TrackingAllocator;

unsafe impl GlobalAlloc for TrackingAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = System.alloc(layout);
        if !ptr.is_null() {
            record_allocation(layout.size() as u64);
        }
        ptr
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        let ptr = System.alloc_zeroed(layout);
        if !ptr.is_null() {
            record_allocation(layout.size() as u64);
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        System.dealloc(ptr, layout)
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        let new_ptr = System.realloc(ptr, layout, new_size);
        if !new_ptr.is_null() && new_size > layout.size() {
            record_allocation((new_size - layout.size()) as u64);
        }
        new_ptr
    }
}

/// Add bytes handed out by an allocator the Rust runtime does not route
/// through [`TrackingAllocator`].
pub(crate) fn record_allocation(bytes: u64) {
    ALLOCATED_BYTES.fetch_add(bytes, Ordering::Relaxed);
}

/// Cumulative bytes counted by [`TrackingAllocator`] and any foreign
/// allocator hooks. Stays at 0 unless one of them is installed.
pub fn allocated_bytes() -> u64 {
    ALLOCATED_BYTES.load(Ordering::Relaxed)
}

/// Reads [`TrackingAllocator`]'s counter.
///
/// There is no collector in a Rust process, so `collect` does nothing and
/// `gc_pause_ns` is always 0.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllocatorMetrics;

impl MetricsSource for AllocatorMetrics {
    fn snapshot(&self) -> RuntimeSnapshot {
        RuntimeSnapshot {
            bytes_allocated: allocated_bytes(),
            gc_pause_ns: 0,
        }
    }
}

/// Source that always reads zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMetrics;

impl MetricsSource for NoopMetrics {
    fn snapshot(&self) -> RuntimeSnapshot {
        RuntimeSnapshot::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_since_differences_counters() {
        let start = RuntimeSnapshot {
            bytes_allocated: 1_000,
            gc_pause_ns: 50,
        };
        let end = RuntimeSnapshot {
            bytes_allocated: 5_096,
            gc_pause_ns: 2_050,
        };
        let delta = end.since(&start);
        assert_eq!(delta.bytes_allocated, 4_096);
        assert_eq!(delta.gc_pause_ns, 2_000);
    }

    #[test]
    fn test_since_saturates() {
        let start = RuntimeSnapshot {
            bytes_allocated: 10,
            gc_pause_ns: 10,
        };
        let delta = RuntimeSnapshot::default().since(&start);
        assert_eq!(delta, RuntimeSnapshot::default());
    }

    #[test]
    fn test_allocator_metrics_reports_no_pause() {
        let snap = AllocatorMetrics.snapshot();
        assert_eq!(snap.gc_pause_ns, 0);
    }
}
