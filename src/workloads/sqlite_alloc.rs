//! Routes SQLite's own heap traffic into the process-wide allocation counter.
//!
//! The bundled SQLite engine allocates through C malloc, which the Rust
//! global allocator never sees. [`track_sqlite_allocations`] wraps SQLite's
//! default memory methods with counting shims. It must run before the first
//! connection opens, since SQLite only accepts `SQLITE_CONFIG_MALLOC` before
//! it initializes.

use std::ffi::{c_int, c_void};
use std::sync::OnceLock;

use rusqlite::ffi;

use super::WorkloadError;
use crate::metrics::record_allocation;

struct DefaultMethods(ffi::sqlite3_mem_methods);

// Function pointers plus SQLite's own app-data pointer, never mutated after install.
unsafe impl Send for DefaultMethods {}
unsafe impl Sync for DefaultMethods {}

static DEFAULT_METHODS: OnceLock<DefaultMethods> = OnceLock::new();
static INSTALL_RC: OnceLock<c_int> = OnceLock::new();

fn defaults() -> Option<&'static ffi::sqlite3_mem_methods> {
    DEFAULT_METHODS.get().map(|m| &m.0)
}

unsafe fn size_of_block(p: *mut c_void) -> u64 {
    if p.is_null() {
        return 0;
    }
    match defaults().and_then(|m| m.xSize) {
        Some(x_size) => x_size(p).max(0) as u64,
        None => 0,
    }
}

unsafe extern "C" fn counting_malloc(n: c_int) -> *mut c_void {
    let p = match defaults().and_then(|m| m.xMalloc) {
        Some(x_malloc) => x_malloc(n),
        None => std::ptr::null_mut(),
    };
    if !p.is_null() && n > 0 {
        record_allocation(n as u64);
    }
    p
}

unsafe extern "C" fn counting_free(p: *mut c_void) {
    if let Some(x_free) = defaults().and_then(|m| m.xFree) {
        x_free(p)
    }
}

unsafe extern "C" fn counting_realloc(p: *mut c_void, n: c_int) -> *mut c_void {
    let old = size_of_block(p);
    let q = match defaults().and_then(|m| m.xRealloc) {
        Some(x_realloc) => x_realloc(p, n),
        None => std::ptr::null_mut(),
    };
    if !q.is_null() && n > 0 && n as u64 > old {
        record_allocation(n as u64 - old);
    }
    q
}

unsafe extern "C" fn counting_size(p: *mut c_void) -> c_int {
    match defaults().and_then(|m| m.xSize) {
        Some(x_size) => x_size(p),
        None => 0,
    }
}

unsafe extern "C" fn counting_roundup(n: c_int) -> c_int {
    match defaults().and_then(|m| m.xRoundup) {
        Some(x_roundup) => x_roundup(n),
        None => n,
    }
}

unsafe extern "C" fn counting_init(app: *mut c_void) -> c_int {
    match defaults().and_then(|m| m.xInit) {
        Some(x_init) => x_init(app),
        None => ffi::SQLITE_OK,
    }
}

unsafe extern "C" fn counting_shutdown(app: *mut c_void) {
    if let Some(x_shutdown) = defaults().and_then(|m| m.xShutdown) {
        x_shutdown(app)
    }
}

fn install() -> c_int {
    unsafe {
        let mut original: ffi::sqlite3_mem_methods = std::mem::zeroed();
        let rc = ffi::sqlite3_config(
            ffi::SQLITE_CONFIG_GETMALLOC,
            &mut original as *mut ffi::sqlite3_mem_methods,
        );
        if rc != ffi::SQLITE_OK {
            return rc;
        }
        let app_data = original.pAppData;
        if DEFAULT_METHODS.set(DefaultMethods(original)).is_err() {
            return ffi::SQLITE_MISUSE;
        }

        // SQLite keeps its own copy of this struct.
        let counting = ffi::sqlite3_mem_methods {
            xMalloc: Some(counting_malloc),
            xFree: Some(counting_free),
            xRealloc: Some(counting_realloc),
            xSize: Some(counting_size),
            xRoundup: Some(counting_roundup),
            xInit: Some(counting_init),
            xShutdown: Some(counting_shutdown),
            pAppData: app_data,
        };
        ffi::sqlite3_config(
            ffi::SQLITE_CONFIG_MALLOC,
            &counting as *const ffi::sqlite3_mem_methods,
        )
    }
}

/// Count SQLite's allocations in [`allocated_bytes`](crate::metrics::allocated_bytes).
///
/// Idempotent. Fails with [`WorkloadError::AllocatorHook`] if SQLite was
/// already initialized by an earlier connection.
pub fn track_sqlite_allocations() -> Result<(), WorkloadError> {
    match *INSTALL_RC.get_or_init(install) {
        ffi::SQLITE_OK => Ok(()),
        rc => Err(WorkloadError::AllocatorHook(rc)),
    }
}
