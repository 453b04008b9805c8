//! The process-wide dispatch lock.
//!
//! Opening and closing shared libraries, resolving their symbols, and
//! creating or destroying loaders all take [`DISPATCH_LOCK`], a single lock
//! shared by every loader in the process. It is reentrant: a loader being
//! dropped may unload libraries while already holding it.
//!
//! Capability matching over already-copied descriptors does not take it.

use parking_lot::{ReentrantMutex, ReentrantMutexGuard, const_reentrant_mutex};

pub static DISPATCH_LOCK: ReentrantMutex<()> = const_reentrant_mutex(());

/// Hold the dispatch lock until the guard is dropped.
pub fn dispatch_guard() -> ReentrantMutexGuard<'static, ()> {
    DISPATCH_LOCK.lock()
}
