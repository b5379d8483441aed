//! Named lock registry
//!
//! A process-wide table of named mutual-exclusion and read/write locks.
//! Two acquisitions of the same name return the *same* underlying lock
//! object (pointer identity), which is what lets unrelated call sites
//! serialize on a shared resource key. Locks are created lazily on first
//! request; the concurrent map's entry API makes that race-free, so two
//! first-callers never end up with two distinct locks for one name.
//!
//! This is a separate lock domain from [`crate::AccessGuard`]: registry
//! locks serialize auxiliary per-resource access (persistence reads and
//! writes keyed by file), the guard serializes the engine itself.

use crate::error::EngineError;
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;

/// Registry of named locks, created on demand and reusable by name.
///
/// The registry exclusively owns the lock objects; callers hold transient
/// `Arc` handles while operating. An entry is provably unused when the
/// registry holds the last reference.
#[derive(Debug, Default)]
pub struct LockRegistry {
    mutexes: DashMap<String, Arc<Mutex<()>>>,
    rw_locks: DashMap<String, Arc<RwLock<()>>>,
}

impl LockRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle to the exclusive lock registered under `name`, creating it on
    /// first request.
    ///
    /// # Errors
    /// `EngineError::InvalidArgument` for an empty name; no lock is created.
    pub fn acquire_named_lock(&self, name: &str) -> Result<Arc<Mutex<()>>, EngineError> {
        validate_name(name)?;
        let lock = self
            .mutexes
            .entry(name.to_string())
            .or_insert_with(|| {
                tracing::debug!(lock = name, "allocating named lock");
                Arc::new(Mutex::new(()))
            })
            .clone();
        Ok(lock)
    }

    /// Handle to the read/write lock registered under `name`, creating it on
    /// first request.
    ///
    /// # Errors
    /// `EngineError::InvalidArgument` for an empty name; no lock is created.
    pub fn acquire_named_rw_lock(&self, name: &str) -> Result<Arc<RwLock<()>>, EngineError> {
        validate_name(name)?;
        let lock = self
            .rw_locks
            .entry(name.to_string())
            .or_insert_with(|| {
                tracing::debug!(lock = name, "allocating named rw lock");
                Arc::new(RwLock::new(()))
            })
            .clone();
        Ok(lock)
    }

    /// Remove the lock registered under `name`.
    ///
    /// Returns false when no such lock exists or when a caller still holds a
    /// handle to it (the entry is only removed while the registry owns the
    /// last reference).
    pub fn remove_lock(&self, name: &str) -> bool {
        let removed_mutex = self
            .mutexes
            .remove_if(name, |_, lock| Arc::strong_count(lock) == 1)
            .is_some();
        let removed_rw = self
            .rw_locks
            .remove_if(name, |_, lock| Arc::strong_count(lock) == 1)
            .is_some();
        removed_mutex || removed_rw
    }

    /// Number of locks currently registered, across both tables.
    #[must_use]
    pub fn active_lock_count(&self) -> usize {
        self.mutexes.len() + self.rw_locks.len()
    }

    /// Drop every lock nothing outside the registry references.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup_unused(&self) -> usize {
        let before = self.active_lock_count();
        self.mutexes.retain(|_, lock| Arc::strong_count(lock) > 1);
        self.rw_locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        let removed = before - self.active_lock_count();
        if removed > 0 {
            tracing::debug!(removed, "pruned unused named locks");
        }
        removed
    }
}

fn validate_name(name: &str) -> Result<(), EngineError> {
    if name.is_empty() {
        return Err(EngineError::InvalidArgument(
            "lock name must not be empty".to_string(),
        ));
    }
    Ok(())
}
