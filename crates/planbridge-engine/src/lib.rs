//! Concurrency-safety bridge around the legacy scheduling engine.
//!
//! The engine underneath this crate keeps mutable global state and has no
//! internal synchronization, so it can serve many concurrent callers only
//! through a serialization layer:
//!
//! - [`AccessGuard`] funnels every mutating call through one fair,
//!   reentrant-capable exclusive lock. This is a deliberate global
//!   bottleneck, not an oversight.
//! - [`LockRegistry`] hands out named mutexes and read/write locks for
//!   auxiliary per-resource serialization, a lock domain separate from the
//!   engine-wide guard.
//! - [`SessionManager`] owns the single shared engine session, with an
//!   explicit init/teardown lifecycle instead of ambient global access.
//! - [`AuditSink`] receives write-once records of calendar lifecycle
//!   actions; storage backends are a collaborator's concern.
//!
//! All of it is explicitly constructed, explicitly owned state passed by
//! reference to collaborators, so tests build a fresh instance per run.

pub mod audit;
pub mod error;
pub mod guard;
pub mod locks;
pub mod session;

pub use audit::{AuditAction, AuditEntry, AuditSink, InMemoryAuditSink};
pub use error::EngineError;
pub use guard::AccessGuard;
pub use locks::LockRegistry;
pub use session::{
    EngineSession, HeadlessJobQueue, SessionManager, SessionState, INTERACTIVE_WAIT_CEILING,
};
