//! Engine session lifecycle
//!
//! The bridge owns exactly one engine session. [`SessionManager`] holds the
//! single mutable slot it is published through and the lock every lifecycle
//! transition runs under; collaborators obtain the session only via
//! [`SessionManager::get_session`], never by constructing one.
//!
//! The session's unit-of-work scheduler is a [`HeadlessJobQueue`]: a plain
//! worker thread fed by a channel, able to schedule and execute work
//! without any interactive or windowed component.

use crate::error::EngineError;
use chrono::{DateTime, Utc};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

/// Wait ceiling for operations that round-trip to an interactive
/// collaborator (e.g. a file-choice callback). Such calls fail instead of
/// blocking forever; purely internal operations carry no timeout.
pub const INTERACTIVE_WAIT_CEILING: Duration = Duration::from_secs(300);

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Unit-of-work scheduler with no interactive component.
#[derive(Debug)]
pub struct HeadlessJobQueue {
    sender: Mutex<Option<Sender<Job>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl HeadlessJobQueue {
    /// Start the queue's worker thread.
    ///
    /// # Errors
    /// [`EngineError::WorkerSpawn`] if the OS refuses the thread; no queue
    /// exists in that case, so no job can be accepted and silently dropped.
    pub fn start() -> Result<Self, EngineError> {
        let (tx, rx): (Sender<Job>, Receiver<Job>) = crossbeam_channel::unbounded();
        let worker = std::thread::Builder::new()
            .name("planbridge-jobs".to_string())
            .spawn(move || {
                for job in rx {
                    job();
                }
                tracing::debug!("job queue worker exiting");
            })
            .map_err(EngineError::WorkerSpawn)?;
        Ok(Self {
            sender: Mutex::new(Some(tx)),
            worker: Mutex::new(Some(worker)),
        })
    }

    /// Schedule a unit of work, fire-and-forget.
    pub fn submit(&self, job: Job) -> Result<(), EngineError> {
        let sender = self.sender.lock();
        match sender.as_ref() {
            Some(tx) => tx.send(job).map_err(|_| EngineError::QueueShutDown),
            None => Err(EngineError::QueueShutDown),
        }
    }

    /// Schedule a unit of work and wait for its result, bounded by `timeout`.
    ///
    /// Used for work that may round-trip to an interactive collaborator;
    /// the call fails with [`EngineError::Timeout`] rather than blocking
    /// forever.
    pub fn submit_and_wait<T: Send + 'static>(
        &self,
        job: impl FnOnce() -> T + Send + 'static,
        timeout: Duration,
    ) -> Result<T, EngineError> {
        let (done_tx, done_rx) = crossbeam_channel::bounded(1);
        self.submit(Box::new(move || {
            let _ = done_tx.send(job());
        }))?;
        match done_rx.recv_timeout(timeout) {
            Ok(result) => Ok(result),
            Err(RecvTimeoutError::Timeout) => {
                tracing::warn!(?timeout, "queued operation exceeded wait ceiling");
                Err(EngineError::Timeout(timeout))
            }
            Err(RecvTimeoutError::Disconnected) => Err(EngineError::QueueShutDown),
        }
    }

    /// Stop accepting work and join the worker once queued jobs drain.
    pub fn shutdown(&self) {
        self.sender.lock().take();
        if let Some(worker) = self.worker.lock().take() {
            let _ = worker.join();
        }
    }
}

/// The one shared engine session.
///
/// Obtained only through [`SessionManager`]; every concurrent caller
/// observes the same instance.
#[derive(Debug)]
pub struct EngineSession {
    job_queue: Arc<HeadlessJobQueue>,
    created_at: DateTime<Utc>,
}

impl EngineSession {
    #[inline]
    #[must_use]
    pub fn job_queue(&self) -> &Arc<HeadlessJobQueue> {
        &self.job_queue
    }

    #[inline]
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Session lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Initializing,
    Initialized,
    Shutdown,
}

/// Owner of the singleton session and its init/teardown lifecycle.
///
/// All writers of the published slot hold the init lock; readers go through
/// an atomically swapped `Arc`, so they never observe a half-constructed
/// session.
#[derive(Debug)]
pub struct SessionManager {
    init_lock: Mutex<SessionState>,
    published: RwLock<Option<Arc<EngineSession>>>,
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionManager {
    #[must_use]
    pub fn new() -> Self {
        Self {
            init_lock: Mutex::new(SessionState::Uninitialized),
            published: RwLock::new(None),
        }
    }

    /// Create and publish the session. Idempotent.
    ///
    /// Concurrent first calls serialize on the init lock, so exactly one
    /// session object is ever created; a call that finds the session
    /// already initialized logs and returns.
    pub fn initialize(&self) -> Result<(), EngineError> {
        let mut state = self.init_lock.lock();
        if *state == SessionState::Initialized {
            tracing::debug!("session already initialized");
            return Ok(());
        }
        *state = SessionState::Initializing;
        self.build_and_publish(&mut state)
    }

    /// The published session.
    ///
    /// # Errors
    /// [`EngineError::NotInitialized`] before `initialize` completes.
    pub fn get_session(&self) -> Result<Arc<EngineSession>, EngineError> {
        self.published
            .read()
            .clone()
            .ok_or(EngineError::NotInitialized)
    }

    /// Tear down the published session and reset to uninitialized.
    pub fn shutdown(&self) {
        let mut state = self.init_lock.lock();
        self.teardown(&mut state);
    }

    /// Forced teardown + re-init, atomic with respect to `initialize` and
    /// `shutdown`.
    pub fn reinitialize(&self) -> Result<(), EngineError> {
        let mut state = self.init_lock.lock();
        self.teardown(&mut state);
        *state = SessionState::Initializing;
        self.build_and_publish(&mut state)
    }

    /// Current lifecycle state, for diagnostics.
    #[must_use]
    pub fn state(&self) -> SessionState {
        *self.init_lock.lock()
    }

    fn build_and_publish(&self, state: &mut SessionState) -> Result<(), EngineError> {
        // Reuse a session the slot already tracks; otherwise construct one
        // and make sure it has a job queue to schedule work on.
        let session = match self.published.read().clone() {
            Some(session) => session,
            None => {
                let queue = match HeadlessJobQueue::start() {
                    Ok(queue) => queue,
                    Err(err) => {
                        *state = SessionState::Uninitialized;
                        return Err(err);
                    }
                };
                Arc::new(EngineSession {
                    job_queue: Arc::new(queue),
                    created_at: Utc::now(),
                })
            }
        };
        *self.published.write() = Some(session);
        *state = SessionState::Initialized;
        tracing::info!("engine session initialized");
        Ok(())
    }

    fn teardown(&self, state: &mut SessionState) {
        if let Some(session) = self.published.write().take() {
            *state = SessionState::Shutdown;
            session.job_queue.shutdown();
            tracing::info!("engine session shut down");
        }
        *state = SessionState::Uninitialized;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_session_before_init_is_illegal_state() {
        let manager = SessionManager::new();
        assert!(matches!(
            manager.get_session(),
            Err(EngineError::NotInitialized)
        ));
        assert_eq!(manager.state(), SessionState::Uninitialized);
    }

    #[test]
    fn initialize_is_idempotent() {
        let manager = SessionManager::new();
        manager.initialize().unwrap();
        let first = manager.get_session().unwrap();
        manager.initialize().unwrap();
        let second = manager.get_session().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        manager.shutdown();
    }

    #[test]
    fn shutdown_resets_to_uninitialized() {
        let manager = SessionManager::new();
        manager.initialize().unwrap();
        manager.shutdown();
        assert_eq!(manager.state(), SessionState::Uninitialized);
        assert!(matches!(
            manager.get_session(),
            Err(EngineError::NotInitialized)
        ));

        // Re-initialization after shutdown is allowed.
        manager.initialize().unwrap();
        assert!(manager.get_session().is_ok());
        manager.shutdown();
    }

    #[test]
    fn reinitialize_replaces_instance() {
        let manager = SessionManager::new();
        manager.initialize().unwrap();
        let first = manager.get_session().unwrap();
        manager.reinitialize().unwrap();
        let second = manager.get_session().unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        manager.shutdown();
    }

    #[test]
    fn job_queue_executes_submitted_work() {
        let manager = SessionManager::new();
        manager.initialize().unwrap();
        let session = manager.get_session().unwrap();

        let out = session
            .job_queue()
            .submit_and_wait(|| 6 * 7, Duration::from_secs(5))
            .unwrap();
        assert_eq!(out, 42);
        manager.shutdown();
    }

    #[test]
    fn started_queue_runs_work_on_its_worker() {
        let queue = HeadlessJobQueue::start().unwrap();
        let out = queue
            .submit_and_wait(|| "ran", Duration::from_secs(5))
            .unwrap();
        assert_eq!(out, "ran");
        queue.shutdown();
    }

    #[test]
    fn job_queue_times_out_on_stalled_work() {
        let queue = HeadlessJobQueue::start().unwrap();
        let result = queue.submit_and_wait(
            || std::thread::sleep(Duration::from_millis(250)),
            Duration::from_millis(10),
        );
        assert!(matches!(result, Err(EngineError::Timeout(_))));
        queue.shutdown();
    }

    #[test]
    fn submit_after_shutdown_fails() {
        let queue = HeadlessJobQueue::start().unwrap();
        queue.shutdown();
        assert!(matches!(
            queue.submit(Box::new(|| ())),
            Err(EngineError::QueueShutDown)
        ));
    }
}
