/// Errors from the engine bridge.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A required argument was null-equivalent (empty lock name, empty file name)
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The session was requested before initialization completed
    #[error("engine session not initialized")]
    NotInitialized,

    /// The session queue is gone (shut down while a caller still held a handle)
    #[error("engine job queue is shut down")]
    QueueShutDown,

    /// The OS refused the job queue's worker thread
    #[error("failed to start job queue worker: {0}")]
    WorkerSpawn(#[source] std::io::Error),

    /// A round-trip to an interactive collaborator exceeded the wait ceiling
    #[error("operation timed out after {0:?} waiting on an interactive collaborator")]
    Timeout(std::time::Duration),
}
