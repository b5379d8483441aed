use crate::format::ProjectFileFormat;
use planbridge_calendar::CalendarError;
use planbridge_engine::EngineError;

/// Errors from the persistence layer.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    /// A required argument was empty (file name)
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The base-calendar chain revisited a node still being processed
    #[error("calendar cycle: '{node}' ({node_id}) references base '{base}' ({base_id}) already in progress; chain: {chain}")]
    CalendarCycle {
        node: String,
        node_id: u64,
        base: String,
        base_id: u64,
        /// Every in-flight calendar, in traversal order
        chain: String,
    },

    /// A record references a base record absent from the collection
    #[error("record {record} references base {base}, which is not in the collection")]
    DanglingBase { record: u64, base: u64 },

    /// The file header classified as a layout this reader cannot decode
    #[error("unsupported project file format: {0:?}")]
    UnsupportedFormat(ProjectFileFormat),

    /// Store-side failure (including its own cycle guard rejecting a base link)
    #[error(transparent)]
    Calendar(#[from] CalendarError),

    /// Bridge-side failure (lock registry, guard, session)
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
