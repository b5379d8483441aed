use crate::model::CalendarId;

/// Errors from the calendar model and store.
#[derive(Debug, thiserror::Error)]
pub enum CalendarError {
    /// A required name was empty or whitespace-only
    #[error("calendar name must not be empty")]
    EmptyName,

    /// No calendar registered under the given id
    #[error("unknown calendar id {0}")]
    UnknownCalendar(CalendarId),

    /// The built-in roots have not been initialized yet
    #[error("built-in calendars not initialized; call CalendarStore::init_builtins first")]
    BuiltinsNotInitialized,

    /// Linking the base would revisit a calendar already on the chain
    #[error("base-calendar cycle: linking '{calendar_name}' ({calendar}) to '{base_name}' ({base}) revisits the chain {chain}")]
    BaseCycle {
        calendar: CalendarId,
        calendar_name: String,
        base: CalendarId,
        base_name: String,
        /// The base chain that would be revisited, in traversal order
        chain: String,
    },

    /// A day carries more working intervals than the engine representation allows
    #[error("day has {count} working ranges, maximum is {max}")]
    TooManyRanges { count: usize, max: usize },

    /// A working interval is empty or inverted
    #[error("invalid working range: start {start} is not before end {end}")]
    InvalidRange {
        start: chrono::NaiveTime,
        end: chrono::NaiveTime,
    },

    /// Working intervals of one day overlap or are out of order
    #[error("working ranges must be ascending and non-overlapping: {prev_end} followed by {next_start}")]
    OverlappingRanges {
        prev_end: chrono::NaiveTime,
        next_start: chrono::NaiveTime,
    },
}
