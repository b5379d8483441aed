//! Calendar node types
//!
//! A [`ProjectCalendar`] is one node of the calendar inheritance graph: an
//! identity, a display name, seven [`WorkDay`]s, and an optional base edge to
//! the calendar it inherits defaults from.

use crate::error::CalendarError;
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Maximum number of working intervals the engine stores per weekday.
pub const MAX_RANGES_PER_DAY: usize = 5;

/// Stable identity of a calendar node within one store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CalendarId(pub u64);

impl CalendarId {
    /// Placeholder id for calendars not yet registered with a store.
    pub const UNASSIGNED: CalendarId = CalendarId(0);

    #[inline]
    #[must_use]
    pub const fn is_assigned(self) -> bool {
        self.0 != 0
    }
}

impl Display for CalendarId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One contiguous working interval within a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkRange {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl WorkRange {
    /// Create a range, rejecting empty and inverted intervals.
    pub fn new(start: NaiveTime, end: NaiveTime) -> Result<Self, CalendarError> {
        if start >= end {
            return Err(CalendarError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }
}

/// Working-time description of a single weekday.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WorkDay {
    /// Whether the day counts as working time at all
    pub working: bool,
    /// Up to [`MAX_RANGES_PER_DAY`] ascending, non-overlapping intervals
    pub ranges: Vec<WorkRange>,
}

impl WorkDay {
    /// A non-working day with no intervals.
    #[inline]
    #[must_use]
    pub fn non_working() -> Self {
        Self::default()
    }

    /// A working day with the given intervals, validated.
    pub fn working(ranges: Vec<WorkRange>) -> Result<Self, CalendarError> {
        validate_ranges(&ranges)?;
        Ok(Self { working: true, ranges })
    }
}

/// Validate a day's interval list: bounded, ascending, non-overlapping.
pub(crate) fn validate_ranges(ranges: &[WorkRange]) -> Result<(), CalendarError> {
    if ranges.len() > MAX_RANGES_PER_DAY {
        return Err(CalendarError::TooManyRanges {
            count: ranges.len(),
            max: MAX_RANGES_PER_DAY,
        });
    }
    for pair in ranges.windows(2) {
        if pair[1].start < pair[0].end {
            return Err(CalendarError::OverlappingRanges {
                prev_end: pair[0].end,
                next_start: pair[1].start,
            });
        }
    }
    Ok(())
}

/// One node of the calendar inheritance graph.
///
/// `base` is an edge to the calendar this one inherits working-time defaults
/// from. The relation, followed transitively, must stay acyclic; the store
/// enforces that when the edge is linked. The distinguished Standard root is
/// the chain terminator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectCalendar {
    /// Store-assigned identity, [`CalendarId::UNASSIGNED`] until registered
    pub unique_id: CalendarId,
    /// Small well-known id for built-in roots, 0 for user calendars
    pub fixed_id: i32,
    /// Display name, stored verbatim (comparison uses the normalizer)
    pub name: String,
    /// Monday-first weekday schedule
    pub days: [WorkDay; 7],
    /// Base calendar this one derives from, if any
    pub base: Option<CalendarId>,
    /// Marks system-provided root calendars
    pub is_base_calendar: bool,
}

impl ProjectCalendar {
    /// Create an unregistered calendar with all days non-working.
    pub fn new(name: impl Into<String>) -> Result<Self, CalendarError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(CalendarError::EmptyName);
        }
        Ok(Self {
            unique_id: CalendarId::UNASSIGNED,
            fixed_id: 0,
            name,
            days: Default::default(),
            base: None,
            is_base_calendar: false,
        })
    }

    /// Working-day count, for diagnostics.
    #[inline]
    #[must_use]
    pub fn working_day_count(&self) -> usize {
        self.days.iter().filter(|d| d.working).count()
    }
}
