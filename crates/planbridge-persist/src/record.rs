//! Persisted calendar records
//!
//! The flat, file-storable mirror of a calendar node. `base` carries the
//! `unique_id` of another record in the same collection (a reference,
//! never a copy), so the persisted collection stays structurally isomorphic
//! to the in-memory graph it was derived from.

use chrono::NaiveTime;
use planbridge_calendar::{CalendarId, ProjectCalendar, WorkDay, WorkRange};
use serde::{Deserialize, Serialize};

/// Persisted working interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeRecord {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

/// Persisted weekday schedule.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DayRecord {
    pub working: bool,
    #[serde(default)]
    pub ranges: Vec<RangeRecord>,
}

/// Persisted calendar node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarRecord {
    pub unique_id: u64,
    pub fixed_id: i32,
    pub name: String,
    pub days: [DayRecord; 7],
    /// `unique_id` of this record's base record, if any
    #[serde(default)]
    pub base: Option<u64>,
    pub is_base_calendar: bool,
}

impl CalendarRecord {
    /// Copy a node's scalar fields; the base reference is attached by the
    /// codec once the base itself is resolved.
    #[must_use]
    pub fn from_scalars(calendar: &ProjectCalendar) -> Self {
        Self {
            unique_id: calendar.unique_id.0,
            fixed_id: calendar.fixed_id,
            name: calendar.name.clone(),
            days: calendar.days.clone().map(day_to_record),
            base: None,
            is_base_calendar: calendar.is_base_calendar,
        }
    }

    /// Materialize the scalar fields into a node; the base edge is attached
    /// by the codec through the store's own cycle guard.
    #[must_use]
    pub fn to_scalars(&self) -> ProjectCalendar {
        ProjectCalendar {
            unique_id: CalendarId(self.unique_id),
            fixed_id: self.fixed_id,
            name: self.name.clone(),
            days: self.days.clone().map(day_from_record),
            base: None,
            is_base_calendar: self.is_base_calendar,
        }
    }
}

fn day_to_record(day: WorkDay) -> DayRecord {
    DayRecord {
        working: day.working,
        ranges: day
            .ranges
            .into_iter()
            .map(|r| RangeRecord { start: r.start, end: r.end })
            .collect(),
    }
}

fn day_from_record(day: DayRecord) -> WorkDay {
    WorkDay {
        working: day.working,
        ranges: day
            .ranges
            .into_iter()
            .map(|r| WorkRange { start: r.start, end: r.end })
            .collect(),
    }
}
