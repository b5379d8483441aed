//! Work-week application
//!
//! Translates an external work-schedule description into the engine's
//! per-day / per-interval calendar representation. This is a leaf consumer
//! of the persisted calendar shape: it only writes into an existing
//! [`ProjectCalendar`], it never produces records of its own.

use crate::error::CalendarError;
use crate::model::{validate_ranges, ProjectCalendar, WorkDay, WorkRange};
use serde::{Deserialize, Serialize};

/// External description of one weekday's schedule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayPlan {
    pub working: bool,
    #[serde(default)]
    pub ranges: Vec<WorkRange>,
}

/// External work-schedule description, Monday-first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkWeek {
    pub days: [DayPlan; 7],
}

impl WorkWeek {
    /// A standard five-day week with the same intervals each working day.
    #[must_use]
    pub fn five_day(ranges: Vec<WorkRange>) -> Self {
        let mut week = Self::default();
        for day in &mut week.days[..5] {
            day.working = true;
            day.ranges = ranges.clone();
        }
        week
    }
}

/// Overwrite a calendar's weekday schedule from an external work week.
///
/// Every day is validated before anything is written, so a rejected week
/// leaves the calendar unchanged. A non-working day clears its intervals
/// even if the description carries some.
pub fn apply_work_week(
    calendar: &mut ProjectCalendar,
    week: &WorkWeek,
) -> Result<(), CalendarError> {
    for day in &week.days {
        if day.working {
            validate_ranges(&day.ranges)?;
            for range in &day.ranges {
                if range.start >= range.end {
                    return Err(CalendarError::InvalidRange {
                        start: range.start,
                        end: range.end,
                    });
                }
            }
        }
    }

    for (slot, plan) in calendar.days.iter_mut().zip(&week.days) {
        *slot = if plan.working {
            WorkDay {
                working: true,
                ranges: plan.ranges.clone(),
            }
        } else {
            WorkDay::non_working()
        };
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn nine_to_five() -> Vec<WorkRange> {
        vec![WorkRange::new(t(9, 0), t(17, 0)).unwrap()]
    }

    #[test]
    fn apply_five_day_week() {
        let mut cal = ProjectCalendar::new("Crew A").unwrap();
        apply_work_week(&mut cal, &WorkWeek::five_day(nine_to_five())).unwrap();
        assert_eq!(cal.working_day_count(), 5);
        assert_eq!(cal.days[0].ranges, nine_to_five());
        assert!(!cal.days[5].working);
        assert!(cal.days[5].ranges.is_empty());
    }

    #[test]
    fn non_working_day_clears_ranges() {
        let mut cal = ProjectCalendar::new("Crew A").unwrap();
        apply_work_week(&mut cal, &WorkWeek::five_day(nine_to_five())).unwrap();

        let mut week = WorkWeek::default();
        week.days[0].ranges = nine_to_five(); // working stays false
        apply_work_week(&mut cal, &week).unwrap();
        assert_eq!(cal.working_day_count(), 0);
        assert!(cal.days[0].ranges.is_empty());
    }

    #[test]
    fn invalid_week_leaves_calendar_unchanged() {
        let mut cal = ProjectCalendar::new("Crew A").unwrap();
        apply_work_week(&mut cal, &WorkWeek::five_day(nine_to_five())).unwrap();
        let before = cal.clone();

        let mut week = WorkWeek::five_day(nine_to_five());
        // Friday gets an inverted interval
        week.days[4].ranges = vec![WorkRange { start: t(17, 0), end: t(9, 0) }];
        let result = apply_work_week(&mut cal, &week);
        assert!(matches!(result, Err(CalendarError::InvalidRange { .. })));
        assert_eq!(cal, before);
    }

    #[test]
    fn too_many_ranges_rejected() {
        let mut cal = ProjectCalendar::new("Crew A").unwrap();
        let mut week = WorkWeek::default();
        week.days[0].working = true;
        week.days[0].ranges = (0..6)
            .map(|i| WorkRange::new(t(2 * i, 0), t(2 * i + 1, 0)).unwrap())
            .collect();
        assert!(matches!(
            apply_work_week(&mut cal, &week),
            Err(CalendarError::TooManyRanges { .. })
        ));
    }
}
