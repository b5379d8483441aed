//! Calendar store
//!
//! Owns every calendar node of one engine instance and the base edges
//! between them. The store is the single authority on calendar identity
//! (it assigns [`CalendarId`]s) and on the acyclicity of the base relation:
//! [`CalendarStore::set_base`] rejects any link that would revisit a node
//! already on the chain, so a cycle can never be stored.
//!
//! The built-in roots (Standard, Night Shift, 24 Hours) are created by an
//! explicit [`CalendarStore::init_builtins`] call with well-known fixed ids;
//! there is no lazy or reflective construction path.

use crate::error::CalendarError;
use crate::model::{CalendarId, ProjectCalendar, WorkDay, WorkRange};
use crate::name::normalize_for_comparison;
use chrono::NaiveTime;
use indexmap::IndexMap;

/// Fixed id of the Standard root calendar.
pub const FIXED_ID_STANDARD: i32 = 1;
/// Fixed id of the Night Shift root calendar.
pub const FIXED_ID_NIGHT_SHIFT: i32 = 2;
/// Fixed id of the 24 Hours root calendar.
pub const FIXED_ID_TWENTY_FOUR_HOURS: i32 = 3;

/// Owner of all calendar nodes and their base edges.
#[derive(Debug, Default)]
pub struct CalendarStore {
    calendars: IndexMap<CalendarId, ProjectCalendar>,
    next_id: u64,
    standard: Option<CalendarId>,
}

impl CalendarStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            calendars: IndexMap::new(),
            next_id: 1,
            standard: None,
        }
    }

    /// Register a calendar, assigning an id if it has none.
    ///
    /// A calendar arriving with an assigned id (e.g. materialized from a
    /// load) keeps it unless that id is already taken, in which case it gets
    /// a fresh one; the id counter is advanced past every assigned id so
    /// later assignments never collide.
    pub fn add(&mut self, mut calendar: ProjectCalendar) -> Result<CalendarId, CalendarError> {
        if calendar.name.trim().is_empty() {
            return Err(CalendarError::EmptyName);
        }
        if !calendar.unique_id.is_assigned() || self.calendars.contains_key(&calendar.unique_id) {
            calendar.unique_id = CalendarId(self.next_id);
            self.next_id += 1;
        } else {
            self.next_id = self.next_id.max(calendar.unique_id.0 + 1);
        }
        let id = calendar.unique_id;
        // A pre-set base edge goes through the same cycle guard as set_base.
        let base = calendar.base.take();
        self.calendars.insert(id, calendar);
        if let Some(base_id) = base {
            self.set_base(id, base_id)?;
        }
        tracing::debug!(calendar = %id, "registered calendar");
        Ok(id)
    }

    #[inline]
    #[must_use]
    pub fn get(&self, id: CalendarId) -> Option<&ProjectCalendar> {
        self.calendars.get(&id)
    }

    #[inline]
    #[must_use]
    pub fn get_mut(&mut self, id: CalendarId) -> Option<&mut ProjectCalendar> {
        self.calendars.get_mut(&id)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.calendars.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.calendars.is_empty()
    }

    /// Iterate calendars in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &ProjectCalendar> {
        self.calendars.values()
    }

    /// Ids of all registered calendars, in registration order.
    #[must_use]
    pub fn ids(&self) -> Vec<CalendarId> {
        self.calendars.keys().copied().collect()
    }

    /// Link `id` to inherit from `base`, rejecting cycles.
    ///
    /// Walks the transitive base chain starting at `base`; if the walk
    /// reaches `id` again the link would close a cycle and is refused with
    /// a diagnostic naming both ends and the chain. A self-link is the
    /// one-edge case of the same check.
    pub fn set_base(&mut self, id: CalendarId, base: CalendarId) -> Result<(), CalendarError> {
        let calendar = self
            .calendars
            .get(&id)
            .ok_or(CalendarError::UnknownCalendar(id))?;
        let calendar_name = calendar.name.clone();
        let base_cal = self
            .calendars
            .get(&base)
            .ok_or(CalendarError::UnknownCalendar(base))?;
        let base_name = base_cal.name.clone();

        // Walk the chain from the proposed base; revisiting `id` closes a loop.
        let mut chain = vec![id];
        let mut cursor = Some(base);
        while let Some(current) = cursor {
            chain.push(current);
            if current == id {
                let rendered = self.render_chain(&chain);
                tracing::warn!(
                    calendar = %id,
                    base = %base,
                    chain = %rendered,
                    "rejected base link that would close a cycle"
                );
                return Err(CalendarError::BaseCycle {
                    calendar: id,
                    calendar_name,
                    base,
                    base_name,
                    chain: rendered,
                });
            }
            cursor = self.calendars.get(&current).and_then(|c| c.base);
        }

        // Checked above that `id` exists.
        if let Some(cal) = self.calendars.get_mut(&id) {
            cal.base = Some(base);
        }
        Ok(())
    }

    /// Drop the base edge of `id`, if any.
    pub fn clear_base(&mut self, id: CalendarId) -> Result<(), CalendarError> {
        let cal = self
            .calendars
            .get_mut(&id)
            .ok_or(CalendarError::UnknownCalendar(id))?;
        cal.base = None;
        Ok(())
    }

    /// The transitive base chain of `id`, starting at `id` itself.
    ///
    /// The store never contains a cycle, so the walk always terminates.
    #[must_use]
    pub fn base_chain(&self, id: CalendarId) -> Vec<CalendarId> {
        let mut chain = Vec::new();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            chain.push(current);
            cursor = self.calendars.get(&current).and_then(|c| c.base);
        }
        chain
    }

    /// The distinguished Standard root.
    pub fn standard_instance(&self) -> Result<CalendarId, CalendarError> {
        self.standard.ok_or(CalendarError::BuiltinsNotInitialized)
    }

    /// Find a calendar whose display name matches under the comparison
    /// normalizer.
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<CalendarId> {
        let wanted = normalize_for_comparison(name);
        self.calendars
            .values()
            .find(|c| normalize_for_comparison(&c.name) == wanted)
            .map(|c| c.unique_id)
    }

    /// Create the built-in root calendars with their well-known fixed ids.
    ///
    /// Idempotent: a second call finds the existing roots by fixed id and
    /// leaves them untouched.
    pub fn init_builtins(&mut self) -> Result<(), CalendarError> {
        if self.standard.is_some() {
            tracing::debug!("built-in calendars already initialized");
            return Ok(());
        }

        let standard = self.add(builtin(
            "Standard",
            FIXED_ID_STANDARD,
            weekdays_working(day_shift()),
        )?)?;
        self.add(builtin(
            "Night Shift",
            FIXED_ID_NIGHT_SHIFT,
            weekdays_working(night_shift()),
        )?)?;
        self.add(builtin(
            "24 Hours",
            FIXED_ID_TWENTY_FOUR_HOURS,
            all_days_working(full_day()),
        )?)?;

        self.standard = Some(standard);
        tracing::info!(standard = %standard, "initialized built-in calendars");
        Ok(())
    }

    fn render_chain(&self, chain: &[CalendarId]) -> String {
        chain
            .iter()
            .map(|id| match self.calendars.get(id) {
                Some(c) => format!("'{}' ({id})", c.name),
                None => format!("({id})"),
            })
            .collect::<Vec<_>>()
            .join(" -> ")
    }
}

fn builtin(
    name: &str,
    fixed_id: i32,
    days: [WorkDay; 7],
) -> Result<ProjectCalendar, CalendarError> {
    let mut cal = ProjectCalendar::new(name)?;
    cal.fixed_id = fixed_id;
    cal.is_base_calendar = true;
    cal.days = days;
    Ok(cal)
}

fn t(h: u32, m: u32) -> NaiveTime {
    // Hour/minute literals below are all in range.
    NaiveTime::from_hms_opt(h, m, 0).unwrap_or_default()
}

fn day_shift() -> Vec<WorkRange> {
    vec![
        WorkRange { start: t(8, 0), end: t(12, 0) },
        WorkRange { start: t(13, 0), end: t(17, 0) },
    ]
}

fn night_shift() -> Vec<WorkRange> {
    vec![
        WorkRange { start: t(0, 0), end: t(3, 0) },
        WorkRange { start: t(4, 0), end: t(8, 0) },
        WorkRange { start: t(23, 0), end: t(23, 59) },
    ]
}

fn full_day() -> Vec<WorkRange> {
    vec![WorkRange { start: t(0, 0), end: t(23, 59) }]
}

/// Monday..Friday working, weekend off.
fn weekdays_working(ranges: Vec<WorkRange>) -> [WorkDay; 7] {
    let working = WorkDay { working: true, ranges };
    [
        working.clone(),
        working.clone(),
        working.clone(),
        working.clone(),
        working,
        WorkDay::non_working(),
        WorkDay::non_working(),
    ]
}

fn all_days_working(ranges: Vec<WorkRange>) -> [WorkDay; 7] {
    let working = WorkDay { working: true, ranges };
    [
        working.clone(),
        working.clone(),
        working.clone(),
        working.clone(),
        working.clone(),
        working.clone(),
        working,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn store_with_builtins() -> CalendarStore {
        let mut store = CalendarStore::new();
        store.init_builtins().unwrap();
        store
    }

    #[test]
    fn add_assigns_sequential_ids() {
        let mut store = CalendarStore::new();
        let a = store.add(ProjectCalendar::new("A").unwrap()).unwrap();
        let b = store.add(ProjectCalendar::new("B").unwrap()).unwrap();
        assert_ne!(a, b);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn add_keeps_preassigned_id_and_advances_counter() {
        let mut store = CalendarStore::new();
        let mut cal = ProjectCalendar::new("Loaded").unwrap();
        cal.unique_id = CalendarId(40);
        let id = store.add(cal).unwrap();
        assert_eq!(id, CalendarId(40));

        let next = store.add(ProjectCalendar::new("Fresh").unwrap()).unwrap();
        assert_eq!(next, CalendarId(41));
    }

    #[test]
    fn add_reassigns_taken_id() {
        let mut store = CalendarStore::new();
        let first = store.add(ProjectCalendar::new("First").unwrap()).unwrap();

        let mut clash = ProjectCalendar::new("Clash").unwrap();
        clash.unique_id = first;
        let second = store.add(clash).unwrap();
        assert_ne!(second, first);
        assert_eq!(store.get(first).unwrap().name, "First");
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn init_builtins_is_idempotent() {
        let mut store = store_with_builtins();
        let count = store.len();
        store.init_builtins().unwrap();
        assert_eq!(store.len(), count);
    }

    #[test]
    fn standard_instance_requires_init() {
        let store = CalendarStore::new();
        assert!(matches!(
            store.standard_instance(),
            Err(CalendarError::BuiltinsNotInitialized)
        ));

        let store = store_with_builtins();
        let standard = store.standard_instance().unwrap();
        assert_eq!(store.get(standard).unwrap().fixed_id, FIXED_ID_STANDARD);
        assert!(store.get(standard).unwrap().is_base_calendar);
    }

    #[test]
    fn set_base_links_chain() {
        let mut store = store_with_builtins();
        let standard = store.standard_instance().unwrap();
        let derived = store.add(ProjectCalendar::new("Crew A").unwrap()).unwrap();
        store.set_base(derived, standard).unwrap();
        assert_eq!(store.base_chain(derived), vec![derived, standard]);
    }

    #[test]
    fn set_base_rejects_self_link() {
        let mut store = CalendarStore::new();
        let a = store.add(ProjectCalendar::new("A").unwrap()).unwrap();
        let result = store.set_base(a, a);
        assert!(matches!(result, Err(CalendarError::BaseCycle { .. })));
        assert!(store.get(a).unwrap().base.is_none());
    }

    #[test]
    fn set_base_rejects_long_cycle() {
        let mut store = CalendarStore::new();
        let a = store.add(ProjectCalendar::new("A").unwrap()).unwrap();
        let b = store.add(ProjectCalendar::new("B").unwrap()).unwrap();
        let c = store.add(ProjectCalendar::new("C").unwrap()).unwrap();
        store.set_base(a, b).unwrap();
        store.set_base(b, c).unwrap();

        let result = store.set_base(c, a);
        match result {
            Err(CalendarError::BaseCycle { chain, .. }) => {
                assert!(chain.contains("'A'"));
                assert!(chain.contains("'B'"));
                assert!(chain.contains("'C'"));
            }
            other => panic!("expected BaseCycle, got {other:?}"),
        }
        // The rejected link leaves the store untouched.
        assert!(store.get(c).unwrap().base.is_none());
    }

    #[test]
    fn set_base_unknown_ids() {
        let mut store = CalendarStore::new();
        let a = store.add(ProjectCalendar::new("A").unwrap()).unwrap();
        assert!(matches!(
            store.set_base(a, CalendarId(999)),
            Err(CalendarError::UnknownCalendar(CalendarId(999)))
        ));
        assert!(matches!(
            store.set_base(CalendarId(999), a),
            Err(CalendarError::UnknownCalendar(CalendarId(999)))
        ));
    }

    #[test]
    fn add_with_preset_base_goes_through_cycle_guard() {
        let mut store = store_with_builtins();
        let standard = store.standard_instance().unwrap();
        let mut cal = ProjectCalendar::new("Derived").unwrap();
        cal.base = Some(standard);
        let id = store.add(cal).unwrap();
        assert_eq!(store.get(id).unwrap().base, Some(standard));
    }

    #[test]
    fn find_by_name_uses_comparison_normalizer() {
        let store = store_with_builtins();
        let standard = store.standard_instance().unwrap();
        assert_eq!(store.find_by_name("  standard "), Some(standard));
        assert_eq!(store.find_by_name("no such"), None);
    }

    #[test]
    fn builtin_schedules_shape() {
        let store = store_with_builtins();
        let standard = store.standard_instance().unwrap();
        let cal = store.get(standard).unwrap();
        assert_eq!(cal.working_day_count(), 5);
        assert_eq!(cal.days[0].ranges.len(), 2);

        let around_clock = store.find_by_name("24 Hours").unwrap();
        assert_eq!(store.get(around_clock).unwrap().working_day_count(), 7);
    }
}
