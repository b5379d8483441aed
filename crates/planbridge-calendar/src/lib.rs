//! Calendar domain model for the planbridge scheduling bridge.
//!
//! A project calendar describes working time per weekday and may derive its
//! defaults from a *base* calendar, forming a directed inheritance graph.
//! This crate owns that graph ([`CalendarStore`]), the distinguished built-in
//! roots (Standard, Night Shift, 24 Hours), display-name normalization and
//! stable identity fingerprints, and the application of external work-week
//! descriptions onto a calendar.
//!
//! The persistence of the graph (flattening, cycle diagnostics, file formats)
//! lives in `planbridge-persist`; the concurrency bridge around the legacy
//! engine lives in `planbridge-engine`.

pub mod error;
pub mod ident;
pub mod model;
pub mod name;
pub mod store;
pub mod workweek;

pub use error::CalendarError;
pub use ident::NameDigest;
pub use model::{CalendarId, ProjectCalendar, WorkDay, WorkRange, MAX_RANGES_PER_DAY};
pub use name::{names_equal, normalize_for_comparison, sanitize_identifier};
pub use store::{CalendarStore, FIXED_ID_NIGHT_SHIFT, FIXED_ID_STANDARD, FIXED_ID_TWENTY_FOUR_HOURS};
pub use workweek::{apply_work_week, DayPlan, WorkWeek};
