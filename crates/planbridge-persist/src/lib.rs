//! Calendar graph persistence for the planbridge scheduling bridge.
//!
//! Converts the in-memory calendar inheritance graph into a flat,
//! file-storable collection of records and back:
//!
//! - [`record`] holds the persisted shape: scalar schedule fields plus at most
//!   one by-id reference to another record in the same collection.
//! - [`codec`] is the graph walk: a visited cache preserves one record per
//!   distinct node (shared ancestors are never duplicated), an in-flight
//!   set turns any revisit into a bounded, reported failure instead of
//!   unbounded recursion.
//! - [`format`] classifies a project file's first bytes before any
//!   deserialization is attempted.
//! - [`adapter`] ties the codec to the engine bridge: encoding and
//!   decoding run under the engine-wide access guard, file access under
//!   named read/write locks.

pub mod adapter;
pub mod codec;
pub mod error;
pub mod format;
pub mod record;

pub use adapter::CalendarPersistence;
pub use codec::{decode_all, encode_all, encode_store};
pub use error::PersistError;
pub use format::{detect_format, ProjectFileFormat, HEADER_LEN};
pub use record::{CalendarRecord, DayRecord, RangeRecord};
