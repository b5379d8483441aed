//! Guarded persistence adapter
//!
//! Runs the calendar codec under the bridge's lock discipline: the encode
//! and decode walks hold the engine-wide access guard (the engine graph is
//! being read or mutated), while file access holds a per-file read/write
//! lock from the registry, a separate lock domain that lets unrelated
//! files be read concurrently.
//!
//! On disk a saved calendar set is the binary-with-metadata layout: the
//! `AC ED 00 05` header followed by the record collection encoded by the
//! generic object codec (serde_json). Duplicate display names found while
//! loading are repaired with a fingerprint suffix and audited.

use crate::codec::{decode_all, encode_store};
use crate::error::PersistError;
use crate::format::{detect_format, ProjectFileFormat};
use crate::record::CalendarRecord;
use planbridge_calendar::{sanitize_identifier, CalendarId, CalendarStore, NameDigest};
use planbridge_engine::{AccessGuard, AuditAction, AuditEntry, AuditSink, LockRegistry};
use std::fs::File;
use std::io::{BufReader, BufWriter, Seek, SeekFrom, Write};
use std::path::Path;

/// Header written in front of the record payload.
const SAVE_MAGIC: [u8; 4] = [0xAC, 0xED, 0x00, 0x05];

/// Persistence entry point bound to a specific guard, registry and sink.
pub struct CalendarPersistence<'a> {
    guard: &'a AccessGuard,
    locks: &'a LockRegistry,
    audit: &'a dyn AuditSink,
}

impl<'a> CalendarPersistence<'a> {
    #[must_use]
    pub fn new(guard: &'a AccessGuard, locks: &'a LockRegistry, audit: &'a dyn AuditSink) -> Self {
        Self { guard, locks, audit }
    }

    /// Flatten the store's calendar graph and write it to `path`.
    ///
    /// Returns the number of records written.
    pub fn save_calendars(
        &self,
        store: &CalendarStore,
        path: &Path,
    ) -> Result<usize, PersistError> {
        let name = file_lock_name(path)?;

        let records = self
            .guard
            .run_exclusive("encode calendars", || encode_store(store))?;

        let lock = self.locks.acquire_named_rw_lock(&name)?;
        let _write = lock.write();
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(&SAVE_MAGIC)?;
        serde_json::to_writer(&mut writer, &records)?;
        writer.flush()?;
        tracing::info!(path = %path.display(), count = records.len(), "saved calendar graph");
        Ok(records.len())
    }

    /// Read `path`, classify its layout, and materialize its calendars into
    /// the store.
    ///
    /// Returns the store ids of the loaded calendars.
    pub fn load_calendars(
        &self,
        path: &Path,
        store: &mut CalendarStore,
    ) -> Result<Vec<CalendarId>, PersistError> {
        let name = file_lock_name(path)?;

        let lock = self.locks.acquire_named_rw_lock(&name)?;
        let records: Vec<CalendarRecord> = {
            let _read = lock.read();
            let mut file = File::open(path)?;
            let format = detect_format(&mut file)?;
            if format != ProjectFileFormat::BinaryWithMetadata {
                tracing::warn!(path = %path.display(), ?format, "cannot load this layout");
                return Err(PersistError::UnsupportedFormat(format));
            }
            file.seek(SeekFrom::Start(SAVE_MAGIC.len() as u64))?;
            serde_json::from_reader(BufReader::new(&mut file))?
        };

        let ids = self.guard.run_exclusive("decode calendars", || {
            let ids = decode_all(&records, store)?;
            self.repair_duplicate_names(store, &ids);
            Ok::<_, PersistError>(ids)
        })?;
        tracing::info!(path = %path.display(), count = ids.len(), "loaded calendar graph");
        Ok(ids)
    }

    /// Rename loaded calendars whose display name collides with an earlier
    /// one, suffixing the sanitized name with its fingerprint, and audit the
    /// repair.
    fn repair_duplicate_names(&self, store: &mut CalendarStore, loaded: &[CalendarId]) {
        for &id in loaded {
            let Some(calendar) = store.get(id) else { continue };
            let original = calendar.name.clone();
            match store.find_by_name(&original) {
                Some(first) if first != id => {
                    let mut repaired =
                        format!("{}_{}", sanitize_identifier(&original), NameDigest::of(&original));
                    // Duplicates of one name share a digest; extend with the
                    // store id until the repaired name is itself free.
                    if store.find_by_name(&repaired).is_some_and(|taken| taken != id) {
                        repaired = format!("{}_{}", repaired, id.0);
                    }
                    tracing::warn!(
                        calendar = %id,
                        %original,
                        %repaired,
                        "duplicate calendar name detected on load"
                    );
                    if let Some(calendar) = store.get_mut(id) {
                        calendar.name = repaired.clone();
                    }
                    self.audit.record(AuditEntry::now(
                        original.clone(),
                        AuditAction::DuplicateDetected,
                        original,
                        repaired,
                    ));
                }
                _ => {}
            }
        }
    }
}

fn file_lock_name(path: &Path) -> Result<String, PersistError> {
    let name = path.to_string_lossy();
    if name.trim().is_empty() {
        return Err(PersistError::InvalidArgument(
            "file name must not be empty".to_string(),
        ));
    }
    Ok(format!("file:{name}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use planbridge_calendar::ProjectCalendar;
    use planbridge_engine::InMemoryAuditSink;

    struct Fixture {
        guard: AccessGuard,
        locks: LockRegistry,
        audit: InMemoryAuditSink,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                guard: AccessGuard::new(),
                locks: LockRegistry::new(),
                audit: InMemoryAuditSink::new(),
            }
        }

        fn persistence(&self) -> CalendarPersistence<'_> {
            CalendarPersistence::new(&self.guard, &self.locks, &self.audit)
        }
    }

    fn seeded_store() -> CalendarStore {
        let mut store = CalendarStore::new();
        let root = store.add(ProjectCalendar::new("Root").unwrap()).unwrap();
        let crew = store.add(ProjectCalendar::new("Crew A").unwrap()).unwrap();
        store.set_base(crew, root).unwrap();
        store
    }

    #[test]
    fn save_then_load_round_trips() {
        let fixture = Fixture::new();
        let persistence = fixture.persistence();
        let store = seeded_store();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("project.planbridge");

        let written = persistence.save_calendars(&store, &path).unwrap();
        assert_eq!(written, 2);

        let mut loaded = CalendarStore::new();
        let ids = persistence.load_calendars(&path, &mut loaded).unwrap();
        assert_eq!(ids.len(), 2);
        let crew = loaded.find_by_name("Crew A").unwrap();
        let root = loaded.find_by_name("Root").unwrap();
        assert_eq!(loaded.get(crew).unwrap().base, Some(root));
        assert!(fixture.audit.is_empty());
    }

    #[test]
    fn saved_file_carries_binary_metadata_magic() {
        let fixture = Fixture::new();
        let persistence = fixture.persistence();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("project.planbridge");
        persistence.save_calendars(&seeded_store(), &path).unwrap();

        let mut file = File::open(&path).unwrap();
        assert_eq!(
            detect_format(&mut file).unwrap(),
            ProjectFileFormat::BinaryWithMetadata
        );
    }

    #[test]
    fn load_rejects_xml_layout() {
        let fixture = Fixture::new();
        let persistence = fixture.persistence();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("project.xml");
        std::fs::write(&path, b"<?xml version=\"1.0\"?><project/>").unwrap();

        let mut store = CalendarStore::new();
        let result = persistence.load_calendars(&path, &mut store);
        assert!(matches!(
            result,
            Err(PersistError::UnsupportedFormat(ProjectFileFormat::XmlOnly))
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn load_rejects_corrupted_header() {
        let fixture = Fixture::new();
        let persistence = fixture.persistence();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("junk.bin");
        std::fs::write(&path, [0x00, 0x01]).unwrap();

        let mut store = CalendarStore::new();
        let result = persistence.load_calendars(&path, &mut store);
        assert!(matches!(
            result,
            Err(PersistError::UnsupportedFormat(ProjectFileFormat::Corrupted))
        ));
    }

    #[test]
    fn empty_file_name_is_invalid_argument() {
        let fixture = Fixture::new();
        let persistence = fixture.persistence();
        let store = CalendarStore::new();
        let result = persistence.save_calendars(&store, Path::new(""));
        assert!(matches!(result, Err(PersistError::InvalidArgument(_))));
    }

    #[test]
    fn duplicate_names_are_repaired_and_audited() {
        let fixture = Fixture::new();
        let persistence = fixture.persistence();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dupes.planbridge");

        let mut store = CalendarStore::new();
        store.add(ProjectCalendar::new("Crew A").unwrap()).unwrap();
        persistence.save_calendars(&store, &path).unwrap();

        // Loading into a store that already has a "Crew A" collides.
        let mut target = CalendarStore::new();
        target.add(ProjectCalendar::new("Crew A").unwrap()).unwrap();
        let ids = persistence.load_calendars(&path, &mut target).unwrap();
        assert_eq!(ids.len(), 1);

        let loaded = target.get(ids[0]).unwrap();
        assert_ne!(loaded.name, "Crew A");
        assert!(loaded.name.starts_with("Crew_A_"));

        let entries = fixture.audit.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, AuditAction::DuplicateDetected);
        assert_eq!(entries[0].old_value, "Crew A");
        assert_eq!(entries[0].new_value, loaded.name);
    }

    #[test]
    fn twin_duplicates_get_distinct_repaired_names() {
        let fixture = Fixture::new();
        let persistence = fixture.persistence();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("twins.planbridge");

        // Two saved calendars share one display name.
        let mut store = CalendarStore::new();
        store.add(ProjectCalendar::new("Crew A").unwrap()).unwrap();
        store.add(ProjectCalendar::new("Crew A").unwrap()).unwrap();
        persistence.save_calendars(&store, &path).unwrap();

        let mut target = CalendarStore::new();
        target.add(ProjectCalendar::new("Crew A").unwrap()).unwrap();
        let ids = persistence.load_calendars(&path, &mut target).unwrap();
        assert_eq!(ids.len(), 2);

        let first = &target.get(ids[0]).unwrap().name;
        let second = &target.get(ids[1]).unwrap().name;
        assert_ne!(first, "Crew A");
        assert_ne!(second, "Crew A");
        assert_ne!(first, second, "both twins repaired to the same name");
        assert_eq!(fixture.audit.entries().len(), 2);
    }
}
