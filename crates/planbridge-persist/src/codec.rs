//! Calendar graph codec
//!
//! A depth-first walk with explicit coloring: a visited cache (black) makes
//! every distinct node encode exactly once even when several derived
//! calendars share a base, and an ordered in-flight set (gray) catches any
//! revisit of a node whose base edge is still being resolved. Revisit
//! detection is exact, never a maximum-depth heuristic, because
//! legitimate inheritance chains can be arbitrarily long; only re-entering
//! a node already in progress is an error.
//!
//! Two special rules from the domain:
//!
//! - A base edge pointing at the distinguished Standard root encodes as *no*
//!   base reference, breaking the common case where everything implicitly
//!   derives from Standard.
//! - Decoding attaches base edges through [`CalendarStore::set_base`], so
//!   the store's own cycle guard backs the decoder's in-flight check; a
//!   rejected link propagates as a load failure, never silently dropped.
//!
//! Decoding deliberately threads no reindexing context through the
//! recursion: a record already in the decoder's cache is reused, not
//! re-registered, so a calendar introduced earlier in the same load is
//! never added twice.

use crate::error::PersistError;
use crate::record::CalendarRecord;
use indexmap::IndexSet;
use planbridge_calendar::{CalendarError, CalendarId, CalendarStore};
use std::collections::HashMap;

/// Encode the given calendars (and, transitively, their bases) into a flat
/// record collection.
///
/// An empty input yields an empty output without error.
pub fn encode_all(
    store: &CalendarStore,
    ids: &[CalendarId],
) -> Result<Vec<CalendarRecord>, PersistError> {
    let mut encoder = Encoder {
        store,
        standard: store.standard_instance().ok(),
        cache: HashMap::new(),
        in_flight: IndexSet::new(),
        out: Vec::with_capacity(ids.len()),
    };
    for &id in ids {
        encoder.encode_node(id)?;
    }
    Ok(encoder.out)
}

/// Encode every calendar the store holds.
pub fn encode_store(store: &CalendarStore) -> Result<Vec<CalendarRecord>, PersistError> {
    encode_all(store, &store.ids())
}

/// Materialize records into calendar nodes, adding each to the store.
///
/// Returns the store ids of the materialized calendars, in record order.
/// An empty input yields an empty output without error.
pub fn decode_all(
    records: &[CalendarRecord],
    store: &mut CalendarStore,
) -> Result<Vec<CalendarId>, PersistError> {
    let mut decoder = Decoder {
        records: records.iter().map(|r| (r.unique_id, r)).collect(),
        cache: HashMap::new(),
        in_flight: IndexSet::new(),
    };
    let mut out = Vec::with_capacity(records.len());
    for record in records {
        out.push(decoder.decode_record(record.unique_id, store)?);
    }
    Ok(out)
}

struct Encoder<'a> {
    store: &'a CalendarStore,
    standard: Option<CalendarId>,
    /// node -> index of its record in `out` (each node encoded exactly once)
    cache: HashMap<CalendarId, usize>,
    /// nodes whose base edge is not yet resolved, in traversal order
    in_flight: IndexSet<CalendarId>,
    out: Vec<CalendarRecord>,
}

impl Encoder<'_> {
    fn encode_node(&mut self, id: CalendarId) -> Result<usize, PersistError> {
        if let Some(&idx) = self.cache.get(&id) {
            return Ok(idx);
        }
        let calendar = self
            .store
            .get(id)
            .ok_or(CalendarError::UnknownCalendar(id))?;
        let idx = self.out.len();
        self.out.push(CalendarRecord::from_scalars(calendar));
        self.cache.insert(id, idx);
        self.in_flight.insert(id);
        let resolved = self.resolve_base(id, idx, calendar.base);
        // In-flight membership must not leak past this node's frame,
        // whether the recursion succeeded or is propagating a failure.
        self.in_flight.shift_remove(&id);
        resolved?;
        Ok(idx)
    }

    fn resolve_base(
        &mut self,
        id: CalendarId,
        idx: usize,
        base: Option<CalendarId>,
    ) -> Result<(), PersistError> {
        let Some(base_id) = base else { return Ok(()) };
        // The Standard root is the chain terminator: an edge to it, or a raw
        // reference out of it, encodes as no base.
        if Some(id) == self.standard || Some(base_id) == self.standard {
            return Ok(());
        }
        if self.in_flight.contains(&base_id) {
            return Err(self.cycle_error(id, base_id));
        }
        let base_idx = self.encode_node(base_id)?;
        self.out[idx].base = Some(self.out[base_idx].unique_id);
        Ok(())
    }

    fn cycle_error(&self, id: CalendarId, base_id: CalendarId) -> PersistError {
        let name = |cid: CalendarId| {
            self.store
                .get(cid)
                .map(|c| c.name.clone())
                .unwrap_or_default()
        };
        let chain = self
            .in_flight
            .iter()
            .map(|cid| format!("'{}' ({})", name(*cid), cid.0))
            .collect::<Vec<_>>()
            .join(" -> ");
        tracing::error!(
            node = %name(id),
            base = %name(base_id),
            %chain,
            "calendar cycle detected during encode"
        );
        PersistError::CalendarCycle {
            node: name(id),
            node_id: id.0,
            base: name(base_id),
            base_id: base_id.0,
            chain,
        }
    }
}

struct Decoder<'a> {
    records: HashMap<u64, &'a CalendarRecord>,
    /// record identity -> materialized node (reused, never re-registered)
    cache: HashMap<u64, CalendarId>,
    in_flight: IndexSet<u64>,
}

impl Decoder<'_> {
    fn decode_record(
        &mut self,
        id: u64,
        store: &mut CalendarStore,
    ) -> Result<CalendarId, PersistError> {
        if let Some(&cal_id) = self.cache.get(&id) {
            return Ok(cal_id);
        }
        let record = *self
            .records
            .get(&id)
            .ok_or(PersistError::DanglingBase { record: id, base: id })?;
        let cal_id = store.add(record.to_scalars())?;
        self.cache.insert(id, cal_id);
        self.in_flight.insert(id);
        let attached = self.attach_base(record, cal_id, store);
        self.in_flight.shift_remove(&id);
        attached?;
        Ok(cal_id)
    }

    fn attach_base(
        &mut self,
        record: &CalendarRecord,
        cal_id: CalendarId,
        store: &mut CalendarStore,
    ) -> Result<(), PersistError> {
        let Some(base_id) = record.base else { return Ok(()) };
        if self.in_flight.contains(&base_id) {
            return Err(self.cycle_error(record.unique_id, base_id));
        }
        if !self.records.contains_key(&base_id) {
            return Err(PersistError::DanglingBase {
                record: record.unique_id,
                base: base_id,
            });
        }
        let base_cal = self.decode_record(base_id, store)?;
        // The store's own cycle guard has the final say; its rejection is a
        // load failure naming both ends.
        store.set_base(cal_id, base_cal)?;
        Ok(())
    }

    fn cycle_error(&self, id: u64, base_id: u64) -> PersistError {
        let name = |rid: u64| {
            self.records
                .get(&rid)
                .map(|r| r.name.clone())
                .unwrap_or_default()
        };
        let chain = self
            .in_flight
            .iter()
            .map(|rid| format!("'{}' ({rid})", name(*rid)))
            .collect::<Vec<_>>()
            .join(" -> ");
        tracing::error!(
            node = %name(id),
            base = %name(base_id),
            %chain,
            "calendar cycle detected during decode"
        );
        PersistError::CalendarCycle {
            node: name(id),
            node_id: id,
            base: name(base_id),
            base_id,
            chain,
        }
    }
}
