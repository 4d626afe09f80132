//! Note records and the store that owns their lifecycle.
//!
//! The store is the only writer to the [`NoteGateway`]: every mutation that
//! changes persisted state flushes the whole collection before returning.
//! A failed flush is logged and leaves the in-memory notes authoritative.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::storage::{NoteGateway, StoredNote};

pub mod sort;

/// Session-scoped identity for a note. Not persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(Uuid);

impl NoteId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for NoteId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for NoteId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

pub trait Clock: Send + Sync {
    fn now(&self) -> OffsetDateTime;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<OffsetDateTime>,
}

impl ManualClock {
    pub fn new(start: OffsetDateTime) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn set(&self, now: OffsetDateTime) {
        *self.now.lock() = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> OffsetDateTime {
        *self.now.lock()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    id: NoteId,
    content: String,
    timestamp: OffsetDateTime,
    pinned: bool,
    editing: bool,
}

impl Note {
    pub(crate) fn restored(content: String, timestamp: OffsetDateTime, pinned: bool) -> Self {
        Self {
            id: NoteId::new(),
            content,
            timestamp,
            pinned,
            editing: false,
        }
    }

    pub fn id(&self) -> NoteId {
        self.id
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Instant of the last non-blank content edit.
    pub fn timestamp(&self) -> OffsetDateTime {
        self.timestamp
    }

    pub fn pinned(&self) -> bool {
        self.pinned
    }

    pub fn is_editing(&self) -> bool {
        self.editing
    }

    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }
}

pub struct NoteStore {
    notes: IndexMap<NoteId, Note>,
    gateway: NoteGateway,
    clock: Arc<dyn Clock>,
    degraded: bool,
}

impl NoteStore {
    /// Loads persisted notes. Unreadable or malformed storage yields an empty
    /// store rather than an error.
    pub fn open(gateway: NoteGateway, clock: Arc<dyn Clock>) -> Self {
        let records = gateway.load(clock.now());
        let mut store = Self {
            notes: IndexMap::with_capacity(records.len()),
            gateway,
            clock,
            degraded: false,
        };
        for record in records {
            store.restore(record);
        }
        tracing::info!(count = store.notes.len(), "loaded notes");
        store
    }

    fn restore(&mut self, record: StoredNote) -> NoteId {
        let note = Note::restored(record.content, record.timestamp, record.pinned);
        let id = note.id;
        self.notes.insert(id, note);
        id
    }

    /// Appends a note in edit mode. `timestamp` defaults to now.
    pub fn create(
        &mut self,
        content: impl Into<String>,
        pinned: bool,
        timestamp: Option<OffsetDateTime>,
    ) -> NoteId {
        let timestamp = timestamp.unwrap_or_else(|| self.clock.now());
        let mut note = Note::restored(content.into(), timestamp, pinned);
        note.editing = true;
        let id = note.id;
        self.notes.insert(id, note);
        tracing::debug!(%id, "created note");
        self.flush();
        id
    }

    /// Replaces a note's content and bumps its timestamp.
    ///
    /// Blank content is kept as an unsaved draft: the timestamp stays put and
    /// nothing is flushed. [`NoteStore::prune_empty`] discards such drafts.
    pub fn edit(&mut self, id: NoteId, content: &str) {
        let now = self.clock.now();
        let Some(note) = self.notes.get_mut(&id) else {
            tracing::debug!(%id, "edit for unknown note ignored");
            return;
        };
        note.content.clear();
        note.content.push_str(content);
        if content.trim().is_empty() {
            return;
        }
        // never move backward, even if the wall clock does
        note.timestamp = note.timestamp.max(now);
        self.flush();
    }

    /// Returns whether the flag changed.
    pub fn set_pinned(&mut self, id: NoteId, pinned: bool) -> bool {
        let Some(note) = self.notes.get_mut(&id) else {
            return false;
        };
        if note.pinned == pinned {
            return false;
        }
        note.pinned = pinned;
        self.flush();
        true
    }

    pub fn toggle_pinned(&mut self, id: NoteId) -> Option<bool> {
        let pinned = !self.notes.get(&id)?.pinned;
        self.set_pinned(id, pinned);
        Some(pinned)
    }

    /// Deleting an unknown id is a no-op.
    pub fn delete(&mut self, id: NoteId) -> bool {
        if self.notes.shift_remove(&id).is_none() {
            return false;
        }
        tracing::debug!(%id, "deleted note");
        self.flush();
        true
    }

    pub fn begin_edit(&mut self, id: NoteId) -> bool {
        match self.notes.get_mut(&id) {
            Some(note) => {
                note.editing = true;
                true
            }
            None => false,
        }
    }

    /// Leaves edit mode and discards the note if it ended up blank.
    pub fn end_edit(&mut self, id: NoteId) -> bool {
        let Some(note) = self.notes.get_mut(&id) else {
            return false;
        };
        note.editing = false;
        self.prune_empty();
        true
    }

    /// Removes every blank note, returning how many were dropped.
    pub fn prune_empty(&mut self) -> usize {
        let before = self.notes.len();
        self.notes.retain(|_, note| !note.is_blank());
        let removed = before - self.notes.len();
        if removed > 0 {
            tracing::debug!(removed, "pruned blank notes");
            self.flush();
        }
        removed
    }

    /// Notes in display order.
    pub fn all(&self) -> Vec<&Note> {
        ordered(&self.notes)
    }

    pub fn get(&self, id: NoteId) -> Option<&Note> {
        self.notes.get(&id)
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn now(&self) -> OffsetDateTime {
        self.clock.now()
    }

    pub fn gateway(&self) -> &NoteGateway {
        &self.gateway
    }

    /// True while the last flush attempt failed.
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    fn flush(&mut self) {
        let notes = ordered(&self.notes);
        match self.gateway.save(&notes) {
            Ok(()) => {
                if self.degraded {
                    tracing::info!("storage available again; notes persisted");
                }
                self.degraded = false;
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to persist notes; continuing in memory");
                self.degraded = true;
            }
        }
    }
}

fn ordered(notes: &IndexMap<NoteId, Note>) -> Vec<&Note> {
    let mut ordered: Vec<&Note> = notes.values().collect();
    sort::sort_notes(&mut ordered);
    ordered
}
