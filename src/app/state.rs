use serde::Serialize;
use time::OffsetDateTime;

use crate::config::ThemeName;
use crate::highlight::HighlightMarker;
use crate::notes::{Note, NoteId};
use crate::search::{self, EmptyState};
use crate::timefmt::format_relative;

/// What the presentation layer draws for one note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoteView {
    pub id: NoteId,
    pub content: String,
    pub rendered_text: String,
    pub visible: bool,
    pub pinned: bool,
    pub editing: bool,
    pub timestamp_label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewModel {
    pub notes: Vec<NoteView>,
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub empty_state: Option<EmptyState>,
    pub theme: ThemeName,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub toast: Option<String>,
}

impl ViewModel {
    pub fn visible(&self) -> impl Iterator<Item = &NoteView> {
        self.notes.iter().filter(|note| note.visible)
    }

    pub fn empty_message(&self) -> Option<&'static str> {
        self.empty_state.map(EmptyState::message)
    }
}

pub(crate) fn build_notes(
    ordered: &[&Note],
    query: &str,
    marker: &HighlightMarker,
    now: OffsetDateTime,
) -> (Vec<NoteView>, Option<EmptyState>) {
    let outcome = search::filter(ordered, query, marker);
    let notes = ordered
        .iter()
        .zip(outcome.entries)
        .map(|(note, entry)| NoteView {
            id: note.id(),
            content: note.content().to_string(),
            rendered_text: entry
                .rendered_text
                .unwrap_or_else(|| note.content().to_string()),
            visible: entry.visible,
            pinned: note.pinned(),
            editing: note.is_editing(),
            timestamp_label: format_relative(note.timestamp(), now),
        })
        .collect();
    (notes, outcome.empty_state)
}
