use serde::Serialize;

use crate::highlight::{build_literal_regex, highlight, HighlightMarker};
use crate::notes::{Note, NoteId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterEntry {
    pub id: NoteId,
    pub visible: bool,
    /// Content with matches marked. `None` for hidden notes.
    pub rendered_text: Option<String>,
}

/// Why nothing is on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyState {
    NoNotes,
    NoResults,
}

impl EmptyState {
    pub fn message(self) -> &'static str {
        match self {
            EmptyState::NoNotes => "No notes yet. Add one to get started.",
            EmptyState::NoResults => "No notes found.",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOutcome {
    /// Same order as the input.
    pub entries: Vec<FilterEntry>,
    pub empty_state: Option<EmptyState>,
}

impl FilterOutcome {
    pub fn visible_count(&self) -> usize {
        self.entries.iter().filter(|entry| entry.visible).count()
    }
}

/// Marks which notes contain `query` (case-insensitive, literal). A blank
/// query shows everything unmodified.
pub fn filter(notes: &[&Note], query: &str, marker: &HighlightMarker) -> FilterOutcome {
    let query = query.trim();
    let entries: Vec<FilterEntry> = if query.is_empty() {
        notes
            .iter()
            .map(|note| FilterEntry {
                id: note.id(),
                visible: true,
                rendered_text: Some(note.content().to_string()),
            })
            .collect()
    } else {
        match build_literal_regex(query) {
            Some(regex) => notes
                .iter()
                .map(|note| {
                    let visible = regex.is_match(note.content());
                    FilterEntry {
                        id: note.id(),
                        visible,
                        rendered_text: visible
                            .then(|| highlight(note.content(), &regex, marker)),
                    }
                })
                .collect(),
            None => {
                tracing::warn!(len = query.len(), "query too large to highlight; matching plainly");
                let needle = query.to_lowercase();
                notes
                    .iter()
                    .map(|note| {
                        let visible = note.content().to_lowercase().contains(&needle);
                        FilterEntry {
                            id: note.id(),
                            visible,
                            rendered_text: visible.then(|| note.content().to_string()),
                        }
                    })
                    .collect()
            }
        }
    };

    let empty_state = if notes.is_empty() {
        Some(EmptyState::NoNotes)
    } else if entries.iter().any(|entry| entry.visible) {
        None
    } else {
        Some(EmptyState::NoResults)
    };
    FilterOutcome {
        entries,
        empty_state,
    }
}
