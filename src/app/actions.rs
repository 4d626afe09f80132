use crate::notes::NoteId;

/// Everything a presentation layer can ask the session to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Add { content: String, pinned: bool },
    Edit { id: NoteId, content: String },
    SetPinned { id: NoteId, pinned: bool },
    TogglePin { id: NoteId },
    Delete { id: NoteId },
    Search { query: String },
    BeginEdit { id: NoteId },
    EndEdit { id: NoteId },
    ToggleTheme,
}

impl Intent {
    pub fn add(content: impl Into<String>) -> Self {
        Intent::Add {
            content: content.into(),
            pinned: false,
        }
    }

    pub fn search(query: impl Into<String>) -> Self {
        Intent::Search {
            query: query.into(),
        }
    }

    pub(crate) fn name(&self) -> &'static str {
        match self {
            Intent::Add { .. } => "add",
            Intent::Edit { .. } => "edit",
            Intent::SetPinned { .. } => "set_pinned",
            Intent::TogglePin { .. } => "toggle_pin",
            Intent::Delete { .. } => "delete",
            Intent::Search { .. } => "search",
            Intent::BeginEdit { .. } => "begin_edit",
            Intent::EndEdit { .. } => "end_edit",
            Intent::ToggleTheme => "toggle_theme",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Created(NoteId),
    Changed,
    Unchanged,
}

impl Outcome {
    pub(crate) fn from_changed(changed: bool) -> Self {
        if changed {
            Outcome::Changed
        } else {
            Outcome::Unchanged
        }
    }

    pub fn created(self) -> Option<NoteId> {
        match self {
            Outcome::Created(id) => Some(id),
            _ => None,
        }
    }
}
