//! Session root: owns the note store, the toast queue, the active search
//! query and the theme, and routes [`Intent`]s to them.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::themes::resolve_theme;
use crate::config::{AppConfig, ThemeName};
use crate::highlight::HighlightMarker;
use crate::notes::{Clock, NoteStore};
use crate::storage::NoteGateway;
use crate::toast::{ToastEvent, ToastQueue};

mod actions;
pub mod state;

pub use actions::{Intent, Outcome};
pub use state::{NoteView, ViewModel};

const SAVE_FAILED_TOAST: &str = "Changes could not be saved";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Tick {
    pub toasts: Vec<ToastEvent>,
    /// Relative timestamp labels should be redrawn.
    pub labels_stale: bool,
}

pub struct Session {
    store: NoteStore,
    toasts: ToastQueue,
    query: String,
    theme: ThemeName,
    marker: HighlightMarker,
    label_refresh: Duration,
    labels_refreshed_at: Option<Instant>,
}

impl Session {
    pub fn open(
        config: &AppConfig,
        gateway: NoteGateway,
        clock: Arc<dyn Clock>,
        prefers_dark: bool,
    ) -> Self {
        let theme = resolve_theme(gateway.load_theme(), prefers_dark);
        let store = NoteStore::open(gateway, clock);
        tracing::info!(notes = store.len(), %theme, "session opened");
        Self {
            store,
            toasts: ToastQueue::new(config.toast.duration()),
            query: String::new(),
            theme,
            marker: config.highlight.clone(),
            label_refresh: config.label_refresh(),
            labels_refreshed_at: None,
        }
    }

    pub fn with_marker(mut self, marker: HighlightMarker) -> Self {
        self.marker = marker;
        self
    }

    pub fn dispatch(&mut self, intent: Intent, now: Instant) -> Outcome {
        tracing::debug!(intent = intent.name(), "dispatching intent");
        let was_degraded = self.store.is_degraded();
        let outcome = match intent {
            Intent::Add { content, pinned } => {
                Outcome::Created(self.store.create(content, pinned, None))
            }
            Intent::Edit { id, content } => {
                if self.store.get(id).is_none() {
                    Outcome::Unchanged
                } else {
                    self.store.edit(id, &content);
                    Outcome::Changed
                }
            }
            Intent::SetPinned { id, pinned } => {
                let changed = self.store.set_pinned(id, pinned);
                if changed {
                    self.toasts.enqueue(pin_message(pinned), now);
                }
                Outcome::from_changed(changed)
            }
            Intent::TogglePin { id } => match self.store.toggle_pinned(id) {
                Some(pinned) => {
                    self.toasts.enqueue(pin_message(pinned), now);
                    Outcome::Changed
                }
                None => Outcome::Unchanged,
            },
            Intent::Delete { id } => {
                let removed = self.store.delete(id);
                if removed {
                    self.toasts.enqueue("Note deleted", now);
                }
                Outcome::from_changed(removed)
            }
            Intent::Search { query } => {
                let changed = query != self.query;
                self.query = query;
                Outcome::from_changed(changed)
            }
            Intent::BeginEdit { id } => Outcome::from_changed(self.store.begin_edit(id)),
            Intent::EndEdit { id } => Outcome::from_changed(self.store.end_edit(id)),
            Intent::ToggleTheme => {
                self.theme = self.theme.toggled();
                if let Err(err) = self.store.gateway().save_theme(self.theme) {
                    tracing::warn!(error = %err, theme = %self.theme, "failed to persist theme");
                }
                self.toasts
                    .enqueue(format!("Switched to {} Mode", self.theme.title()), now);
                Outcome::Changed
            }
        };
        if !was_degraded && self.store.is_degraded() {
            self.toasts.enqueue(SAVE_FAILED_TOAST, now);
        }
        outcome
    }

    /// Current render model, with labels relative to `now`.
    pub fn view(&self, now: time::OffsetDateTime) -> ViewModel {
        let ordered = self.store.all();
        let (notes, empty_state) = state::build_notes(&ordered, &self.query, &self.marker, now);
        ViewModel {
            notes,
            query: self.query.clone(),
            empty_state,
            theme: self.theme,
            toast: self.toasts.current().map(|toast| toast.message.clone()),
        }
    }

    /// Advances scheduled work. The first call only starts the label
    /// refresh interval.
    pub fn tick(&mut self, now: Instant) -> Tick {
        let labels_stale = match self.labels_refreshed_at {
            Some(at) => now.saturating_duration_since(at) >= self.label_refresh,
            None => {
                self.labels_refreshed_at = Some(now);
                false
            }
        };
        if labels_stale {
            self.labels_refreshed_at = Some(now);
        }
        Tick {
            toasts: self.toasts.poll(now),
            labels_stale,
        }
    }

    pub fn store(&self) -> &NoteStore {
        &self.store
    }

    pub fn toasts(&self) -> &ToastQueue {
        &self.toasts
    }

    pub fn toasts_mut(&mut self) -> &mut ToastQueue {
        &mut self.toasts
    }

    pub fn theme(&self) -> ThemeName {
        self.theme
    }

    pub fn query(&self) -> &str {
        &self.query
    }
}

fn pin_message(pinned: bool) -> &'static str {
    if pinned {
        "Note pinned"
    } else {
        "Note unpinned"
    }
}
