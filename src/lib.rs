pub mod app;
pub mod cli;
pub mod config;
pub mod highlight;
pub mod notes;
pub mod search;
pub mod storage;
pub mod timefmt;
pub mod toast;

pub use app::{Intent, Outcome, Session, ViewModel};
pub use config::{AppConfig, ConfigLoader, ConfigPaths};
pub use notes::{Note, NoteId, NoteStore};
