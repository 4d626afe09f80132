use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use thiserror::Error;
use time::OffsetDateTime;

use crate::config::{StorageOptions, ThemeName};
use crate::notes::Note;

mod records;
mod schema;

pub use records::StoredNote;

pub const DEFAULT_NOTES_KEY: &str = "scribblyNotes";
pub const DEFAULT_THEME_KEY: &str = "scribblyTheme";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage unavailable: {reason}")]
    Unavailable { reason: String },
    #[error("creating data directory {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
    #[error("encoding notes record")]
    Encode(#[from] serde_json::Error),
    #[error("formatting note timestamp")]
    Timestamp(#[from] time::error::Format),
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// String-keyed durable namespace the notes record lives in.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;
}

pub struct SqliteStore {
    conn: Connection,
    path: PathBuf,
}

impl SqliteStore {
    pub fn open(path: &Path, options: &StorageOptions) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| StorageError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let conn = Connection::open(path)?;
        prepare_connection(&conn, options)?;
        schema::apply(&conn)?;
        tracing::debug!(path = %path.display(), "opened key-value store");
        Ok(Self {
            conn,
            path: path.to_path_buf(),
        })
    }

    pub fn database_path(&self) -> &Path {
        &self.path
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        self.conn.execute(
            "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value,
                                            updated_at = excluded.updated_at",
            params![key, value, now],
        )?;
        Ok(())
    }
}

fn prepare_connection(conn: &Connection, options: &StorageOptions) -> rusqlite::Result<()> {
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.pragma_update(
        None,
        "wal_autocheckpoint",
        options.wal_autocheckpoint.to_string(),
    )?;
    Ok(())
}

/// In-process store. Clones share the same contents, and it can be switched
/// off to behave like storage that is disabled or over quota.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryInner>>,
}

#[derive(Debug)]
struct MemoryInner {
    values: HashMap<String, String>,
    available: bool,
}

impl Default for MemoryInner {
    fn default() -> Self {
        Self {
            values: HashMap::new(),
            available: true,
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_available(&self, available: bool) {
        self.inner.lock().available = available;
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.inner.lock().values.get(key).cloned()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let inner = self.inner.lock();
        if !inner.available {
            return Err(StorageError::Unavailable {
                reason: "memory store disabled".into(),
            });
        }
        Ok(inner.values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut inner = self.inner.lock();
        if !inner.available {
            return Err(StorageError::Unavailable {
                reason: "memory store disabled".into(),
            });
        }
        inner.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Save/load boundary between the note store and durable storage.
pub struct NoteGateway {
    store: Box<dyn KeyValueStore>,
    notes_key: String,
    theme_key: String,
}

impl NoteGateway {
    pub fn new(
        store: Box<dyn KeyValueStore>,
        notes_key: impl Into<String>,
        theme_key: impl Into<String>,
    ) -> Self {
        Self {
            store,
            notes_key: notes_key.into(),
            theme_key: theme_key.into(),
        }
    }

    pub fn with_default_keys(store: Box<dyn KeyValueStore>) -> Self {
        Self::new(store, DEFAULT_NOTES_KEY, DEFAULT_THEME_KEY)
    }

    pub fn from_options(store: Box<dyn KeyValueStore>, options: &StorageOptions) -> Self {
        Self::new(store, &options.notes_key, &options.theme_key)
    }

    /// Overwrites the whole notes record. Blank notes are left out.
    pub fn save(&self, notes: &[&Note]) -> StorageResult<()> {
        let raw = records::encode(notes)?;
        self.store.set(&self.notes_key, &raw)
    }

    /// Missing timestamps default to `now`.
    pub fn load(&self, now: OffsetDateTime) -> Vec<StoredNote> {
        match self.store.get(&self.notes_key) {
            Ok(Some(raw)) => records::decode(&raw, now),
            Ok(None) => Vec::new(),
            Err(err) => {
                tracing::warn!(error = %err, "reading notes failed; starting empty");
                Vec::new()
            }
        }
    }

    pub fn load_theme(&self) -> Option<ThemeName> {
        let raw = match self.store.get(&self.theme_key) {
            Ok(raw) => raw?,
            Err(err) => {
                tracing::warn!(error = %err, "reading theme preference failed");
                return None;
            }
        };
        match ThemeName::from_str(raw.trim()) {
            Ok(theme) => Some(theme),
            Err(_) => {
                tracing::debug!(raw, "ignoring unknown stored theme");
                None
            }
        }
    }

    pub fn save_theme(&self, theme: ThemeName) -> StorageResult<()> {
        self.store.set(&self.theme_key, theme.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tempfile::TempDir;
    use time::macros::datetime;

    const NOW: OffsetDateTime = datetime!(2024-06-12 09:00:00 UTC);

    fn sqlite_store(root: &TempDir) -> StorageResult<SqliteStore> {
        let path = root.path().join("data").join("notes.db");
        SqliteStore::open(&path, &StorageOptions::default())
    }

    #[test]
    fn sqlite_store_upserts_values() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let store = sqlite_store(&temp)?;
        assert_eq!(store.get("missing")?, None);
        store.set("key", "one")?;
        store.set("key", "two")?;
        assert_eq!(store.get("key")?.as_deref(), Some("two"));
        assert!(store.database_path().exists());
        Ok(())
    }

    #[test]
    fn gateway_round_trips_through_sqlite() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let note = Note::restored("persist me".into(), datetime!(2024-05-30 17:45 UTC), true);
        {
            let gateway = NoteGateway::with_default_keys(Box::new(sqlite_store(&temp)?));
            gateway.save(&[&note])?;
        }
        let gateway = NoteGateway::with_default_keys(Box::new(sqlite_store(&temp)?));
        let loaded = gateway.load(NOW);
        assert_eq!(
            loaded,
            vec![StoredNote {
                content: "persist me".into(),
                timestamp: datetime!(2024-05-30 17:45 UTC),
                pinned: true,
            }]
        );
        Ok(())
    }

    #[test]
    fn save_overwrites_previous_record() -> anyhow::Result<()> {
        let backing = MemoryStore::new();
        let gateway = NoteGateway::with_default_keys(Box::new(backing.clone()));
        let first = Note::restored("first".into(), NOW, false);
        let second = Note::restored("second".into(), NOW, false);
        gateway.save(&[&first, &second])?;
        gateway.save(&[&second])?;
        let loaded = gateway.load(NOW);
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].content, "second");
        Ok(())
    }

    #[test]
    fn corrupt_record_loads_empty() -> anyhow::Result<()> {
        let backing = MemoryStore::new();
        backing.set(DEFAULT_NOTES_KEY, "not json")?;
        let gateway = NoteGateway::with_default_keys(Box::new(backing));
        assert!(gateway.load(NOW).is_empty());
        Ok(())
    }

    #[test]
    fn unavailable_store_reports_on_save_and_loads_empty() {
        let backing = MemoryStore::new();
        backing.set_available(false);
        let gateway = NoteGateway::with_default_keys(Box::new(backing));
        let note = Note::restored("x".into(), NOW, false);
        assert_matches!(gateway.save(&[&note]), Err(StorageError::Unavailable { .. }));
        assert!(gateway.load(NOW).is_empty());
    }

    #[test]
    fn theme_preference_uses_its_own_key() -> anyhow::Result<()> {
        let backing = MemoryStore::new();
        let gateway = NoteGateway::new(Box::new(backing.clone()), "n", "t");
        assert_eq!(gateway.load_theme(), None);
        gateway.save_theme(ThemeName::Dark)?;
        assert_eq!(backing.raw("t").as_deref(), Some("dark"));
        assert_eq!(gateway.load_theme(), Some(ThemeName::Dark));

        backing.set("t", "sepia")?;
        assert_eq!(gateway.load_theme(), None);
        Ok(())
    }
}
