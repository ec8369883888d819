// 🗄️ Record Store - named JSON collections in a local key-value store
// Every read and write is a full-collection round trip; nothing is cached.
//
// Two processes writing the same collection race: the last full write wins.

use chrono::Utc;
use log::{debug, warn};
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::RwLock;

use crate::error::{RegistryError, Result};
use crate::records::UserPreferences;

// ============================================================================
// COLLECTION NAMES
// ============================================================================

pub const POPULATION: &str = "populationData";
pub const DONATIONS: &str = "donationsData";
pub const PROJECTS: &str = "projectsData";
pub const REPRESENTATIVES: &str = "representatives";

/// Key of the preferences blob for a privileged account
pub fn preferences_key(email: &str) -> String {
    format!("userPrefs_{}", email)
}

// ============================================================================
// STORE TRAIT
// ============================================================================

/// Raw key → JSON text medium. Implementations must make writes durable
/// before returning.
pub trait RecordStore {
    /// Stored text for `key`, or None when the key was never written
    fn read_raw(&self, key: &str) -> Result<Option<String>>;

    /// Replace the value stored under `key`
    fn write_raw(&self, key: &str, value: &str) -> Result<()>;

    fn remove_raw(&self, key: &str) -> Result<()>;
}

/// A record type that lives in a named collection and has a stable id
pub trait Record: Serialize + DeserializeOwned + Clone {
    const COLLECTION: &'static str;

    fn id(&self) -> &str;
}

/// Load a collection; an absent key is an empty collection
pub fn load<T: DeserializeOwned>(store: &dyn RecordStore, collection: &str) -> Result<Vec<T>> {
    match store.read_raw(collection)? {
        Some(text) => serde_json::from_str(&text)
            .map_err(|e| RegistryError::storage(collection, format!("malformed JSON: {}", e))),
        None => Ok(Vec::new()),
    }
}

/// Load a collection, degrading any fault to an empty collection
pub fn load_or_empty<T: DeserializeOwned>(store: &dyn RecordStore, collection: &str) -> Vec<T> {
    match load(store, collection) {
        Ok(records) => records,
        Err(e) => {
            warn!("{}; continuing with an empty collection", e);
            Vec::new()
        }
    }
}

/// Rewrite a collection wholesale
pub fn save<T: Serialize>(store: &dyn RecordStore, collection: &str, records: &[T]) -> Result<()> {
    let text = serde_json::to_string(records)
        .map_err(|e| RegistryError::storage(collection, format!("serialize failed: {}", e)))?;
    store.write_raw(collection, &text)?;
    debug!("Saved {} record(s) to {}", records.len(), collection);
    Ok(())
}

// ============================================================================
// READ-MODIFY-WRITE HELPERS
// ============================================================================

pub fn load_all<T: Record>(store: &dyn RecordStore) -> Result<Vec<T>> {
    load(store, T::COLLECTION)
}

/// Append one record
pub fn insert_record<T: Record>(store: &dyn RecordStore, record: T) -> Result<()> {
    let mut all: Vec<T> = load(store, T::COLLECTION)?;
    all.push(record);
    save(store, T::COLLECTION, &all)
}

/// Replace the record with the same id
pub fn replace_record<T: Record>(store: &dyn RecordStore, record: T) -> Result<()> {
    let mut all: Vec<T> = load(store, T::COLLECTION)?;
    let slot = all
        .iter_mut()
        .find(|r| r.id() == record.id())
        .ok_or_else(|| RegistryError::not_found(T::COLLECTION, record.id()))?;
    *slot = record;
    save(store, T::COLLECTION, &all)
}

/// Remove the record with `id`, returning it
pub fn remove_record<T: Record>(store: &dyn RecordStore, id: &str) -> Result<T> {
    let mut all: Vec<T> = load(store, T::COLLECTION)?;
    let position = all
        .iter()
        .position(|r| r.id() == id)
        .ok_or_else(|| RegistryError::not_found(T::COLLECTION, id))?;
    let removed = all.remove(position);
    save(store, T::COLLECTION, &all)?;
    Ok(removed)
}

// ============================================================================
// PREFERENCES
// ============================================================================

pub fn load_preferences(store: &dyn RecordStore, email: &str) -> Result<Option<UserPreferences>> {
    let key = preferences_key(email);
    match store.read_raw(&key)? {
        Some(text) => serde_json::from_str(&text)
            .map(Some)
            .map_err(|e| RegistryError::storage(&key, format!("malformed JSON: {}", e))),
        None => Ok(None),
    }
}

pub fn save_preferences(store: &dyn RecordStore, email: &str, prefs: &UserPreferences) -> Result<()> {
    let key = preferences_key(email);
    let text = serde_json::to_string(prefs)
        .map_err(|e| RegistryError::storage(&key, format!("serialize failed: {}", e)))?;
    store.write_raw(&key, &text)
}

/// Forget an account's preferences; the next visit starts from defaults
pub fn clear_preferences(store: &dyn RecordStore, email: &str) -> Result<()> {
    store.remove_raw(&preferences_key(email))?;
    debug!("Cleared preferences for {}", email);
    Ok(())
}

/// Stamp `lastVisited`, creating the blob with `default_view` if absent
pub fn record_visit(store: &dyn RecordStore, email: &str, default_view: &str) -> Result<UserPreferences> {
    let mut prefs = match load_preferences(store, email) {
        Ok(Some(prefs)) => prefs,
        Ok(None) => UserPreferences::new(default_view),
        Err(e) => {
            warn!("{}; resetting preferences", e);
            UserPreferences::new(default_view)
        }
    };
    prefs.touch();
    save_preferences(store, email, &prefs)?;
    Ok(prefs)
}

/// `record_visit` for callers that must keep going: a fault is logged at
/// `warn` and yields None
pub fn record_visit_or_warn(store: &dyn RecordStore, email: &str, default_view: &str) -> Option<UserPreferences> {
    match record_visit(store, email, default_view) {
        Ok(prefs) => Some(prefs),
        Err(e) => {
            warn!("{}; visit not recorded for {}", e, email);
            None
        }
    }
}

// ============================================================================
// SQLITE BACKEND
// ============================================================================

/// Key-value table in a SQLite file, WAL journal
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .map_err(|e| RegistryError::storage("*", format!("cannot open {}: {}", path.display(), e)))?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| RegistryError::storage("*", e))?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        setup_database(&conn).map_err(|e| RegistryError::storage("*", e))?;
        Ok(SqliteStore { conn })
    }

    /// Keys currently stored
    pub fn keys(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT key FROM kv_store ORDER BY key")
            .map_err(|e| RegistryError::storage("*", e))?;
        let keys = stmt
            .query_map([], |row| row.get(0))
            .and_then(|rows| rows.collect::<std::result::Result<Vec<String>, _>>())
            .map_err(|e| RegistryError::storage("*", e))?;
        Ok(keys)
    }
}

fn setup_database(conn: &Connection) -> rusqlite::Result<()> {
    // WAL keeps each committed write durable without blocking readers
    conn.pragma_update(None, "journal_mode", "WAL")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS kv_store (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    Ok(())
}

impl RecordStore for SqliteStore {
    fn read_raw(&self, key: &str) -> Result<Option<String>> {
        self.conn
            .query_row("SELECT value FROM kv_store WHERE key = ?1", params![key], |row| row.get(0))
            .optional()
            .map_err(|e| RegistryError::storage(key, e))
    }

    fn write_raw(&self, key: &str, value: &str) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                params![key, value, Utc::now().to_rfc3339()],
            )
            .map_err(|e| RegistryError::storage(key, e))?;
        Ok(())
    }

    fn remove_raw(&self, key: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM kv_store WHERE key = ?1", params![key])
            .map_err(|e| RegistryError::storage(key, e))?;
        Ok(())
    }
}

// ============================================================================
// IN-MEMORY BACKEND
// ============================================================================

/// In-process store, used as a test double
#[derive(Default)]
pub struct MemoryStore {
    map: RwLock<HashMap<String, String>>,
    unavailable: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose medium is gone: every call fails
    pub fn unavailable() -> Self {
        MemoryStore {
            unavailable: true,
            ..Default::default()
        }
    }

    fn check(&self, key: &str) -> Result<()> {
        if self.unavailable {
            return Err(RegistryError::storage(key, "medium unavailable"));
        }
        Ok(())
    }
}

impl RecordStore for MemoryStore {
    fn read_raw(&self, key: &str) -> Result<Option<String>> {
        self.check(key)?;
        let map = self.map.read().map_err(|_| RegistryError::storage(key, "lock poisoned"))?;
        Ok(map.get(key).cloned())
    }

    fn write_raw(&self, key: &str, value: &str) -> Result<()> {
        self.check(key)?;
        let mut map = self.map.write().map_err(|_| RegistryError::storage(key, "lock poisoned"))?;
        map.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_raw(&self, key: &str) -> Result<()> {
        self.check(key)?;
        let mut map = self.map.write().map_err(|_| RegistryError::storage(key, "lock poisoned"))?;
        map.remove(key);
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================
