// Persisted session state behind a key-value store.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Fixed key holding the saved session blob.
pub const SESSION_KEY: &str = "fut_club_data";

/// Opaque string blob store keyed by fixed string keys.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

// ---------------------------------------------------------------------------
// SQLite store
// ---------------------------------------------------------------------------

/// SQLite-backed store. Pass `":memory:"` for an ephemeral database.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open session database at {path}"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;",
        )
        .context("failed to set database pragmas")?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS session_state (
                key        TEXT PRIMARY KEY,
                value      TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
            );",
        )
        .context("failed to create session schema")?;

        Ok(SqliteStore {
            conn: Mutex::new(conn),
        })
    }

    /// Panics if the mutex is poisoned (another thread panicked while
    /// holding the lock). This should never happen in normal operation.
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("session database mutex poisoned")
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT value FROM session_state WHERE key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        )
        .optional()
        .with_context(|| format!("failed to read session key {key}"))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn();
        conn.execute(
            "INSERT OR REPLACE INTO session_state (key, value) VALUES (?1, ?2)",
            params![key, value],
        )
        .with_context(|| format!("failed to write session key {key}"))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let conn = self.conn();
        conn.execute("DELETE FROM session_state WHERE key = ?1", params![key])
            .with_context(|| format!("failed to remove session key {key}"))?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// Process-local store, used when no database is wanted and in tests.
#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    /// A poisoned map is still a consistent map: every write is a single
    /// insert or remove.
    fn values(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.values.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.values().remove(key);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Saved session
// ---------------------------------------------------------------------------

/// What "save session" persists: the raw export text, the coin balance and
/// the name of the imported file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedSession {
    pub csv: String,
    pub coins: u64,
    #[serde(default)]
    pub file_name: String,
    #[serde(default)]
    pub saved_at: Option<DateTime<Utc>>,
}

impl SavedSession {
    pub fn new(csv: String, coins: u64, file_name: String) -> Self {
        SavedSession {
            csv,
            coins,
            file_name,
            saved_at: Some(Utc::now()),
        }
    }
}

pub fn save_session(store: &dyn KeyValueStore, session: &SavedSession) -> Result<()> {
    let json = serde_json::to_string(session).context("failed to serialize session")?;
    store.set(SESSION_KEY, &json)?;
    info!(
        "saved session ({} bytes of CSV, {} coins)",
        session.csv.len(),
        session.coins
    );
    Ok(())
}

/// Load the saved session, if there is a usable one.
///
/// A missing blob, a store read failure, or a blob that does not decode are
/// all "no saved session". A corrupt blob is removed.
pub fn load_session(store: &dyn KeyValueStore) -> Option<SavedSession> {
    let raw = match store.get(SESSION_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            warn!("could not read saved session: {:#}", e);
            return None;
        }
    };

    match serde_json::from_str::<SavedSession>(&raw) {
        Ok(session) => Some(session),
        Err(e) => {
            warn!("discarding corrupt saved session: {}", e);
            if let Err(e) = store.remove(SESSION_KEY) {
                warn!("failed to remove corrupt session: {:#}", e);
            }
            None
        }
    }
}

pub fn clear_session(store: &dyn KeyValueStore) -> Result<()> {
    store.remove(SESSION_KEY)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> SqliteStore {
        SqliteStore::open(":memory:").expect("in-memory database should open")
    }

    #[test]
    fn open_creates_table() {
        let db = test_db();
        let conn = db.conn();
        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table'")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        assert!(tables.contains(&"session_state".to_string()));
    }

    #[test]
    fn sqlite_get_set_remove() {
        let db = test_db();
        assert_eq!(db.get("k").unwrap(), None);
        db.set("k", "one").unwrap();
        db.set("k", "two").unwrap();
        assert_eq!(db.get("k").unwrap().as_deref(), Some("two"));
        db.remove("k").unwrap();
        assert_eq!(db.get("k").unwrap(), None);
        db.remove("k").unwrap();
    }

    #[test]
    fn memory_get_set_remove() {
        let store = MemoryStore::new();
        store.set("a", "1").unwrap();
        assert_eq!(store.get("a").unwrap().as_deref(), Some("1"));
        store.remove("a").unwrap();
        assert!(store.get("a").unwrap().is_none());
    }

    #[test]
    fn session_round_trip_through_sqlite() {
        let db = test_db();
        let session = SavedSession::new("Name,ID\nA,1\n".into(), 50_000, "club.csv".into());
        save_session(&db, &session).unwrap();
        assert_eq!(load_session(&db), Some(session));
    }

    #[test]
    fn session_blob_uses_camel_case_keys() {
        let store = MemoryStore::new();
        save_session(&store, &SavedSession::new("x".into(), 1, "f.csv".into())).unwrap();
        let raw = store.get(SESSION_KEY).unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["fileName"], "f.csv");
        assert_eq!(value["coins"], 1);
    }

    #[test]
    fn legacy_blob_without_timestamp_loads() {
        let store = MemoryStore::new();
        store
            .set(SESSION_KEY, r#"{"csv":"a","coins":42,"fileName":"old.csv"}"#)
            .unwrap();
        let session = load_session(&store).unwrap();
        assert_eq!(session.coins, 42);
        assert_eq!(session.saved_at, None);
    }

    #[test]
    fn missing_session_is_none() {
        assert!(load_session(&MemoryStore::new()).is_none());
    }

    #[test]
    fn corrupt_session_is_none_and_removed() {
        let store = MemoryStore::new();
        store.set(SESSION_KEY, "{not json").unwrap();
        assert!(load_session(&store).is_none());
        assert!(store.get(SESSION_KEY).unwrap().is_none());

        store.set(SESSION_KEY, r#"{"csv":"a","coins":-5}"#).unwrap();
        assert!(load_session(&store).is_none());
    }

    #[test]
    fn clear_session_removes_blob() {
        let store = MemoryStore::new();
        save_session(&store, &SavedSession::new("x".into(), 1, String::new())).unwrap();
        clear_session(&store).unwrap();
        assert!(load_session(&store).is_none());
    }

    #[test]
    fn memory_store_survives_poisoned_lock() {
        let store = std::sync::Arc::new(MemoryStore::new());
        store.set("k", "v").unwrap();

        let holder = std::sync::Arc::clone(&store);
        let result = std::thread::spawn(move || {
            let _guard = holder.values();
            panic!("writer died holding the lock");
        })
        .join();
        assert!(result.is_err());

        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
        store.remove("k").unwrap();
        assert!(store.get("k").unwrap().is_none());
    }
}
