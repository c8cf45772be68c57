//! Persisted session: an opaque bearer token plus the `{username, role}`
//! record, stored under the `token` and `user` keys.
//!
//! The [`SessionStore`] handle is cloned into every component that needs it.
//! Nothing is cached: each read goes back to the underlying store, so a
//! session cleared elsewhere is noticed on the next read.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use tracing::{debug, info, warn};

use qparchive_common::protocol::{Session, UserRecord};

pub const TOKEN_KEY: &str = "token";
pub const USER_KEY: &str = "user";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("session store I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("session store is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("session store lock poisoned")]
    Poisoned,
    #[error("browser storage unavailable: {0}")]
    Browser(String),
}

/// Persistent string key-value storage.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    /// Write all entries as one update.
    fn set_entries(&self, entries: &[(&str, String)]) -> Result<(), StoreError>;

    fn remove_entries(&self, keys: &[&str]) -> Result<(), StoreError>;
}

// ── in-memory ────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MemoryStore {
    map: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.map.read().ok()?.get(key).cloned()
    }

    fn set_entries(&self, entries: &[(&str, String)]) -> Result<(), StoreError> {
        let mut map = self.map.write().map_err(|_| StoreError::Poisoned)?;
        for (key, value) in entries {
            map.insert(key.to_string(), value.clone());
        }
        Ok(())
    }

    fn remove_entries(&self, keys: &[&str]) -> Result<(), StoreError> {
        let mut map = self.map.write().map_err(|_| StoreError::Poisoned)?;
        for key in keys {
            map.remove(*key);
        }
        Ok(())
    }
}

// ── file-backed ──────────────────────────────────────────────────────────

/// A JSON object on disk. Updates are written to a sibling `.tmp` file and
/// renamed over the original. On unix the file is readable by its owner only.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<HashMap<String, String>, StoreError> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) if text.trim().is_empty() => Ok(HashMap::new()),
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_map(&self, map: &HashMap<String, String>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let tmp = self.path.with_extension("tmp");
        // A leftover tmp file would keep its old mode.
        let _ = std::fs::remove_file(&tmp);

        let mut options = std::fs::OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(&tmp)?;
        file.write_all(&serde_json::to_vec_pretty(map)?)?;
        file.sync_all()?;
        drop(file);

        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        match self.read_map() {
            Ok(mut map) => map.remove(key),
            Err(e) => {
                warn!("Cannot read session file {}: {e}", self.path.display());
                None
            }
        }
    }

    fn set_entries(&self, entries: &[(&str, String)]) -> Result<(), StoreError> {
        // A corrupt file is replaced rather than blocking a fresh login.
        let mut map = self.read_map().unwrap_or_default();
        for (key, value) in entries {
            map.insert(key.to_string(), value.clone());
        }
        self.write_map(&map)
    }

    fn remove_entries(&self, keys: &[&str]) -> Result<(), StoreError> {
        let mut map = self.read_map().unwrap_or_default();
        for key in keys {
            map.remove(*key);
        }
        self.write_map(&map)
    }
}

// ── browser ──────────────────────────────────────────────────────────────

/// `window.localStorage`. The handle is looked up on every call, so the
/// store itself holds nothing and is `Send + Sync`.
#[cfg(feature = "hydrate")]
#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserStore;

#[cfg(feature = "hydrate")]
impl BrowserStore {
    fn storage() -> Result<web_sys::Storage, StoreError> {
        web_sys::window()
            .ok_or_else(|| StoreError::Browser("no window".into()))?
            .local_storage()
            .map_err(|e| StoreError::Browser(format!("{e:?}")))?
            .ok_or_else(|| StoreError::Browser("localStorage disabled".into()))
    }
}

#[cfg(feature = "hydrate")]
impl KeyValueStore for BrowserStore {
    fn get(&self, key: &str) -> Option<String> {
        match Self::storage() {
            Ok(storage) => storage.get_item(key).ok().flatten(),
            Err(e) => {
                warn!("{e}");
                None
            }
        }
    }

    fn set_entries(&self, entries: &[(&str, String)]) -> Result<(), StoreError> {
        let storage = Self::storage()?;
        for (key, value) in entries {
            storage
                .set_item(key, value)
                .map_err(|e| StoreError::Browser(format!("{e:?}")))?;
        }
        Ok(())
    }

    fn remove_entries(&self, keys: &[&str]) -> Result<(), StoreError> {
        let storage = Self::storage()?;
        for key in keys {
            storage
                .remove_item(key)
                .map_err(|e| StoreError::Browser(format!("{e:?}")))?;
        }
        Ok(())
    }
}

// ── session handle ───────────────────────────────────────────────────────

/// Cheap-to-clone handle over the persisted session entries.
#[derive(Clone)]
pub struct SessionStore {
    store: Arc<dyn KeyValueStore>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore").finish_non_exhaustive()
    }
}

impl SessionStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::new(Arc::new(FileStore::new(path)))
    }

    #[cfg(feature = "hydrate")]
    pub fn browser() -> Self {
        Self::new(Arc::new(BrowserStore))
    }

    /// Persist token and user together.
    pub fn set_session(&self, token: &str, user: &UserRecord) -> Result<(), StoreError> {
        let user_json = serde_json::to_string(user)?;
        self.store.set_entries(&[
            (TOKEN_KEY, token.to_string()),
            (USER_KEY, user_json),
        ])?;
        info!("Session stored for {} ({})", user.username, user.role);
        Ok(())
    }

    /// The current session, or `None` when either entry is missing or the
    /// user record does not parse.
    pub fn get_session(&self) -> Option<Session> {
        let token = self.token()?;
        let raw_user = self.store.get(USER_KEY)?;
        match serde_json::from_str::<UserRecord>(&raw_user) {
            Ok(user) => Some(Session { token, user }),
            Err(e) => {
                debug!("Stored user record unreadable, treating as logged out: {e}");
                None
            }
        }
    }

    /// Raw bearer token, if a non-empty one is stored.
    pub fn token(&self) -> Option<String> {
        self.store.get(TOKEN_KEY).filter(|t| !t.is_empty())
    }

    pub fn clear_session(&self) -> Result<(), StoreError> {
        self.store.remove_entries(&[TOKEN_KEY, USER_KEY])?;
        info!("Session cleared");
        Ok(())
    }
}

// ─── tests ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use qparchive_common::protocol::Role;

    fn user(role: Role) -> UserRecord {
        UserRecord {
            username: "asha".into(),
            role,
        }
    }

    fn temp_path(name: &str) -> PathBuf {
        let dir = std::env::temp_dir()
            .join("qparchive_session_test")
            .join(format!("{name}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir.join("session.json")
    }

    #[test]
    fn test_set_get_clear() {
        let sessions = SessionStore::in_memory();
        assert!(sessions.get_session().is_none());

        sessions.set_session("tok-1", &user(Role::Admin)).unwrap();
        let session = sessions.get_session().unwrap();
        assert_eq!(session.token, "tok-1");
        assert_eq!(session.user, user(Role::Admin));

        sessions.clear_session().unwrap();
        assert!(sessions.get_session().is_none());
        assert!(sessions.token().is_none());
    }

    #[test]
    fn test_partial_session_is_absent() {
        let store = Arc::new(MemoryStore::new());
        let sessions = SessionStore::new(store.clone());

        store.set_entries(&[(TOKEN_KEY, "tok".into())]).unwrap();
        assert!(sessions.get_session().is_none());

        store
            .set_entries(&[(USER_KEY, "{not json".into())])
            .unwrap();
        assert!(sessions.get_session().is_none());

        store
            .set_entries(&[(USER_KEY, r#"{"username":"a","role":"STUDENT"}"#.into())])
            .unwrap();
        assert!(sessions.get_session().is_some());

        store.set_entries(&[(TOKEN_KEY, String::new())]).unwrap();
        assert!(sessions.get_session().is_none());
    }

    #[test]
    fn test_file_store_round_trip_and_external_clear() {
        let path = temp_path("file");
        let a = SessionStore::file(&path);
        let b = SessionStore::file(&path);

        a.set_session("tok-2", &user(Role::Student)).unwrap();
        assert_eq!(b.get_session().unwrap().token, "tok-2");

        // Another handle clearing the file is seen on the next read.
        b.clear_session().unwrap();
        assert!(a.get_session().is_none());
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn test_file_store_corrupt_file_reads_as_empty() {
        let path = temp_path("corrupt");
        std::fs::write(&path, "garbage").unwrap();
        let sessions = SessionStore::file(&path);
        assert!(sessions.get_session().is_none());

        sessions.set_session("tok-3", &user(Role::Student)).unwrap();
        assert_eq!(sessions.token().as_deref(), Some("tok-3"));
    }

    #[cfg(unix)]
    #[test]
    fn test_file_store_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let path = temp_path("mode");
        // A world-readable leftover must not leak its mode into the new file.
        std::fs::write(path.with_extension("tmp"), "{}").unwrap();

        let sessions = SessionStore::file(&path);
        sessions.set_session("tok-4", &user(Role::Student)).unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o077, 0, "session file mode {mode:o}");

        sessions.clear_session().unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o077, 0);
    }

    #[test]
    fn test_poisoned_memory_store_reports_error() {
        let store = Arc::new(MemoryStore::new());
        let holder = store.clone();
        let _ = std::thread::spawn(move || {
            let _guard = holder.map.write().unwrap();
            panic!("writer died holding the lock");
        })
        .join();

        let sessions = SessionStore::new(store);
        assert!(matches!(
            sessions.set_session("tok-5", &user(Role::Admin)),
            Err(StoreError::Poisoned)
        ));
        assert!(matches!(sessions.clear_session(), Err(StoreError::Poisoned)));
    }
}
