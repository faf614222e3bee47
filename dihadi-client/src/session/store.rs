//! Session persistence
//!
//! A session is stored as a single record so the token and its expiry are
//! always written and removed together.

use chrono::{DateTime, Utc};
use dihadi_core::{DihadiResult, UserSummary};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

/// The persisted session record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSession {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    /// Whether the long window applies
    pub remember: bool,
    /// Storage expiry of the record itself; a reader discards it afterwards
    pub persist_until: DateTime<Utc>,
    #[serde(default)]
    pub user: Option<UserSummary>,
}

/// Backing storage for the current session
pub trait TokenStore: Send + Sync {
    fn load(&self) -> DihadiResult<Option<StoredSession>>;
    fn save(&self, session: &StoredSession) -> DihadiResult<()>;
    fn clear(&self) -> DihadiResult<()>;
}

/// Process-local store. Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryTokenStore {
    slot: Arc<Mutex<Option<StoredSession>>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> DihadiResult<Option<StoredSession>> {
        Ok(self.slot.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }

    fn save(&self, session: &StoredSession) -> DihadiResult<()> {
        *self.slot.lock().unwrap_or_else(|e| e.into_inner()) = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> DihadiResult<()> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner()).take();
        Ok(())
    }
}

/// JSON file store, kept under the user's data directory by default
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new<P: AsRef<Path>>(path: P) -> DihadiResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        info!("Session store initialized at: {}", path.display());
        Ok(Self { path })
    }

    /// `<data dir>/dihadi/session.json`, falling back to the working directory
    pub fn default_path() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("dihadi")
            .join("session.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> DihadiResult<Option<StoredSession>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let json_data = std::fs::read_to_string(&self.path)?;
        match serde_json::from_str(&json_data) {
            Ok(session) => {
                debug!("Loaded session from {}", self.path.display());
                Ok(Some(session))
            }
            Err(e) => {
                warn!(
                    "Discarding unreadable session file {}: {}",
                    self.path.display(),
                    e
                );
                self.clear()?;
                Ok(None)
            }
        }
    }

    fn save(&self, session: &StoredSession) -> DihadiResult<()> {
        let json_data = serde_json::to_string_pretty(session)?;

        // Write then rename so a crash never leaves half a record behind
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json_data)?;
        std::fs::rename(&tmp, &self.path)?;

        debug!("Saved session to {}", self.path.display());
        Ok(())
    }

    fn clear(&self) -> DihadiResult<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
            debug!("Deleted session file: {}", self.path.display());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record() -> StoredSession {
        let now = Utc::now();
        StoredSession {
            token: "token-1".to_string(),
            expires_at: now + Duration::minutes(30),
            last_activity: now,
            remember: false,
            persist_until: now + Duration::minutes(30),
            user: None,
        }
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryTokenStore::new();
        assert!(store.load().unwrap().is_none());

        let session = record();
        store.save(&session).unwrap();
        assert_eq!(store.clone().load().unwrap(), Some(session));

        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_file_store_persists_single_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join("nested").join("session.json")).unwrap();
        let session = record();

        store.save(&session).unwrap();
        let reopened = FileTokenStore::new(store.path()).unwrap();
        assert_eq!(reopened.load().unwrap(), Some(session));

        reopened.clear().unwrap();
        assert!(store.load().unwrap().is_none());
        assert!(!store.path().exists());
    }

    #[test]
    fn test_file_store_discards_corrupt_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{ not json").unwrap();

        let store = FileTokenStore::new(&path).unwrap();
        assert!(store.load().unwrap().is_none());
        assert!(!path.exists());
    }
}
