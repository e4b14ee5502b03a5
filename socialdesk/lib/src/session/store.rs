//! Session persistence.
//!
//! The store owns the single active [`AuthModel`]. Reads fail soft: a missing,
//! unreadable or corrupt session is reported as "no session" and logged, so a
//! damaged file never blocks a request. Writes report their errors.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use fs2::FileExt;
use tracing::warn;

use crate::config::ApiConfig;
use crate::error::{ConfigError, StoreError};
use crate::session::AuthModel;

/// Directory under the user config dir that holds session files.
const SESSION_DIR: &str = "socialdesk";

/// Storage backend for the active session.
///
/// Implementations must be safe to share between concurrent requests;
/// overlapping writes resolve as last writer wins.
pub trait SessionStore: Send + Sync {
    /// Returns the stored session, or `None` when absent or unreadable.
    fn get(&self) -> Option<AuthModel>;

    /// Replaces the stored session.
    ///
    /// ## Errors
    ///
    /// Returns an error if the session cannot be written.
    fn set(&self, session: &AuthModel) -> Result<(), StoreError>;

    /// Deletes the stored session. Removing an absent session succeeds.
    ///
    /// ## Errors
    ///
    /// Returns an error if the session cannot be deleted.
    fn remove(&self) -> Result<(), StoreError>;
}

/// JSON file session storage.
///
/// Stores the session as a single JSON document with `fs2` file locking,
/// shared for reads and exclusive for writes.
///
/// ## Examples
///
/// ```no_run
/// use socialdesk_lib::session::{AuthModel, FileSessionStore, SessionStore};
///
/// let store = FileSessionStore::new("/tmp/socialdesk-auth-v1.json".into());
/// store.set(&AuthModel::new("token")).unwrap();
/// assert_eq!(store.get().unwrap().access_token, "token");
/// ```
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    /// Creates a store backed by the file at `path`.
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Creates a store in the user config directory, named after the
    /// config's storage key (e.g. `~/.config/socialdesk/socialdesk-auth-v1.json`).
    ///
    /// ## Errors
    ///
    /// Returns [`ConfigError::NoStorageDir`] if no config directory exists.
    pub fn for_config(config: &ApiConfig) -> Result<Self, ConfigError> {
        let dir = dirs::config_dir().ok_or(ConfigError::NoStorageDir)?;
        Ok(Self::new(
            dir.join(SESSION_DIR)
                .join(format!("{}.json", config.storage_key())),
        ))
    }

    /// Returns the path to the session file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Option<AuthModel>, StoreError> {
        let mut file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        file.lock_shared().map_err(|_| StoreError::Lock)?;
        let mut contents = String::new();
        let read = file.read_to_string(&mut contents);
        file.unlock().map_err(|_| StoreError::Lock)?;
        read?;

        if contents.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&contents)?))
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self) -> Option<AuthModel> {
        match self.read() {
            Ok(session) => session,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "ignoring unreadable session");
                None
            }
        }
    }

    fn set(&self, session: &AuthModel) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string(session)?;
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&self.path)?;

        file.lock_exclusive().map_err(|_| StoreError::Lock)?;
        let written = file
            .set_len(0)
            .and_then(|()| file.write_all(json.as_bytes()))
            .and_then(|()| file.flush());
        file.unlock().map_err(|_| StoreError::Lock)?;
        written?;
        Ok(())
    }

    fn remove(&self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-process session storage.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    session: Mutex<Option<AuthModel>>,
}

impl MemorySessionStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that already holds `session`.
    pub fn with_session(session: AuthModel) -> Self {
        Self {
            session: Mutex::new(Some(session)),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self) -> Option<AuthModel> {
        self.session
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    fn set(&self, session: &AuthModel) -> Result<(), StoreError> {
        *self
            .session
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(session.clone());
        Ok(())
    }

    fn remove(&self) -> Result<(), StoreError> {
        self.session
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .take();
        Ok(())
    }
}
