use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use greeter_core::{TraversalState, STATE_KEY};
use run_logging::{run_debug, run_info};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::persist::{PersistError, StateDir};

/// Flag-store key of the backend bearer token.
pub const AUTH_TOKEN_KEY: &str = "authToken";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Persist(#[from] PersistError),
    #[error("could not encode {key}: {message}")]
    Encode { key: String, message: String },
    #[error("stored {key} is unreadable: {message}")]
    Corrupt { key: String, message: String },
}

/// Navigation-surviving key/value storage. Each call is atomic for its key.
pub trait FlagStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn delete(&self, key: &str) -> Result<(), StoreError>;
}

#[derive(Debug, Default)]
pub struct MemoryFlagStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryFlagStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl FlagStore for MemoryFlagStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.lock().remove(key);
        Ok(())
    }
}

/// Stores each key as `{key}.ron` in a directory.
#[derive(Debug, Clone)]
pub struct FileFlagStore {
    dir: StateDir,
}

impl FileFlagStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: StateDir::new(dir),
        }
    }

    fn file_name(key: &str) -> String {
        format!("{key}.ron")
    }
}

impl FlagStore for FileFlagStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.dir.read(&Self::file_name(key))?)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.dir.write(&Self::file_name(key), value)?;
        run_debug!("Wrote {} to {:?}", key, path);
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        if self.dir.remove(&Self::file_name(key))? {
            run_debug!("Deleted {} from {:?}", key, self.dir.path());
        }
        Ok(())
    }
}

/// Typed access to the traversal record and the auth token.
///
/// Clones share the same backing store and the same lock.
#[derive(Clone)]
pub struct StateStore {
    flags: Arc<dyn FlagStore>,
    lock: Arc<Mutex<()>>,
}

impl StateStore {
    pub fn new(flags: Arc<dyn FlagStore>) -> Self {
        Self {
            flags,
            lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryFlagStore::new()))
    }

    pub fn load(&self) -> Result<Option<TraversalState>, StoreError> {
        let _guard = self.guard();
        self.read_value(STATE_KEY)
    }

    pub fn save(&self, state: &TraversalState) -> Result<(), StoreError> {
        let _guard = self.guard();
        self.write_value(STATE_KEY, state)?;
        run_debug!(
            "Saved traversal state {} ({}/{})",
            state.status.as_str(),
            state.processed_count,
            state.total_count
        );
        Ok(())
    }

    pub fn clear(&self) -> Result<(), StoreError> {
        let _guard = self.guard();
        self.flags.delete(STATE_KEY)?;
        run_info!("Traversal state cleared");
        Ok(())
    }

    pub fn auth_token(&self) -> Result<Option<String>, StoreError> {
        let _guard = self.guard();
        self.read_value(AUTH_TOKEN_KEY)
    }

    pub fn save_auth_token(&self, token: &str) -> Result<(), StoreError> {
        let _guard = self.guard();
        self.write_value(AUTH_TOKEN_KEY, &token.trim().to_string())
    }

    pub fn clear_auth_token(&self) -> Result<(), StoreError> {
        let _guard = self.guard();
        self.flags.delete(AUTH_TOKEN_KEY)
    }

    fn guard(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn read_value<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        let Some(raw) = self.flags.get(key)? else {
            return Ok(None);
        };
        ron::from_str(&raw)
            .map(Some)
            .map_err(|err| StoreError::Corrupt {
                key: key.to_string(),
                message: err.to_string(),
            })
    }

    fn write_value<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let pretty = ron::ser::PrettyConfig::new();
        let content =
            ron::ser::to_string_pretty(value, pretty).map_err(|err| StoreError::Encode {
                key: key.to_string(),
                message: err.to_string(),
            })?;
        self.flags.set(key, &content)
    }
}
