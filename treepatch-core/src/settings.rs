//! Persisted key/value settings.
//!
//! Persists a flat JSON object at `<home>/.treepatch/settings.json`.
//! Writes use an atomic `.tmp` + rename.
//!
//! Consumers never touch the document directly; they hold a [`Setting`] for
//! the one value they care about, which keeps persistence injectable and
//! lets tests swap in a [`MemorySetting`].

use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::{io_err, CoreError};

/// On-disk settings payload.
pub type SettingsFile = BTreeMap<String, Value>;

/// Opaque get/set capability for one persisted value.
pub trait Setting<T>: Send + Sync {
    /// Current value; the type's default when nothing has been stored.
    fn get(&self) -> Result<T, CoreError>;

    fn set(&self, value: T) -> Result<(), CoreError>;
}

/// `~/.treepatch/settings.json`, rooted at `home`.
pub fn settings_path_at(home: &Path) -> PathBuf {
    home.join(".treepatch").join("settings.json")
}

/// The current user's home directory, the root for [`settings_path_at`].
pub fn home_dir() -> Result<PathBuf, CoreError> {
    dirs::home_dir().ok_or(CoreError::HomeNotFound)
}

/// Load the settings document. Returns an empty map if the file does not exist yet.
pub fn load(path: &Path) -> Result<SettingsFile, CoreError> {
    if !path.exists() {
        return Ok(SettingsFile::new());
    }
    let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    if contents.trim().is_empty() {
        return Ok(SettingsFile::new());
    }
    Ok(serde_json::from_str(&contents)?)
}

/// Save the settings document atomically.
pub fn save(path: &Path, settings: &SettingsFile) -> Result<(), CoreError> {
    let Some(dir) = path.parent() else {
        return Err(io_err(
            path,
            std::io::Error::other("invalid settings path"),
        ));
    };
    std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;

    let json = serde_json::to_string_pretty(settings)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, &json).map_err(|e| io_err(&tmp, e))?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(path, e));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// FileSetting
// ---------------------------------------------------------------------------

/// One key inside a settings document on disk.
///
/// Each `set` reloads the document first so other keys written by other
/// profiles survive.
#[derive(Debug)]
pub struct FileSetting<T> {
    path: PathBuf,
    key: String,
    lock: Mutex<()>,
    _value: PhantomData<fn() -> T>,
}

impl<T> FileSetting<T> {
    pub fn new(path: impl Into<PathBuf>, key: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            key: key.into(),
            lock: Mutex::new(()),
            _value: PhantomData,
        }
    }

    /// Setting stored in `<home>/.treepatch/settings.json`.
    pub fn at_home(home: &Path, key: impl Into<String>) -> Self {
        Self::new(settings_path_at(home), key)
    }
}

impl<T> Setting<T> for FileSetting<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    fn get(&self) -> Result<T, CoreError> {
        let settings = load(&self.path)?;
        match settings.get(&self.key) {
            Some(value) => Ok(serde_json::from_value(value.clone())?),
            None => Ok(T::default()),
        }
    }

    fn set(&self, value: T) -> Result<(), CoreError> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut settings = load(&self.path)?;
        settings.insert(self.key.clone(), serde_json::to_value(value)?);
        save(&self.path, &settings)
    }
}

// ---------------------------------------------------------------------------
// MemorySetting
// ---------------------------------------------------------------------------

/// In-process setting; nothing survives the process.
#[derive(Debug, Default)]
pub struct MemorySetting<T> {
    value: Mutex<T>,
}

impl<T> MemorySetting<T> {
    pub fn new(value: T) -> Self {
        Self {
            value: Mutex::new(value),
        }
    }
}

impl<T> Setting<T> for MemorySetting<T>
where
    T: Clone + Send,
{
    fn get(&self) -> Result<T, CoreError> {
        Ok(self.value.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }

    fn set(&self, value: T) -> Result<(), CoreError> {
        *self.value.lock().unwrap_or_else(|e| e.into_inner()) = value;
        Ok(())
    }
}
