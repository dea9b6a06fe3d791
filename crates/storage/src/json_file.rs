//! JSON file data handle.
//!
//! Keeps the value in memory and persists it as a pretty-printed JSON
//! document on every write. The document is written to a temporary sibling
//! file first and then renamed over the target, so readers of the file never
//! observe a partial write.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use taskwire_core::{DataHandle, Scope, SharedHandle, Value, WriteError};
use tracing::{debug, warn};

/// Data handle persisted to a JSON file.
#[derive(Debug)]
pub struct JsonFileDataHandle {
    id: String,
    scope: Scope,
    path: PathBuf,
    cache: RwLock<Value>,
}

impl JsonFileDataHandle {
    /// Open a handle backed by `path`.
    ///
    /// An existing file is loaded; a missing one leaves `default` as the
    /// initial value without creating the file.
    pub fn open(
        id: impl Into<String>,
        scope: Scope,
        path: impl AsRef<Path>,
        default: Value,
    ) -> io::Result<Self> {
        let id = id.into();
        let path = path.as_ref().to_path_buf();

        let value = match fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => default,
            Err(e) => return Err(e),
        };
        debug!(handle = %id, path = %path.display(), "opened json handle");

        Ok(Self {
            id,
            scope,
            path,
            cache: RwLock::new(value),
        })
    }

    /// Open a handle already wrapped for sharing between tasks.
    pub fn open_shared(
        id: impl Into<String>,
        scope: Scope,
        path: impl AsRef<Path>,
        default: Value,
    ) -> io::Result<SharedHandle> {
        Ok(Arc::new(Self::open(id, scope, path, default)?))
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Temporary sibling used while persisting: the full file name plus `.tmp`.
    fn temp_path(&self) -> io::Result<PathBuf> {
        let file_name = self.path.file_name().ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "path has no file name")
        })?;
        let mut tmp = file_name.to_os_string();
        tmp.push(".tmp");
        Ok(self.path.with_file_name(tmp))
    }

    fn persist(&self, value: &Value) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value)?;
        let tmp = self.temp_path()?;
        fs::write(&tmp, json.as_bytes())?;
        fs::rename(&tmp, &self.path)
    }
}

impl DataHandle for JsonFileDataHandle {
    fn id(&self) -> &str {
        &self.id
    }

    fn scope(&self) -> Scope {
        self.scope
    }

    fn read(&self) -> Value {
        self.cache.read().clone()
    }

    fn write(&self, value: Value) -> Result<(), WriteError> {
        // Held across the file write so concurrent writers persist in order.
        let mut cache = self.cache.write();
        if let Err(e) = self.persist(&value) {
            warn!(handle = %self.id, path = %self.path.display(), "failed to persist value: {}", e);
            return Err(WriteError::backend(&self.id, e));
        }
        *cache = value;
        Ok(())
    }
}
