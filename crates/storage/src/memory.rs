//! In-memory data handle.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use taskwire_core::{DataHandle, Scope, SharedHandle, Time, Value, WriteError};
use tracing::trace;

#[derive(Debug)]
struct Slot {
    value: Value,
    version: u64,
    last_edited_at: Option<Time>,
}

/// Data handle embedding its value in memory.
#[derive(Debug)]
pub struct InMemoryDataHandle {
    id: String,
    scope: Scope,
    slot: RwLock<Slot>,
    writable: AtomicBool,
}

impl InMemoryDataHandle {
    /// Create a handle holding `initial`.
    pub fn new(id: impl Into<String>, scope: Scope, initial: Value) -> Self {
        Self {
            id: id.into(),
            scope,
            slot: RwLock::new(Slot {
                value: initial,
                version: 0,
                last_edited_at: None,
            }),
            writable: AtomicBool::new(true),
        }
    }

    /// Create a handle already wrapped for sharing between tasks.
    pub fn shared(id: impl Into<String>, scope: Scope, initial: Value) -> SharedHandle {
        Arc::new(Self::new(id, scope, initial))
    }

    /// Enable or disable writes. While disabled every write fails with
    /// [`WriteError::Disabled`] and the value is left untouched.
    pub fn set_writable(&self, writable: bool) {
        self.writable.store(writable, Ordering::SeqCst);
    }

    /// Whether writes are currently accepted.
    pub fn is_writable(&self) -> bool {
        self.writable.load(Ordering::SeqCst)
    }

    /// Number of successful writes so far.
    pub fn version(&self) -> u64 {
        self.slot.read().version
    }

    /// Time of the last successful write.
    pub fn last_edited_at(&self) -> Option<Time> {
        self.slot.read().last_edited_at
    }
}

impl DataHandle for InMemoryDataHandle {
    fn id(&self) -> &str {
        &self.id
    }

    fn scope(&self) -> Scope {
        self.scope
    }

    fn read(&self) -> Value {
        self.slot.read().value.clone()
    }

    fn write(&self, value: Value) -> Result<(), WriteError> {
        if !self.is_writable() {
            return Err(WriteError::Disabled {
                id: self.id.clone(),
            });
        }

        let mut slot = self.slot.write();
        slot.value = value;
        slot.version += 1;
        slot.last_edited_at = Some(chrono::Utc::now());
        trace!(handle = %self.id, version = slot.version, "value written");
        Ok(())
    }
}
