//! Data handle abstraction.

use std::sync::Arc;

use crate::{Scope, Value, WriteError};

/// A named, scoped container holding a single current value.
///
/// This trait allows different storage backends to be plugged in. The
/// execution engine only ever calls [`read`](DataHandle::read) and
/// [`write`](DataHandle::write); it never creates or destroys handles.
///
/// Implementations must make a successful write visible to subsequent
/// reads as a whole. A failed write leaves the previous value in place.
pub trait DataHandle: Send + Sync {
    /// Unique identifier of this handle.
    fn id(&self) -> &str;

    /// Scope the handle was created for.
    fn scope(&self) -> Scope;

    /// Current value: the last successfully written one, or the initial
    /// value if the handle was never written.
    fn read(&self) -> Value;

    /// Replace the current value.
    fn write(&self, value: Value) -> Result<(), WriteError>;
}

/// Data handle shared between tasks and their callers.
pub type SharedHandle = Arc<dyn DataHandle>;

impl std::fmt::Debug for dyn DataHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataHandle")
            .field("id", &self.id())
            .field("scope", &self.scope())
            .finish()
    }
}
