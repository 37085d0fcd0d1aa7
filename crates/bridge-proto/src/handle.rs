//! Engine-owned handle references.

use serde::{Deserialize, Serialize};

/// An id for a resource owned by the engine, as carried in responses and
/// events. Wrapping it in a releasing owner is the runtime's job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OwnedHandle {
    /// Engine-side id. Zero means "no handle".
    pub id: u64,
}

impl OwnedHandle {
    /// Create a handle reference for the given id.
    pub fn new(id: u64) -> Self {
        Self { id }
    }
}
