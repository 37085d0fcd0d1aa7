//! Ownership of engine-allocated resources.

use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use bridge_proto::OwnedHandle;
use tracing::{debug, error, trace};

use crate::client::FfiClient;
use crate::engine::NativeEngine;
use crate::{FfiError, FfiResult, INVALID_HANDLE};

/// An engine-owned resource that is released exactly once.
///
/// The handle is released explicitly with [`release`](Self::release) or
/// implicitly when dropped. Whichever comes first wins; the engine sees a
/// single `drop_handle` call per id.
pub struct FfiHandle {
    id: AtomicU64,
    engine: Arc<dyn NativeEngine>,
    live: Arc<AtomicUsize>,
}

impl FfiHandle {
    pub(crate) fn new(engine: Arc<dyn NativeEngine>, live: Arc<AtomicUsize>, id: u64) -> Self {
        if id != INVALID_HANDLE {
            live.fetch_add(1, Ordering::Relaxed);
        }
        Self {
            id: AtomicU64::new(id),
            engine,
            live,
        }
    }

    /// Take ownership of a handle carried by a response or event.
    pub fn from_owned(client: &FfiClient, owned: &OwnedHandle) -> Self {
        client.acquire(owned.id)
    }

    /// Current id, or [`INVALID_HANDLE`] once released.
    pub fn id(&self) -> u64 {
        self.id.load(Ordering::Acquire)
    }

    /// Id for use in a request. Fails once the handle was released.
    pub fn checked_id(&self) -> FfiResult<u64> {
        match self.id() {
            INVALID_HANDLE => Err(FfiError::HandleReleased),
            id => Ok(id),
        }
    }

    /// Returns true until the handle is released.
    pub fn is_valid(&self) -> bool {
        self.id() != INVALID_HANDLE
    }

    /// Release the resource. Returns true if this call performed the release.
    ///
    /// A refusal from the engine is logged, not returned: the id is
    /// considered gone either way.
    pub fn release(&self) -> bool {
        let id = self.id.swap(INVALID_HANDLE, Ordering::AcqRel);
        if id == INVALID_HANDLE {
            return false;
        }

        self.live.fetch_sub(1, Ordering::Relaxed);
        if self.engine.drop_handle(id) {
            trace!(id, "Released handle");
        } else {
            error!(id, "Engine failed to drop handle");
        }
        true
    }
}

impl Drop for FfiHandle {
    fn drop(&mut self) {
        let id = self.id();
        if self.release() {
            debug!(id, "Handle released on drop");
        }
    }
}

impl fmt::Debug for FfiHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FfiHandle").field(&self.id()).finish()
    }
}
