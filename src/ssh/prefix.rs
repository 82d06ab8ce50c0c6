// ABOUTME: Lock-guarded prefix cell shared between a session owner and its relay tasks.
// ABOUTME: Values are replaced whole and read as snapshots.

use bytes::Bytes;
use parking_lot::Mutex;

/// Bytes appended to every outbound shell chunk, or unset.
///
/// `set` swaps in a new value and `get` clones out the current one, so a
/// reader observes either the old value or the new value in full. The lock
/// is held only for the swap or the clone, never across I/O.
#[derive(Debug, Default)]
pub struct Prefix {
    value: Mutex<Option<Bytes>>,
}

impl Prefix {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the current prefix.
    pub fn get(&self) -> Option<Bytes> {
        self.value.lock().clone()
    }

    pub fn set(&self, prefix: impl Into<Bytes>) {
        let prefix = prefix.into();
        *self.value.lock() = Some(prefix);
    }

    pub fn clear(&self) {
        *self.value.lock() = None;
    }
}
