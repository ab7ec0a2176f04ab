//! Application state for the web layer.

use crate::snapshot::SnapshotStore;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Board published by the refresh loop
    pub snapshots: SnapshotStore,
}

impl AppState {
    pub fn new(snapshots: SnapshotStore) -> Self {
        Self { snapshots }
    }
}
