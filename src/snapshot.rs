//! The published board.
//!
//! [`SnapshotStore`] holds the current [`Snapshot`] behind a lock shared by
//! the single writer (the refresh loop) and any number of readers. Publishing
//! swaps in a whole new snapshot; nothing is ever edited in place, so a
//! reader sees either the previous cycle or the new one.

use std::sync::Arc;

use chrono::{DateTime, Local};
use serde::Serialize;
use tokio::sync::RwLock;

use crate::paginate::ArrivalPage;

/// Result of one refresh cycle, exactly as served to clients.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Snapshot {
    pub data: Vec<ArrivalPage>,
    /// Local wall-clock time of publication, `HH:MM:SS`; empty before the
    /// first cycle
    pub last_updated: String,
    pub total_sections: usize,
}

impl Snapshot {
    pub fn new(pages: Vec<ArrivalPage>, published_at: DateTime<Local>) -> Self {
        Self {
            total_sections: pages.len(),
            data: pages,
            last_updated: published_at.format("%H:%M:%S").to_string(),
        }
    }
}

/// Shared handle to the current snapshot. Cloning is cheap and every clone
/// sees the same state.
#[derive(Clone, Default)]
pub struct SnapshotStore {
    current: Arc<RwLock<Arc<Snapshot>>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the current snapshot with one built from `pages`.
    pub async fn publish(&self, pages: Vec<ArrivalPage>, published_at: DateTime<Local>) {
        let next = Arc::new(Snapshot::new(pages, published_at));
        *self.current.write().await = next;
    }

    /// The snapshot current at the time of the call. Later publishes do not
    /// affect the returned value.
    pub async fn read(&self) -> Arc<Snapshot> {
        self.current.read().await.clone()
    }
}
