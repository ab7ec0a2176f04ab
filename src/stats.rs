use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::feed::FeedBatch;

/// Counters for one refresh cycle, logged after each publish.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct CycleStats {
    pub timestamp: DateTime<Utc>,

    // sources
    pub sources_ok: usize,
    pub sources_failed: usize,
    pub entities: usize,

    // pipeline
    pub records: usize,
    pub arrivals: usize,
    pub pages: usize,
}

impl CycleStats {
    pub fn from_batch(timestamp: DateTime<Utc>, batch: &FeedBatch) -> Self {
        CycleStats {
            timestamp,
            sources_ok: batch.sources_ok,
            sources_failed: batch.sources_failed,
            entities: batch.entities,
            records: batch.records.len(),
            ..Default::default()
        }
    }

    pub fn with_output(mut self, arrivals: usize, pages: usize) -> Self {
        self.arrivals = arrivals;
        self.pages = pages;
        self
    }

    pub fn pct(part: usize, total: usize) -> f64 {
        if total == 0 {
            0.0
        } else {
            (part as f64 / total as f64) * 100.0
        }
    }

    /// Share of configured sources that answered this cycle.
    pub fn source_uptime_pct(&self) -> f64 {
        Self::pct(self.sources_ok, self.sources_ok + self.sources_failed)
    }
}
