//! The refresh loop: the only writer of the [`SnapshotStore`].
//!
//! Each cycle loads reference tables (first time only), collects records
//! from every feed source, classifies and paginates them, and publishes the
//! result. A failed cycle publishes nothing, so readers keep the last good
//! board and `last_updated` shows how stale it is.

use std::sync::Arc;

use chrono::{DateTime, Local, Utc};
use tracing::{error, info};

use crate::classify::classify;
use crate::config::BoardConfig;
use crate::error::RefreshCycleError;
use crate::feed::{FeedBatch, collect_records};
use crate::fetch::HttpClient;
use crate::paginate::{ArrivalPage, paginate};
use crate::reference::{ReferenceStore, ReferenceTables};
use crate::snapshot::SnapshotStore;
use crate::stats::CycleStats;

pub struct Refresher {
    client: Arc<dyn HttpClient>,
    config: BoardConfig,
    references: Arc<ReferenceStore>,
    store: SnapshotStore,
}

impl Refresher {
    pub fn new(
        client: Arc<dyn HttpClient>,
        config: BoardConfig,
        references: Arc<ReferenceStore>,
        store: SnapshotStore,
    ) -> Self {
        Self {
            client,
            config,
            references,
            store,
        }
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    /// Runs one cycle, measuring arrival times from the moment the feeds
    /// have been collected.
    pub async fn run_cycle(&self) -> Result<CycleStats, RefreshCycleError> {
        self.cycle(Utc::now).await
    }

    /// Runs one cycle with arrival times measured from `now`.
    pub async fn run_cycle_at(
        &self,
        now: DateTime<Utc>,
    ) -> Result<CycleStats, RefreshCycleError> {
        self.cycle(|| now).await
    }

    async fn cycle(
        &self,
        clock: impl FnOnce() -> DateTime<Utc>,
    ) -> Result<CycleStats, RefreshCycleError> {
        let refs = self.references.get().await?;
        let batch = collect_records(self.client.as_ref(), &self.config.feed_urls).await;

        let now = clock();
        let (pages, stats) = build_pages(&batch, &refs, &self.config, now);
        self.store.publish(pages, now.with_timezone(&Local)).await;
        Ok(stats)
    }

    /// Runs one cycle in its own task, so a panic costs only that cycle.
    pub async fn run_contained(self: &Arc<Self>) -> Result<CycleStats, RefreshCycleError> {
        let this = Arc::clone(self);
        tokio::spawn(async move { this.run_cycle().await })
            .await
            .unwrap_or_else(|e| Err(RefreshCycleError::Panicked(e.to_string())))
    }

    /// Refreshes forever: the nominal interval after a good cycle, the
    /// backoff interval after a failed or panicked one.
    pub async fn run_forever(self: Arc<Self>) {
        loop {
            let outcome = self.run_contained().await;

            let wait = match outcome {
                Ok(stats) => {
                    info!(
                        sources_ok = stats.sources_ok,
                        sources_failed = stats.sources_failed,
                        source_uptime_pct = stats.source_uptime_pct(),
                        entities = stats.entities,
                        records = stats.records,
                        arrivals = stats.arrivals,
                        pages = stats.pages,
                        "Snapshot published"
                    );
                    self.config.refresh_interval
                }
                Err(e) => {
                    error!(
                        error = %e,
                        backoff_secs = self.config.backoff_interval.as_secs(),
                        "Refresh cycle failed, keeping previous snapshot"
                    );
                    self.config.backoff_interval
                }
            };

            tokio::time::sleep(wait).await;
        }
    }
}

/// Pure part of a cycle: classify, paginate, count.
pub fn build_pages(
    batch: &FeedBatch,
    refs: &ReferenceTables,
    config: &BoardConfig,
    now: DateTime<Utc>,
) -> (Vec<ArrivalPage>, CycleStats) {
    let classified = classify(&batch.records, now, refs, config);
    let arrivals = classified.len();
    let pages = paginate(classified, refs, config);
    let stats = CycleStats::from_batch(now, batch).with_output(arrivals, pages.len());
    (pages, stats)
}
