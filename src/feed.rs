//! Feed normalization: turns however many GTFS-RT sources answered this
//! cycle into one flat list of [`StopArrivalRecord`]s.
//!
//! Source failures never escape this module. Each one is logged with its
//! endpoint and counted in [`FeedBatch::sources_failed`]; the rest of the
//! batch goes ahead without it.

use std::path::Path;

use futures::future::join_all;
use tracing::{Instrument, debug, error, warn};

use crate::error::FeedError;
use crate::fetch::{HttpClient, fetch_bytes};
use crate::gtfs_rt::FeedMessage;
use crate::parser::parse_feed;

/// One predicted arrival of one trip at one platform.
#[derive(Debug, Clone, PartialEq)]
pub struct StopArrivalRecord {
    pub stop_id: String,
    pub route_id: String,
    /// `None` when the feed omits it or sends an empty string
    pub trip_id: Option<String>,
    pub direction_id: Option<u32>,
    pub arrival_epoch_seconds: i64,
}

/// Everything gathered from the configured sources in one cycle.
#[derive(Debug, Default)]
pub struct FeedBatch {
    pub records: Vec<StopArrivalRecord>,
    pub sources_ok: usize,
    pub sources_failed: usize,
    pub entities: usize,
}

/// Flattens every trip update in `feed` into arrival records.
///
/// Stop-time updates without a stop id or without an arrival time are
/// dropped, as are entities flagged for deletion.
pub fn records_from_feed(feed: &FeedMessage) -> Vec<StopArrivalRecord> {
    let mut records = Vec::new();

    for entity in &feed.entity {
        if entity.is_deleted == Some(true) {
            continue;
        }
        let Some(update) = &entity.trip_update else {
            continue;
        };

        let trip = &update.trip;
        let route_id = trip.route_id.clone().unwrap_or_default();
        let trip_id = trip.trip_id.clone().filter(|id| !id.is_empty());

        for stu in &update.stop_time_update {
            let arrival = stu.arrival.as_ref().and_then(|a| a.time);
            let (Some(stop_id), Some(arrival)) = (&stu.stop_id, arrival) else {
                continue;
            };

            records.push(StopArrivalRecord {
                stop_id: stop_id.clone(),
                route_id: route_id.clone(),
                trip_id: trip_id.clone(),
                direction_id: trip.direction_id,
                arrival_epoch_seconds: arrival,
            });
        }
    }

    records
}

/// Loads feed bytes from an `http(s)` URL or a local file path.
pub async fn load_source<C: HttpClient + ?Sized>(
    client: &C,
    source: &str,
) -> Result<Vec<u8>, FeedError> {
    if source.starts_with("http") {
        fetch_bytes(client, source).await
    } else {
        tokio::fs::read(source).await.map_err(|e| FeedError::Read {
            path: Path::new(source).to_path_buf(),
            source: e,
        })
    }
}

/// Loads and decodes a single source.
pub async fn fetch_feed<C: HttpClient + ?Sized>(
    client: &C,
    source: &str,
) -> Result<FeedMessage, FeedError> {
    let fetch_start = std::time::Instant::now();
    let bytes = load_source(client, source).await?;

    let elapsed = fetch_start.elapsed();
    if elapsed.as_secs() > 15 {
        warn!(elapsed_secs = elapsed.as_secs(), "Feed fetch was slow");
    }
    debug!(bytes = bytes.len(), "Feed bytes received, parsing");

    parse_feed(source, &bytes)
}

/// Fetches every source concurrently and merges whatever decoded.
///
/// Returns an empty batch, not an error, when every source fails.
pub async fn collect_records<C: HttpClient + ?Sized>(
    client: &C,
    sources: &[String],
) -> FeedBatch {
    let fetches = sources.iter().map(|source| {
        let span = tracing::info_span!("feed_source", endpoint = %source);
        async move { fetch_feed(client, source).await }.instrument(span)
    });

    let mut batch = FeedBatch::default();

    for (source, result) in sources.iter().zip(join_all(fetches).await) {
        match result {
            Ok(feed) => {
                let records = records_from_feed(&feed);
                debug!(
                    endpoint = %source,
                    entity_count = feed.entity.len(),
                    records = records.len(),
                    "Feed parsed successfully"
                );
                batch.sources_ok += 1;
                batch.entities += feed.entity.len();
                batch.records.extend(records);
            }
            Err(e) => {
                error!(endpoint = %source, error = %e, "Feed unavailable this cycle");
                batch.sources_failed += 1;
            }
        }
    }

    batch
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::BasicClient;
    use crate::gtfs_rt::trip_update::{StopTimeEvent, StopTimeUpdate};
    use crate::gtfs_rt::{FeedEntity, FeedHeader, TripDescriptor, TripUpdate};

    fn create_header() -> FeedHeader {
        FeedHeader {
            gtfs_realtime_version: "2.0".to_string(),
            timestamp: Some(1_700_000_000),
            incrementality: None,
            feed_version: None,
        }
    }

    fn stop_update(stop_id: Option<&str>, arrival: Option<i64>) -> StopTimeUpdate {
        StopTimeUpdate {
            stop_id: stop_id.map(str::to_string),
            arrival: Some(StopTimeEvent {
                time: arrival,
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn entity(id: &str, trip: TripDescriptor, updates: Vec<StopTimeUpdate>) -> FeedEntity {
        FeedEntity {
            id: id.to_string(),
            is_deleted: None,
            trip_update: Some(TripUpdate {
                trip,
                stop_time_update: updates,
                ..Default::default()
            }),
        }
    }

    #[test]
    fn test_records_from_feed_flattens_stop_time_updates() {
        let feed = FeedMessage {
            header: create_header(),
            entity: vec![entity(
                "e1",
                TripDescriptor {
                    trip_id: Some("T1".to_string()),
                    route_id: Some("L".to_string()),
                    direction_id: Some(1),
                    ..Default::default()
                },
                vec![
                    stop_update(Some("L03N"), Some(100)),
                    stop_update(Some("L02N"), Some(200)),
                ],
            )],
        };

        let records = records_from_feed(&feed);

        assert_eq!(records.len(), 2);
        assert_eq!(
            records[0],
            StopArrivalRecord {
                stop_id: "L03N".to_string(),
                route_id: "L".to_string(),
                trip_id: Some("T1".to_string()),
                direction_id: Some(1),
                arrival_epoch_seconds: 100,
            }
        );
        assert_eq!(records[1].stop_id, "L02N");
    }

    #[test]
    fn test_records_without_arrival_are_dropped() {
        let mut departure_only = stop_update(Some("635N"), None);
        departure_only.arrival = None;
        departure_only.departure = Some(StopTimeEvent {
            time: Some(500),
            ..Default::default()
        });

        let feed = FeedMessage {
            header: create_header(),
            entity: vec![entity(
                "e1",
                TripDescriptor {
                    route_id: Some("6".to_string()),
                    ..Default::default()
                },
                vec![
                    departure_only,
                    stop_update(Some("635N"), None),
                    stop_update(None, Some(300)),
                    stop_update(Some("635S"), Some(400)),
                ],
            )],
        };

        let records = records_from_feed(&feed);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].stop_id, "635S");
        assert_eq!(records[0].trip_id, None);
        assert_eq!(records[0].direction_id, None);
    }

    #[test]
    fn test_empty_trip_id_is_absent() {
        let feed = FeedMessage {
            header: create_header(),
            entity: vec![entity(
                "e1",
                TripDescriptor {
                    trip_id: Some(String::new()),
                    route_id: Some("R".to_string()),
                    ..Default::default()
                },
                vec![stop_update(Some("R20N"), Some(10))],
            )],
        };

        assert_eq!(records_from_feed(&feed)[0].trip_id, None);
    }

    #[test]
    fn test_deleted_and_non_trip_entities_are_skipped() {
        let mut deleted = entity(
            "gone",
            TripDescriptor::default(),
            vec![stop_update(Some("L03S"), Some(10))],
        );
        deleted.is_deleted = Some(true);

        let bare = FeedEntity {
            id: "bare".to_string(),
            is_deleted: None,
            trip_update: None,
        };

        let feed = FeedMessage {
            header: create_header(),
            entity: vec![deleted, bare],
        };

        assert!(records_from_feed(&feed).is_empty());
    }

    #[tokio::test]
    async fn test_missing_file_is_read_error() {
        let client = BasicClient::new();
        let err = load_source(&client, "/nonexistent/feed.pb").await.unwrap_err();
        assert!(matches!(err, FeedError::Read { .. }));
    }

    #[tokio::test]
    async fn test_invalid_url_is_endpoint_error() {
        let client = BasicClient::new();
        let err = load_source(&client, "http://").await.unwrap_err();
        assert!(matches!(err, FeedError::InvalidEndpoint { .. }));
    }

    #[tokio::test]
    async fn test_all_sources_failing_yields_empty_batch() {
        let client = BasicClient::new();
        let sources = vec!["/nonexistent/a.pb".to_string(), "http://".to_string()];

        let batch = collect_records(&client, &sources).await;

        assert!(batch.records.is_empty());
        assert_eq!(batch.sources_ok, 0);
        assert_eq!(batch.sources_failed, 2);
    }
}
