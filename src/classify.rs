//! Arrival filter and classifier.
//!
//! Keeps records for monitored stops that arrive within the look-ahead
//! window, then resolves each one's direction label and destination. The
//! designated route keeps the raw Northbound/Southbound labels here; every
//! other route is relabelled Uptown/Downtown. The designated route's own
//! display vocabulary is applied later, at pagination.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::BoardConfig;
use crate::feed::StopArrivalRecord;
use crate::reference::ReferenceTables;

/// Direction label resolved for a record, before any designated-route
/// display relabelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    Northbound,
    Southbound,
    Uptown,
    Downtown,
    Unknown,
}

impl Direction {
    pub fn label(self) -> &'static str {
        match self {
            Direction::Northbound => "Northbound",
            Direction::Southbound => "Southbound",
            Direction::Uptown => "Uptown",
            Direction::Downtown => "Downtown",
            Direction::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A train shown on the board.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifiedArrival {
    #[serde(rename = "route")]
    pub route_id: String,
    #[serde(rename = "minutes")]
    pub minutes_until_arrival: f64,
    pub stop_id: String,
    /// Empty when no headsign could be resolved
    pub destination: String,
}

/// Station/direction bucket an arrival is grouped under.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupKey {
    pub stop_id: String,
    pub direction: Direction,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Classified {
    pub key: GroupKey,
    pub arrival: ClassifiedArrival,
}

/// Minutes from `now` until `arrival_epoch_seconds`, fractional and signed.
///
/// `None` when the timestamp is too far out to express in milliseconds.
pub fn minutes_until(arrival_epoch_seconds: i64, now: DateTime<Utc>) -> Option<f64> {
    let delta_ms = arrival_epoch_seconds
        .checked_mul(1000)?
        .checked_sub(now.timestamp_millis())?;
    Some(delta_ms as f64 / 60_000.0)
}

/// Direction id implied by the platform suffix: `N` is 0, `S` is 1.
pub fn suffix_direction_id(stop_id: &str) -> Option<u32> {
    if stop_id.ends_with('N') {
        Some(0)
    } else if stop_id.ends_with('S') {
        Some(1)
    } else {
        None
    }
}

/// Resolves the grouping direction for a record.
///
/// An explicit `direction_id` wins (0 is Northbound, anything else
/// Southbound); otherwise the stop id suffix decides. Non-designated routes
/// are then relabelled Uptown/Downtown.
pub fn resolve_direction(record: &StopArrivalRecord, designated_route: &str) -> Direction {
    let direction = match record.direction_id {
        Some(0) => Direction::Northbound,
        Some(_) => Direction::Southbound,
        None => match suffix_direction_id(&record.stop_id) {
            Some(0) => Direction::Northbound,
            Some(_) => Direction::Southbound,
            None => Direction::Unknown,
        },
    };

    if record.route_id == designated_route {
        return direction;
    }

    match direction {
        Direction::Northbound => Direction::Uptown,
        Direction::Southbound => Direction::Downtown,
        other => other,
    }
}

/// Destination text for a record: the trip's own headsign, else the
/// route+direction headsign, else empty.
pub fn resolve_destination(record: &StopArrivalRecord, refs: &ReferenceTables) -> String {
    let by_trip = record
        .trip_id
        .as_deref()
        .and_then(|trip_id| refs.headsign_for_trip(trip_id))
        .filter(|h| !h.is_empty());
    if let Some(headsign) = by_trip {
        return headsign.to_string();
    }

    record
        .direction_id
        .or_else(|| suffix_direction_id(&record.stop_id))
        .and_then(|direction_id| refs.headsign_for_route_direction(&record.route_id, direction_id))
        .unwrap_or_default()
        .to_string()
}

/// Filters `records` to monitored stops inside `[0, window_minutes]` and
/// classifies the survivors, preserving input order.
pub fn classify(
    records: &[StopArrivalRecord],
    now: DateTime<Utc>,
    refs: &ReferenceTables,
    config: &BoardConfig,
) -> Vec<Classified> {
    records
        .iter()
        .filter(|r| config.monitored_stops.contains(&r.stop_id))
        .filter_map(|r| {
            let minutes = minutes_until(r.arrival_epoch_seconds, now)?;
            if !(0.0..=config.window_minutes).contains(&minutes) {
                return None;
            }

            Some(Classified {
                key: GroupKey {
                    stop_id: r.stop_id.clone(),
                    direction: resolve_direction(r, &config.designated_route),
                },
                arrival: ClassifiedArrival {
                    route_id: r.route_id.clone(),
                    minutes_until_arrival: minutes,
                    stop_id: r.stop_id.clone(),
                    destination: resolve_destination(r, refs),
                },
            })
        })
        .collect()
}
