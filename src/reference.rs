//! Static GTFS reference data: stop names and trip headsigns.
//!
//! Loaded once per process through [`ReferenceStore`] and never reloaded.
//! Stop names are essential and their load failure propagates. Headsigns only
//! feed the destination column, so a broken `trips.txt` degrades to empty
//! destinations instead.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use tokio::sync::OnceCell;
use tracing::{debug, error, info};

use crate::error::ReferenceLoadError;

#[derive(Debug, Deserialize)]
struct StopRow {
    stop_id: String,
    stop_name: String,
}

#[derive(Debug, Deserialize)]
struct TripRow {
    #[serde(default)]
    trip_id: Option<String>,
    #[serde(default)]
    route_id: Option<String>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    direction_id: Option<u32>,
    #[serde(default)]
    trip_headsign: Option<String>,
}

/// Headsign lookups built from `trips.txt`.
#[derive(Debug, Default, Clone)]
pub struct Headsigns {
    pub by_trip: HashMap<String, String>,
    pub by_route_direction: HashMap<(String, u32), String>,
}

/// Read-only lookup tables shared by every refresh cycle.
#[derive(Debug, Default, Clone)]
pub struct ReferenceTables {
    stop_names: HashMap<String, String>,
    headsigns: Headsigns,
}

impl ReferenceTables {
    pub fn new(stop_names: HashMap<String, String>, headsigns: Headsigns) -> Self {
        Self {
            stop_names,
            headsigns,
        }
    }

    /// Loads both tables. Only a stop-name failure is returned; a headsign
    /// failure is logged and leaves the headsign tables empty.
    pub fn load(stops_path: &Path, trips_path: &Path) -> Result<Self, ReferenceLoadError> {
        let stop_names = load_stop_names(stops_path)?;

        let headsigns = match load_headsigns(trips_path) {
            Ok(h) => h,
            Err(e) => {
                error!(error = %e, "Headsign table unavailable, destinations will be empty");
                Headsigns::default()
            }
        };

        info!(
            stops = stop_names.len(),
            trip_headsigns = headsigns.by_trip.len(),
            route_direction_headsigns = headsigns.by_route_direction.len(),
            "Reference tables loaded"
        );

        Ok(Self::new(stop_names, headsigns))
    }

    /// Display name for `stop_id`, or `"Unknown stop (<id>)"`.
    pub fn stop_name(&self, stop_id: &str) -> String {
        match self.stop_names.get(stop_id) {
            Some(name) => name.clone(),
            None => format!("Unknown stop ({stop_id})"),
        }
    }

    pub fn headsign_for_trip(&self, trip_id: &str) -> Option<&str> {
        self.headsigns.by_trip.get(trip_id).map(String::as_str)
    }

    pub fn headsign_for_route_direction(&self, route_id: &str, direction_id: u32) -> Option<&str> {
        self.headsigns
            .by_route_direction
            .get(&(route_id.to_string(), direction_id))
            .map(String::as_str)
    }

    pub fn stop_count(&self) -> usize {
        self.stop_names.len()
    }

    #[cfg(test)]
    pub(crate) fn with_stop_name(mut self, stop_id: &str, name: &str) -> Self {
        self.stop_names.insert(stop_id.to_string(), name.to_string());
        self
    }

    #[cfg(test)]
    pub(crate) fn with_trip_headsign(mut self, trip_id: &str, headsign: &str) -> Self {
        self.headsigns
            .by_trip
            .insert(trip_id.to_string(), headsign.to_string());
        self
    }

    #[cfg(test)]
    pub(crate) fn with_route_headsign(
        mut self,
        route_id: &str,
        direction_id: u32,
        headsign: &str,
    ) -> Self {
        self.headsigns
            .by_route_direction
            .insert((route_id.to_string(), direction_id), headsign.to_string());
        self
    }
}

fn open(path: &Path) -> Result<csv::Reader<std::fs::File>, ReferenceLoadError> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|source| ReferenceLoadError::Open {
            path: path.to_path_buf(),
            source,
        })
}

/// Reads `stop_id,stop_name` rows from a GTFS `stops.txt`.
#[tracing::instrument(skip_all, fields(path = %path.display()))]
pub fn load_stop_names(path: &Path) -> Result<HashMap<String, String>, ReferenceLoadError> {
    let mut reader = open(path)?;
    let mut stops = HashMap::new();

    for row in reader.deserialize::<StopRow>() {
        let row = row.map_err(|source| ReferenceLoadError::Row {
            path: path.to_path_buf(),
            source,
        })?;
        stops.insert(row.stop_id, row.stop_name);
    }

    Ok(stops)
}

/// Reads trip headsigns from a GTFS `trips.txt`.
///
/// When several headsigns share a `(route_id, direction_id)`, the
/// lexicographically smallest one is kept so the result does not depend on
/// row order.
#[tracing::instrument(skip_all, fields(path = %path.display()))]
pub fn load_headsigns(path: &Path) -> Result<Headsigns, ReferenceLoadError> {
    let mut reader = open(path)?;
    let mut headsigns = Headsigns::default();
    let mut collisions = 0usize;

    for row in reader.deserialize::<TripRow>() {
        let row = row.map_err(|source| ReferenceLoadError::Row {
            path: path.to_path_buf(),
            source,
        })?;

        let Some(headsign) = row.trip_headsign.filter(|h| !h.is_empty()) else {
            continue;
        };

        if let Some(trip_id) = row.trip_id.filter(|t| !t.is_empty()) {
            headsigns.by_trip.insert(trip_id, headsign.clone());
        }

        let route_id = row.route_id.filter(|r| !r.is_empty());
        let (Some(route_id), Some(direction_id)) = (route_id, row.direction_id) else {
            continue;
        };

        match headsigns.by_route_direction.entry((route_id, direction_id)) {
            Entry::Vacant(slot) => {
                slot.insert(headsign);
            }
            Entry::Occupied(mut slot) => {
                if *slot.get() != headsign {
                    collisions += 1;
                    if headsign < *slot.get() {
                        slot.insert(headsign);
                    }
                }
            }
        }
    }

    if collisions > 0 {
        debug!(collisions, "Multiple headsigns per route and direction, kept smallest");
    }

    Ok(headsigns)
}

/// Lazily loaded, process-wide [`ReferenceTables`].
///
/// Concurrent first callers wait on a single load. A failed load leaves the
/// store empty so the next caller retries.
pub struct ReferenceStore {
    stops_path: PathBuf,
    trips_path: PathBuf,
    tables: OnceCell<Arc<ReferenceTables>>,
}

impl ReferenceStore {
    pub fn new(stops_path: impl Into<PathBuf>, trips_path: impl Into<PathBuf>) -> Self {
        Self {
            stops_path: stops_path.into(),
            trips_path: trips_path.into(),
            tables: OnceCell::new(),
        }
    }

    /// A store that is already initialised with `tables`.
    pub fn preloaded(tables: ReferenceTables) -> Self {
        Self {
            stops_path: PathBuf::new(),
            trips_path: PathBuf::new(),
            tables: OnceCell::new_with(Some(Arc::new(tables))),
        }
    }

    /// The loaded tables, loading them on the blocking pool on first use.
    pub async fn get(&self) -> Result<Arc<ReferenceTables>, ReferenceLoadError> {
        self.tables
            .get_or_try_init(|| async {
                let stops_path = self.stops_path.clone();
                let trips_path = self.trips_path.clone();
                let tables = tokio::task::spawn_blocking(move || {
                    ReferenceTables::load(&stops_path, &trips_path)
                })
                .await
                .map_err(|e| ReferenceLoadError::Task(e.to_string()))??;
                Ok::<_, ReferenceLoadError>(Arc::new(tables))
            })
            .await
            .cloned()
    }

    pub fn is_loaded(&self) -> bool {
        self.tables.initialized()
    }
}
