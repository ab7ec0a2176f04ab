//! Board policy: which stops to watch, which route gets its own treatment,
//! how far ahead to look, and how often to refresh.
//!
//! [`BoardConfig`] is what the engine consumes. [`BoardArgs`] is the clap
//! surface that fills it from flags or environment variables.

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use clap::Args;

use crate::error::ConfigError;

pub const DEFAULT_FEED_URLS: &[&str] = &[
    "https://api-endpoint.mta.info/Dataservice/mtagtfsfeeds/nyct%2Fgtfs-nqrw",
    "https://api-endpoint.mta.info/Dataservice/mtagtfsfeeds/nyct%2Fgtfs",
    "https://api-endpoint.mta.info/Dataservice/mtagtfsfeeds/nyct%2Fgtfs-l",
];

pub const DEFAULT_MONITORED_STOPS: &[&str] = &[
    "634N", "634S", "635N", "635S", "L03N", "L03S", "R19N", "R19S", "R20N", "R20S",
];

/// Everything the refresh cycle needs to know about policy.
#[derive(Debug, Clone)]
pub struct BoardConfig {
    /// Feed sources, either `http(s)` URLs or local `.pb` files
    pub feed_urls: Vec<String>,
    /// Sent as `x-api-key` when set
    pub api_key: Option<String>,
    pub feed_timeout: Duration,

    pub stops_file: PathBuf,
    pub trips_file: PathBuf,

    /// Route shown under its own direction vocabulary and pages
    pub designated_route: String,
    pub designated_north_label: String,
    pub designated_south_label: String,

    pub monitored_stops: HashSet<String>,
    pub window_minutes: f64,
    pub page_size: usize,

    pub refresh_interval: Duration,
    pub backoff_interval: Duration,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            feed_urls: DEFAULT_FEED_URLS.iter().map(|s| s.to_string()).collect(),
            api_key: None,
            feed_timeout: Duration::from_secs(20),
            stops_file: PathBuf::from("gtfs_subway/stops.txt"),
            trips_file: PathBuf::from("gtfs_subway/trips.txt"),
            designated_route: "L".to_string(),
            designated_north_label: "Manhattan Bound".to_string(),
            designated_south_label: "Brooklyn Bound".to_string(),
            monitored_stops: DEFAULT_MONITORED_STOPS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            window_minutes: 10.0,
            page_size: 5,
            refresh_interval: Duration::from_secs(30),
            backoff_interval: Duration::from_secs(60),
        }
    }
}

impl BoardConfig {
    /// `line_type` tag for pages of the designated route, e.g. `"L Train"`.
    pub fn designated_line_type(&self) -> String {
        format!("{} Train", self.designated_route)
    }

    /// Rejects values that would make pagination or filtering meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_size == 0 {
            return Err(ConfigError::ZeroPageSize);
        }
        if !self.window_minutes.is_finite() || self.window_minutes < 0.0 {
            return Err(ConfigError::InvalidWindow(self.window_minutes));
        }
        if self.monitored_stops.is_empty() {
            return Err(ConfigError::NoMonitoredStops);
        }
        Ok(())
    }
}

/// Command-line / environment overrides for [`BoardConfig`].
#[derive(Debug, Clone, Args)]
pub struct BoardArgs {
    /// Comma-separated feed URLs or local .pb files
    #[arg(long, env = "FEED_URLS", value_delimiter = ',')]
    pub feed_urls: Option<Vec<String>>,

    /// API key sent as the x-api-key header
    #[arg(long, env = "MTA_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Per-request timeout for feed fetches, in seconds
    #[arg(long, env = "FEED_TIMEOUT_SECS", default_value_t = 20)]
    pub feed_timeout_secs: u64,

    /// GTFS static stops.txt
    #[arg(long, env = "STOPS_FILE", default_value = "gtfs_subway/stops.txt")]
    pub stops_file: PathBuf,

    /// GTFS static trips.txt
    #[arg(long, env = "TRIPS_FILE", default_value = "gtfs_subway/trips.txt")]
    pub trips_file: PathBuf,

    #[arg(long, env = "DESIGNATED_ROUTE", default_value = "L")]
    pub designated_route: String,

    #[arg(long, env = "DESIGNATED_NORTH_LABEL", default_value = "Manhattan Bound")]
    pub designated_north_label: String,

    #[arg(long, env = "DESIGNATED_SOUTH_LABEL", default_value = "Brooklyn Bound")]
    pub designated_south_label: String,

    /// Comma-separated stop ids to watch
    #[arg(long, env = "MONITORED_STOPS", value_delimiter = ',')]
    pub monitored_stops: Option<Vec<String>>,

    /// Only arrivals this many minutes out (or fewer) are shown
    #[arg(long, env = "WINDOW_MINUTES", default_value_t = 10.0)]
    pub window_minutes: f64,

    /// Trains per page
    #[arg(long, env = "PAGE_SIZE", default_value_t = 5)]
    pub page_size: usize,

    #[arg(long, env = "REFRESH_INTERVAL_SECS", default_value_t = 30)]
    pub refresh_interval_secs: u64,

    /// Wait after a failed refresh cycle, in seconds
    #[arg(long, env = "BACKOFF_INTERVAL_SECS", default_value_t = 60)]
    pub backoff_interval_secs: u64,
}

impl BoardArgs {
    /// Builds a validated [`BoardConfig`], falling back to the defaults for
    /// list-valued options that were not given.
    pub fn into_config(self) -> Result<BoardConfig, ConfigError> {
        let defaults = BoardConfig::default();

        let monitored_stops = match self.monitored_stops {
            Some(stops) => stops
                .into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            None => defaults.monitored_stops,
        };

        let config = BoardConfig {
            feed_urls: self.feed_urls.unwrap_or(defaults.feed_urls),
            api_key: self.api_key.filter(|k| !k.is_empty()),
            feed_timeout: Duration::from_secs(self.feed_timeout_secs),
            stops_file: self.stops_file,
            trips_file: self.trips_file,
            designated_route: self.designated_route,
            designated_north_label: self.designated_north_label,
            designated_south_label: self.designated_south_label,
            monitored_stops,
            window_minutes: self.window_minutes,
            page_size: self.page_size,
            refresh_interval: Duration::from_secs(self.refresh_interval_secs),
            backoff_interval: Duration::from_secs(self.backoff_interval_secs),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        board: BoardArgs,
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = BoardConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.page_size, 5);
        assert_eq!(config.window_minutes, 10.0);
        assert_eq!(config.refresh_interval, Duration::from_secs(30));
        assert_eq!(config.backoff_interval, Duration::from_secs(60));
        assert!(config.monitored_stops.contains("L03N"));
        assert_eq!(config.designated_line_type(), "L Train");
    }

    #[test]
    fn test_zero_page_size_rejected() {
        let config = BoardConfig {
            page_size: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroPageSize));
    }

    #[test]
    fn test_negative_window_rejected() {
        let config = BoardConfig {
            window_minutes: -1.0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::InvalidWindow(-1.0)));
    }

    #[test]
    fn test_args_override_lists() {
        let cli = TestCli::parse_from([
            "test",
            "--monitored-stops",
            "A01N, A01S",
            "--feed-urls",
            "feed.pb",
            "--designated-route",
            "G",
            "--page-size",
            "3",
        ]);
        let config = cli.board.into_config().unwrap();

        assert_eq!(config.monitored_stops.len(), 2);
        assert!(config.monitored_stops.contains("A01S"));
        assert_eq!(config.feed_urls, vec!["feed.pb".to_string()]);
        assert_eq!(config.designated_line_type(), "G Train");
        assert_eq!(config.page_size, 3);
    }

    #[test]
    fn test_args_reject_zero_page_size() {
        let cli = TestCli::parse_from(["test", "--page-size", "0"]);
        assert_eq!(cli.board.into_config().unwrap_err(), ConfigError::ZeroPageSize);
    }
}
