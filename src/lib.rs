pub mod classify;
pub mod config;
pub mod error;
pub mod feed;
pub mod fetch;
pub mod output;
pub mod paginate;
pub mod parser;
pub mod reference;
pub mod refresh;
pub mod snapshot;
pub mod stats;
pub mod web;

pub mod gtfs_rt {
    include!(concat!(env!("OUT_DIR"), "/transit_realtime.rs"));
}
