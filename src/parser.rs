//! Protobuf parser for GTFS Realtime feeds.

use prost::Message;

use crate::error::FeedError;
use crate::gtfs_rt::FeedMessage;

/// Decodes a protobuf-encoded GTFS-RT [`FeedMessage`] from raw bytes.
///
/// `source` only labels the error.
///
/// # Errors
///
/// Returns [`FeedError::Decode`] if the bytes are not valid protobuf for a
/// `FeedMessage`.
pub fn parse_feed(source: &str, bytes: &[u8]) -> Result<FeedMessage, FeedError> {
    FeedMessage::decode(bytes).map_err(|source_err| FeedError::Decode {
        endpoint: source.to_string(),
        source: source_err,
    })
}
