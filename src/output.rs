//! Terminal rendering of a [`Snapshot`] for the one-shot `show` command.
//!
//! Supports a plain-text board and pretty JSON identical to the HTTP payload.

use anyhow::Result;

use crate::snapshot::Snapshot;

/// Renders the board as text, one block per page:
///
/// ```text
/// 14 St-Union Sq - L Train - Manhattan Bound (page 1/1):
///   L Train: 3.0 min -> 8 Av
/// ```
pub fn render_board(snapshot: &Snapshot) -> String {
    let mut out = String::new();

    if snapshot.data.is_empty() {
        out.push_str("No upcoming arrivals.\n");
    }

    for page in &snapshot.data {
        out.push_str(&format!(
            "{} - {} - {} (page {}/{}):\n",
            page.station, page.line_type, page.direction, page.page, page.total_pages
        ));
        for train in &page.trains {
            out.push_str(&format!(
                "  {} Train: {:.1} min",
                train.route_id, train.minutes_until_arrival
            ));
            if !train.destination.is_empty() {
                out.push_str(&format!(" -> {}", train.destination));
            }
            out.push('\n');
        }
        out.push('\n');
    }

    if !snapshot.last_updated.is_empty() {
        out.push_str(&format!("Last updated {}\n", snapshot.last_updated));
    }

    out
}

/// The snapshot as pretty-printed JSON.
pub fn render_json(snapshot: &Snapshot) -> Result<String> {
    Ok(serde_json::to_string_pretty(snapshot)?)
}
