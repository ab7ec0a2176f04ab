//! Grouping and pagination.
//!
//! Arrivals are bucketed by `(stop_id, direction)`. Each bucket is split into
//! the designated route's trains and everyone else's, each side sorted by
//! imminence and cut into pages. The two sides are numbered independently.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::classify::{Classified, ClassifiedArrival, Direction, GroupKey};
use crate::config::BoardConfig;
use crate::reference::ReferenceTables;

pub const OTHER_LINES: &str = "Other Lines";

/// One screenful of trains for a station and direction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArrivalPage {
    pub station: String,
    pub station_id: String,
    pub direction: String,
    pub trains: Vec<ClassifiedArrival>,
    /// 1-based
    pub page: usize,
    pub total_pages: usize,
    pub line_type: String,
}

/// Display label for a designated-route group.
///
/// Anything not Northbound takes the south label.
pub fn designated_direction_label(direction: Direction, config: &BoardConfig) -> &str {
    match direction {
        Direction::Northbound => &config.designated_north_label,
        _ => &config.designated_south_label,
    }
}

/// Builds the page list for one cycle.
///
/// Groups come out ordered by stop id then direction; within a group the
/// designated route's pages precede the other lines' pages.
pub fn paginate(
    classified: Vec<Classified>,
    refs: &ReferenceTables,
    config: &BoardConfig,
) -> Vec<ArrivalPage> {
    let page_size = config.page_size.max(1);

    let mut groups: BTreeMap<GroupKey, Vec<ClassifiedArrival>> = BTreeMap::new();
    for c in classified {
        groups.entry(c.key).or_default().push(c.arrival);
    }

    let designated_line_type = config.designated_line_type();
    let mut pages = Vec::new();

    for (key, trains) in groups {
        let station = refs.stop_name(&key.stop_id);

        let (designated, others): (Vec<_>, Vec<_>) = trains
            .into_iter()
            .partition(|t| t.route_id == config.designated_route);

        push_pages(
            &mut pages,
            PageHeader {
                station: &station,
                station_id: &key.stop_id,
                direction: designated_direction_label(key.direction, config),
                line_type: &designated_line_type,
            },
            designated,
            page_size,
        );

        push_pages(
            &mut pages,
            PageHeader {
                station: &station,
                station_id: &key.stop_id,
                direction: key.direction.label(),
                line_type: OTHER_LINES,
            },
            others,
            page_size,
        );
    }

    pages
}

struct PageHeader<'a> {
    station: &'a str,
    station_id: &'a str,
    direction: &'a str,
    line_type: &'a str,
}

fn push_pages(
    pages: &mut Vec<ArrivalPage>,
    header: PageHeader<'_>,
    mut trains: Vec<ClassifiedArrival>,
    page_size: usize,
) {
    if trains.is_empty() {
        return;
    }

    // stable, so ties keep feed order
    trains.sort_by(|a, b| a.minutes_until_arrival.total_cmp(&b.minutes_until_arrival));

    let total_pages = trains.len().div_ceil(page_size);

    for (index, chunk) in trains.chunks(page_size).enumerate() {
        pages.push(ArrivalPage {
            station: header.station.to_string(),
            station_id: header.station_id.to_string(),
            direction: header.direction.to_string(),
            trains: chunk.to_vec(),
            page: index + 1,
            total_pages,
            line_type: header.line_type.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arrival(route: &str, stop: &str, minutes: f64, destination: &str) -> ClassifiedArrival {
        ClassifiedArrival {
            route_id: route.to_string(),
            minutes_until_arrival: minutes,
            stop_id: stop.to_string(),
            destination: destination.to_string(),
        }
    }

    fn classified(direction: Direction, a: ClassifiedArrival) -> Classified {
        Classified {
            key: GroupKey {
                stop_id: a.stop_id.clone(),
                direction,
            },
            arrival: a,
        }
    }

    fn refs() -> ReferenceTables {
        ReferenceTables::default()
            .with_stop_name("L03N", "14 St-Union Sq")
            .with_stop_name("635N", "14 St-Union Sq")
    }

    #[test]
    fn test_twelve_arrivals_make_three_pages() {
        let input: Vec<_> = (0..12)
            .map(|i| classified(Direction::Uptown, arrival("6", "635N", i as f64 * 0.5, "")))
            .collect();

        let pages = paginate(input, &refs(), &BoardConfig::default());

        let counts: Vec<_> = pages.iter().map(|p| p.trains.len()).collect();
        assert_eq!(counts, vec![5, 5, 2]);
        assert!(pages.iter().all(|p| p.total_pages == 3));
        assert_eq!(pages.iter().map(|p| p.page).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert!(pages.iter().all(|p| p.line_type == OTHER_LINES));
        assert!(pages.iter().all(|p| p.direction == "Uptown"));
    }

    #[test]
    fn test_single_train_single_page() {
        let input = vec![classified(Direction::Downtown, arrival("6", "635S", 4.0, ""))];

        let pages = paginate(input, &refs(), &BoardConfig::default());

        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].page, 1);
        assert_eq!(pages[0].total_pages, 1);
        assert_eq!(pages[0].station, "Unknown stop (635S)");
    }

    #[test]
    fn test_sorted_soonest_first() {
        let input = vec![
            classified(Direction::Uptown, arrival("4", "635N", 7.0, "")),
            classified(Direction::Uptown, arrival("5", "635N", 1.5, "")),
            classified(Direction::Uptown, arrival("6", "635N", 3.0, "")),
        ];

        let pages = paginate(input, &refs(), &BoardConfig::default());

        let routes: Vec<_> = pages[0].trains.iter().map(|t| t.route_id.as_str()).collect();
        assert_eq!(routes, vec!["5", "6", "4"]);
    }

    #[test]
    fn test_ties_keep_input_order() {
        let input = vec![
            classified(Direction::Uptown, arrival("4", "635N", 2.0, "first")),
            classified(Direction::Uptown, arrival("5", "635N", 1.0, "")),
            classified(Direction::Uptown, arrival("6", "635N", 2.0, "second")),
            classified(Direction::Uptown, arrival("4", "635N", 2.0, "third")),
        ];

        for _ in 0..3 {
            let pages = paginate(input.clone(), &refs(), &BoardConfig::default());
            let dests: Vec<_> = pages[0].trains.iter().map(|t| t.destination.as_str()).collect();
            assert_eq!(dests, vec!["", "first", "second", "third"]);
        }
    }

    #[test]
    fn test_designated_route_isolated() {
        // Designated trains group under Northbound, others under Uptown, so
        // the same platform yields two keys; put both kinds under one key to
        // check the split itself.
        let mut input: Vec<_> = (0..6)
            .map(|i| classified(Direction::Northbound, arrival("L", "L03N", i as f64, "8 Av")))
            .collect();
        input.push(classified(Direction::Northbound, arrival("6", "L03N", 2.5, "")));

        let pages = paginate(input, &refs(), &BoardConfig::default());

        let designated: Vec<_> = pages.iter().filter(|p| p.line_type == "L Train").collect();
        let others: Vec<_> = pages.iter().filter(|p| p.line_type == OTHER_LINES).collect();

        assert_eq!(designated.len(), 2);
        assert_eq!(others.len(), 1);
        assert!(designated.iter().all(|p| p.direction == "Manhattan Bound"));
        assert!(designated.iter().all(|p| p.total_pages == 2));
        assert_eq!(designated[1].page, 2);
        assert_eq!(others[0].page, 1);
        assert_eq!(others[0].total_pages, 1);
        assert_eq!(others[0].direction, "Northbound");
        assert!(
            designated
                .iter()
                .flat_map(|p| &p.trains)
                .all(|t| t.route_id == "L")
        );
    }

    #[test]
    fn test_designated_south_label() {
        let input = vec![classified(Direction::Southbound, arrival("L", "L03S", 1.0, ""))];

        let pages = paginate(input, &refs(), &BoardConfig::default());

        assert_eq!(pages[0].direction, "Brooklyn Bound");
        assert_eq!(pages[0].line_type, "L Train");
    }

    #[test]
    fn test_groups_are_contiguous() {
        let input = vec![
            classified(Direction::Uptown, arrival("6", "635N", 1.0, "")),
            classified(Direction::Northbound, arrival("L", "L03N", 2.0, "")),
            classified(Direction::Uptown, arrival("6", "635N", 3.0, "")),
            classified(Direction::Uptown, arrival("R", "L03N", 4.0, "")),
        ];

        let pages = paginate(input, &refs(), &BoardConfig::default());

        let keys: Vec<_> = pages
            .iter()
            .map(|p| (p.station_id.as_str(), p.direction.as_str()))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("635N", "Uptown"),
                ("L03N", "Manhattan Bound"),
                ("L03N", "Uptown"),
            ]
        );
        assert_eq!(pages[0].trains.len(), 2);
    }

    #[test]
    fn test_empty_input_no_pages() {
        assert!(paginate(vec![], &refs(), &BoardConfig::default()).is_empty());
    }
}
