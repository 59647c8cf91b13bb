//! Decoding of the route and direction packed into a trip identifier.
//!
//! Identifiers look like `134100_F..S69R` in the live feed and `F.S07R` in
//! abbreviated form: the route is the character just before the `.`
//! separator and the direction (`N`/`S`) follows the separator.

use std::fmt;

use serde::Serialize;

const SEPARATOR: char = '.';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Direction {
    Northbound,
    Southbound,
    Unknown,
}

impl Direction {
    pub fn label(self) -> &'static str {
        match self {
            Direction::Northbound => "Northbound",
            Direction::Southbound => "Southbound",
            Direction::Unknown => "Unknown direction",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Route and direction extracted from a trip identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedTrip {
    pub route: Option<char>,
    pub direction: Direction,
}

impl DecodedTrip {
    pub const UNKNOWN: DecodedTrip = DecodedTrip {
        route: None,
        direction: Direction::Unknown,
    };
}

/// Decodes `trip_id`. Never fails: anything that does not fit the layout
/// decodes as [`DecodedTrip::UNKNOWN`].
///
/// The separator may be doubled (`..`, as in the live feed); the direction is
/// read from the first character after the whole separator run.
pub fn decode(trip_id: &str) -> DecodedTrip {
    let Some(sep) = trip_id.find(SEPARATOR) else {
        return DecodedTrip::UNKNOWN;
    };

    let Some(route) = trip_id[..sep].chars().next_back() else {
        return DecodedTrip::UNKNOWN;
    };
    let Some(marker) = trip_id[sep..].trim_start_matches(SEPARATOR).chars().next() else {
        return DecodedTrip::UNKNOWN;
    };

    let direction = match marker {
        'N' => Direction::Northbound,
        'S' => Direction::Southbound,
        _ => Direction::Unknown,
    };

    DecodedTrip {
        route: Some(route),
        direction,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abbreviated_ids() {
        assert_eq!(
            decode("F.S07R"),
            DecodedTrip {
                route: Some('F'),
                direction: Direction::Southbound
            }
        );
        assert_eq!(
            decode("D.N12R"),
            DecodedTrip {
                route: Some('D'),
                direction: Direction::Northbound
            }
        );
    }

    #[test]
    fn test_live_feed_ids_with_double_separator() {
        let decoded = decode("134100_1..S03R");
        assert_eq!(decoded.route, Some('1'));
        assert_eq!(decoded.direction, Direction::Southbound);

        let decoded = decode("087650_M..N71R");
        assert_eq!(decoded.route, Some('M'));
        assert_eq!(decoded.direction, Direction::Northbound);
    }

    #[test]
    fn test_every_route_character_round_trips() {
        for route in ['A', 'G', 'Z', '1', '7'] {
            for (marker, direction) in [('N', Direction::Northbound), ('S', Direction::Southbound)] {
                let id = format!("{route}.{marker}123456");
                assert_eq!(decode(&id).route, Some(route));
                assert_eq!(decode(&id).direction, direction);
            }
        }
    }

    #[test]
    fn test_other_direction_markers_are_unknown() {
        let decoded = decode("G.X05R");
        assert_eq!(decoded.route, Some('G'));
        assert_eq!(decoded.direction, Direction::Unknown);
    }

    #[test]
    fn test_malformed_ids_do_not_panic() {
        assert_eq!(decode(""), DecodedTrip::UNKNOWN);
        assert_eq!(decode("FS07R"), DecodedTrip::UNKNOWN);
        assert_eq!(decode(".N01"), DecodedTrip::UNKNOWN);
        assert_eq!(decode("F."), DecodedTrip::UNKNOWN);
        assert_eq!(decode("F.."), DecodedTrip::UNKNOWN);
        assert_eq!(decode("é.N"), DecodedTrip { route: Some('é'), direction: Direction::Northbound });
    }

    #[test]
    fn test_decode_is_stable() {
        assert_eq!(decode("A.N01R"), decode("A.N01R"));
    }
}
