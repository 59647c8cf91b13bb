//! Builds the per-direction departure board from a flat trip list.
//!
//! The feed is assumed to be ordered by arrival already, so trips and stop
//! rows are only filtered and truncated, never re-sorted.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use crate::eta::{self, Eta};
use crate::feeds::LineSelection;
use crate::models::{StopTimeUpdate, Trip};
use crate::stations::StationLookup;
use crate::trip_id::{self, Direction};

pub const MAX_TRIPS_PER_DIRECTION: usize = 10;
pub const MAX_STOPS_PER_TRIP: usize = 8;

/// Everything besides the trips needed to produce display rows.
#[derive(Clone, Copy)]
pub struct DisplayContext<'a> {
    pub stations: &'a dyn StationLookup,
    pub now: DateTime<Utc>,
    pub tz: Tz,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StopRow {
    pub stop_id: String,
    pub station: String,
    pub arrival_clock: String,
    pub eta: Eta,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayTrip {
    pub trip_id: String,
    pub route_label: String,
    pub direction: Direction,
    pub stops: Vec<StopRow>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Board {
    pub northbound: Vec<DisplayTrip>,
    pub southbound: Vec<DisplayTrip>,
}

pub fn build_board(trips: &[Trip], selection: &LineSelection, ctx: DisplayContext<'_>) -> Board {
    Board {
        northbound: group_direction(trips, Direction::Northbound, selection, ctx),
        southbound: group_direction(trips, Direction::Southbound, selection, ctx),
    }
}

/// Trips heading in `direction` that match the selection's sub-line, capped
/// at [`MAX_TRIPS_PER_DIRECTION`] in feed order.
pub fn group_direction(
    trips: &[Trip],
    direction: Direction,
    selection: &LineSelection,
    ctx: DisplayContext<'_>,
) -> Vec<DisplayTrip> {
    trips
        .iter()
        .filter_map(|trip| {
            let decoded = trip_id::decode(&trip.trip_id);
            if decoded.direction != direction {
                return None;
            }
            if selection.sub_line.is_some() && decoded.route != selection.sub_line {
                return None;
            }
            Some((trip, decoded.route))
        })
        .take(MAX_TRIPS_PER_DIRECTION)
        .map(|(trip, route)| DisplayTrip {
            trip_id: trip.trip_id.clone(),
            route_label: route_label(trip, route, selection),
            direction,
            stops: trip
                .stop_time_updates
                .iter()
                .take(MAX_STOPS_PER_TRIP)
                .map(|update| stop_row(update, ctx))
                .collect(),
        })
        .collect()
}

fn route_label(trip: &Trip, decoded: Option<char>, selection: &LineSelection) -> String {
    match (trip.route_id.as_deref(), decoded) {
        (Some(route_id), _) if !route_id.is_empty() => route_id.to_string(),
        (_, Some(route)) => route.to_string(),
        _ => selection.feed.key().to_uppercase(),
    }
}

fn stop_row(update: &StopTimeUpdate, ctx: DisplayContext<'_>) -> StopRow {
    let arrival = update.arrival_time.as_deref();
    StopRow {
        stop_id: update.stop_id.clone(),
        station: ctx.stations.label_for(&update.stop_id),
        arrival_clock: eta::arrival_clock(arrival, ctx.tz),
        eta: eta::time_until(arrival, ctx.now),
    }
}
