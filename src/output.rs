//! Text and JSON presentation of the published views.

use std::fmt;

use anyhow::Result;
use chrono_tz::Tz;
use serde::Serialize;
use tracing::debug;

use crate::accessibility::{AccessibilityView, EquipmentRow, PanelState};
use crate::board::DisplayTrip;
use crate::session::RealtimeView;
use crate::trip_id::Direction;

/// Logs a value using Rust's debug pretty-print format.
pub fn print_pretty<T: fmt::Debug>(value: &T) {
    debug!("{:#?}", value);
}

/// Writes a value to stdout as pretty-printed JSON.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Plain-text rendering of the realtime board.
pub struct BoardText<'a> {
    pub view: &'a RealtimeView,
    pub tz: Tz,
}

impl fmt::Display for BoardText<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let view = self.view;
        write!(f, "Showing trips for line: {}", view.feed_label)?;
        if let Some(line) = view.selection.sub_line {
            write!(f, " (only {line})")?;
        }
        writeln!(f)?;
        if let Some(updated) = view.last_updated {
            writeln!(
                f,
                "Last updated: {}",
                updated.with_timezone(&self.tz).format("%H:%M:%S")
            )?;
        }
        if let Some(error) = &view.error {
            writeln!(f, "! {error}")?;
        }
        if view.loading {
            writeln!(f, "Loading trips data...")?;
        }

        if !view.has_trips {
            if !view.loading {
                writeln!(f, "No trips data available")?;
            }
            return Ok(());
        }

        write_direction(f, Direction::Northbound, &view.board.northbound)?;
        write_direction(f, Direction::Southbound, &view.board.southbound)
    }
}

fn write_direction(f: &mut fmt::Formatter<'_>, direction: Direction, trips: &[DisplayTrip]) -> fmt::Result {
    writeln!(f)?;
    writeln!(f, "== {direction} ==")?;
    if trips.is_empty() {
        return writeln!(f, "No {} trips available", direction.label().to_lowercase());
    }
    for trip in trips {
        writeln!(f, "[{}] {}", trip.route_label, trip.trip_id)?;
        writeln!(f, "    {:<32} {:<8} {}", "Station", "Arrival", "ETA")?;
        for stop in &trip.stops {
            writeln!(f, "    {:<32} {:<8} {}", stop.station, stop.arrival_clock, stop.eta)?;
        }
    }
    Ok(())
}

/// Plain-text rendering of the station accessibility panel.
pub struct AccessibilityText<'a>(pub &'a PanelState);

impl fmt::Display for AccessibilityText<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            PanelState::Idle => writeln!(f, "No accessibility data available"),
            PanelState::Loading => writeln!(f, "Loading accessibility information..."),
            PanelState::Failed(message) => writeln!(f, "! {message}"),
            PanelState::Loaded(view) => write_accessibility(f, view),
        }
    }
}

fn write_accessibility(f: &mut fmt::Formatter<'_>, view: &AccessibilityView) -> fmt::Result {
    writeln!(f, "Station Accessibility Information")?;
    write_equipment(
        f,
        "Elevators",
        view.totals.elevators,
        &view.working_elevators,
        &view.out_of_service_elevators,
    )?;
    write_equipment(
        f,
        "Escalators",
        view.totals.escalators,
        &view.working_escalators,
        &view.out_of_service_escalators,
    )?;

    if view.has_upcoming_outages {
        writeln!(f)?;
        writeln!(f, "== Upcoming Outages ({}) [Planned] ==", view.outages.len())?;
        for outage in &view.outages {
            writeln!(
                f,
                "  {} | {} | {} -> {}",
                outage.kind, outage.reason, outage.start_date, outage.end_date
            )?;
        }
    }
    Ok(())
}

fn write_equipment(
    f: &mut fmt::Formatter<'_>,
    title: &str,
    total: usize,
    working: &[EquipmentRow],
    out_of_service: &[EquipmentRow],
) -> fmt::Result {
    writeln!(f)?;
    writeln!(f, "== {title} ==")?;
    if total == 0 {
        return writeln!(f, "No {} available at this station", title.to_lowercase());
    }
    for (heading, rows) in [("Working", working), ("Out of Service", out_of_service)] {
        if rows.is_empty() {
            continue;
        }
        writeln!(f, "{heading} ({})", rows.len())?;
        for row in rows {
            write!(f, "  {} | {} | {}", row.id, row.location, row.status)?;
            if let Some(back) = &row.estimated_return {
                write!(f, " | back {back}")?;
            }
            writeln!(f)?;
        }
    }
    Ok(())
}
