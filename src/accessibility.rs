//! Elevator and escalator status for the station detail view.
//!
//! [`partition`] turns a raw [`AccessibilityRecord`] into display buckets with
//! every optional field already defaulted. [`StationPanel`] fetches a fresh
//! record whenever the displayed station changes.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::FetchError;
use crate::eta::NOT_AVAILABLE;
use crate::fetch::Transport;
use crate::models::{AccessibilityRecord, Equipment, Outage};
use crate::parser::parse_accessibility;

const IN_SERVICE: &str = "In Service";
const OUT_OF_SERVICE: &str = "Out of Service";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EquipmentRow {
    pub id: String,
    pub location: String,
    pub status: String,
    /// Only set for out-of-service equipment.
    pub estimated_return: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutageRow {
    pub kind: String,
    pub reason: String,
    pub start_date: String,
    pub end_date: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AccessibilityTotals {
    pub elevators: usize,
    pub escalators: usize,
    pub outages: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AccessibilityView {
    pub working_elevators: Vec<EquipmentRow>,
    pub out_of_service_elevators: Vec<EquipmentRow>,
    pub working_escalators: Vec<EquipmentRow>,
    pub out_of_service_escalators: Vec<EquipmentRow>,
    pub has_upcoming_outages: bool,
    pub outages: Vec<OutageRow>,
    pub totals: AccessibilityTotals,
}

/// Splits equipment on `is_working`, keeping feed order within each bucket.
pub fn partition(record: &AccessibilityRecord) -> AccessibilityView {
    let (working_elevators, out_of_service_elevators) = split(&record.elevators);
    let (working_escalators, out_of_service_escalators) = split(&record.escalators);

    AccessibilityView {
        working_elevators,
        out_of_service_elevators,
        working_escalators,
        out_of_service_escalators,
        has_upcoming_outages: !record.upcoming_outages.is_empty(),
        outages: record.upcoming_outages.iter().map(outage_row).collect(),
        totals: AccessibilityTotals {
            elevators: record.elevators.len(),
            escalators: record.escalators.len(),
            outages: record.upcoming_outages.len(),
        },
    }
}

fn split(equipment: &[Equipment]) -> (Vec<EquipmentRow>, Vec<EquipmentRow>) {
    let (working, broken): (Vec<&Equipment>, Vec<&Equipment>) =
        equipment.iter().partition(|item| item.is_working);
    (
        working.into_iter().map(equipment_row).collect(),
        broken.into_iter().map(equipment_row).collect(),
    )
}

fn equipment_row(item: &Equipment) -> EquipmentRow {
    let default_status = if item.is_working {
        IN_SERVICE
    } else {
        OUT_OF_SERVICE
    };
    EquipmentRow {
        id: or_not_available(&item.id),
        location: or_not_available(&item.location),
        status: non_empty(&item.status).unwrap_or(default_status).to_string(),
        estimated_return: if item.is_working {
            None
        } else {
            non_empty(&item.estimated_return).map(str::to_string)
        },
    }
}

fn outage_row(outage: &Outage) -> OutageRow {
    OutageRow {
        kind: or_not_available(&outage.kind),
        reason: or_not_available(&outage.reason),
        start_date: or_not_available(&outage.start_date),
        end_date: or_not_available(&outage.end_date),
    }
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.is_empty())
}

fn or_not_available(field: &Option<String>) -> String {
    non_empty(field).unwrap_or(NOT_AVAILABLE).to_string()
}

pub fn accessibility_path(station_id: &str) -> String {
    format!("/mta/accessibility/{station_id}")
}

/// Fetches and decodes the accessibility record for one station.
#[tracing::instrument(skip(transport))]
pub async fn fetch_accessibility(
    transport: &dyn Transport,
    station_id: &str,
) -> Result<AccessibilityRecord, FetchError> {
    let payload = transport.fetch_json(&accessibility_path(station_id)).await?;
    parse_accessibility(payload)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub enum PanelState {
    /// No station shown yet.
    #[default]
    Idle,
    Loading,
    Loaded(AccessibilityView),
    Failed(String),
}

/// Holds the accessibility view for the station currently on screen.
///
/// Nothing is cached across stations: every change of station id fetches a
/// fresh record.
#[derive(Debug, Default)]
pub struct StationPanel {
    station_id: Option<String>,
    state: PanelState,
}

impl StationPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn station_id(&self) -> Option<&str> {
        self.station_id.as_deref()
    }

    pub fn state(&self) -> &PanelState {
        &self.state
    }

    /// Shows `station_id`, fetching its record unless that station is already
    /// loaded. An empty id clears the panel without a request.
    pub async fn show(&mut self, transport: &dyn Transport, station_id: &str) -> &PanelState {
        let station_id = station_id.trim();
        if station_id.is_empty() {
            self.station_id = None;
            self.state = PanelState::Idle;
            return &self.state;
        }
        if self.station_id.as_deref() == Some(station_id)
            && matches!(self.state, PanelState::Loaded(_))
        {
            debug!(station_id, "Station unchanged, keeping current view");
            return &self.state;
        }

        self.station_id = Some(station_id.to_string());
        self.state = PanelState::Loading;

        self.state = match fetch_accessibility(transport, station_id).await {
            Ok(record) => {
                let view = partition(&record);
                info!(
                    station_id,
                    elevators = view.totals.elevators,
                    escalators = view.totals.escalators,
                    outages = view.totals.outages,
                    "Accessibility loaded"
                );
                PanelState::Loaded(view)
            }
            Err(e) => {
                warn!(station_id, error = %e, "Accessibility fetch failed");
                PanelState::Failed(format!(
                    "Failed to load accessibility information for station {station_id}. {e}"
                ))
            }
        };
        &self.state
    }
}
