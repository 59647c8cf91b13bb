//! Station-name lookup.
//!
//! [`StationLookup`] is the read-only mapping consulted when labelling stop
//! rows. [`StationDirectory`] implements it from a GTFS `stops.txt` file.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::info;

/// Maps a stop id to a human station name.
pub trait StationLookup: Send + Sync {
    fn station_name(&self, stop_id: &str) -> Option<&str>;

    /// The station name, or the raw stop id when the mapping has no entry.
    fn label_for(&self, stop_id: &str) -> String {
        self.station_name(stop_id).unwrap_or(stop_id).to_string()
    }
}

impl StationLookup for HashMap<String, String> {
    fn station_name(&self, stop_id: &str) -> Option<&str> {
        self.get(stop_id).map(String::as_str)
    }
}

#[derive(Deserialize)]
struct StopRow {
    stop_id: String,
    stop_name: String,
}

/// Stop id to station name table.
#[derive(Debug, Default)]
pub struct StationDirectory {
    names: HashMap<String, String>,
}

impl StationDirectory {
    /// An empty directory; every lookup falls back to the stop id.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Loads a GTFS `stops.txt` file. Columns other than `stop_id` and
    /// `stop_name` are ignored.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .with_context(|| format!("opening stations file {}", path.display()))?;
        let directory = Self::from_reader(file)
            .with_context(|| format!("reading stations file {}", path.display()))?;
        info!(path = %path.display(), stations = directory.len(), "Station names loaded");
        Ok(directory)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::Reader::from_reader(reader);
        let mut names = HashMap::new();
        for result in rdr.deserialize() {
            let row: StopRow = result?;
            names.insert(row.stop_id, row.stop_name);
        }
        Ok(Self { names })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl StationLookup for StationDirectory {
    fn station_name(&self, stop_id: &str) -> Option<&str> {
        self.names.get(stop_id).map(String::as_str)
    }
}
