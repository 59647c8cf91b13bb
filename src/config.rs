use std::time::Duration;

use chrono_tz::Tz;

use crate::feeds::LineSelection;

/// How often the board refreshes in the background.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

pub const DEFAULT_TIMEZONE: Tz = chrono_tz::America::New_York;

/// Settings for one realtime session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionConfig {
    pub refresh_interval: Duration,
    pub initial_selection: LineSelection,
    /// Zone used for the arrival wall-clock column.
    pub timezone: Tz,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            initial_selection: LineSelection::default(),
            timezone: DEFAULT_TIMEZONE,
        }
    }
}

impl SessionConfig {
    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    pub fn with_selection(mut self, selection: LineSelection) -> Self {
        self.initial_selection = selection;
        self
    }

    pub fn with_timezone(mut self, timezone: Tz) -> Self {
        self.timezone = timezone;
        self
    }
}
