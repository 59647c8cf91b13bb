//! Session state for the realtime board and the rules for applying fetches.
//!
//! [`Session`] is a plain state machine with no I/O. The
//! [`controller`](crate::controller) drives it from timers, user commands
//! and fetch completions. Every fetch is issued against a [`FetchTicket`];
//! only the ticket currently in flight may change the state, which keeps a
//! slow response for an old feed from overwriting the feed now selected.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::board::{Board, DisplayContext, build_board};
use crate::error::FetchError;
use crate::feeds::LineSelection;
use crate::models::Trip;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    Idle,
    Loading,
    Loaded,
    Errored,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub selection: LineSelection,
    pub trips: Vec<Trip>,
    pub phase: Phase,
    pub error: Option<String>,
    pub last_updated: Option<DateTime<Utc>>,
}

impl SessionState {
    pub fn loading(&self) -> bool {
        self.phase == Phase::Loading
    }
}

/// Identifies one issued fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    seq: u64,
    epoch: u64,
    pub selection: LineSelection,
}

impl FetchTicket {
    pub fn seq(&self) -> u64 {
        self.seq
    }
}

/// What started a fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Activation,
    Manual,
    Timer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionChange {
    Unchanged,
    /// Same feed, different sub-line: the loaded trips are re-filtered.
    Refiltered,
    /// New feed: trips were cleared and this fetch must be started.
    Refetch(FetchTicket),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Applied,
    /// The ticket was superseded; the state was not touched.
    Discarded,
}

/// Everything the presentation layer needs to draw the realtime board.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RealtimeView {
    pub selection: LineSelection,
    pub feed_label: &'static str,
    #[serde(flatten)]
    pub board: Board,
    pub loading: bool,
    pub error: Option<String>,
    pub last_updated: Option<DateTime<Utc>>,
    /// False until a fetch for the current feed has returned trips; tells
    /// "nothing loaded yet" apart from an empty direction.
    pub has_trips: bool,
    pub available_sub_lines: Vec<char>,
}

#[derive(Debug)]
pub struct Session {
    state: SessionState,
    epoch: u64,
    next_seq: u64,
    in_flight: Option<FetchTicket>,
}

impl Session {
    pub fn new(selection: LineSelection) -> Self {
        Self {
            state: SessionState {
                selection,
                trips: Vec::new(),
                phase: Phase::Idle,
                error: None,
                last_updated: None,
            },
            epoch: 0,
            next_seq: 0,
            in_flight: None,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn in_flight(&self) -> Option<FetchTicket> {
        self.in_flight
    }

    /// Starts a fetch for the current selection.
    ///
    /// Returns `None` while a fetch for the current selection is already in
    /// flight; the pending one will bring fresh data.
    pub fn request(&mut self, trigger: Trigger) -> Option<FetchTicket> {
        if let Some(pending) = self.in_flight {
            debug!(?trigger, pending = pending.seq, "Fetch already in flight, coalescing");
            return None;
        }
        let ticket = self.issue();
        debug!(?trigger, seq = ticket.seq, feed = %ticket.selection.feed, "Fetch issued");
        Some(ticket)
    }

    /// Switches to `selection`.
    ///
    /// A new feed clears the trips and error right away, so the old feed's
    /// data never shows under the new label, and supersedes any fetch in
    /// flight.
    pub fn select(&mut self, selection: LineSelection) -> SelectionChange {
        if selection == self.state.selection {
            return SelectionChange::Unchanged;
        }
        if selection.feed == self.state.selection.feed {
            // Sub-lines share one feed payload; the loaded trips are
            // re-filtered and the next timer tick refreshes them.
            self.state.selection = selection;
            return SelectionChange::Refiltered;
        }

        info!(from = %self.state.selection.feed, to = %selection.feed, "Feed changed");
        self.epoch += 1;
        self.state.selection = selection;
        self.state.trips.clear();
        self.state.error = None;
        self.state.last_updated = None;
        self.in_flight = None;
        SelectionChange::Refetch(self.issue())
    }

    /// Applies the result of the fetch identified by `ticket`, completed at `at`.
    pub fn complete(
        &mut self,
        ticket: FetchTicket,
        result: Result<Vec<Trip>, FetchError>,
        at: DateTime<Utc>,
    ) -> Completion {
        if self.in_flight != Some(ticket) {
            debug!(
                seq = ticket.seq,
                feed = %ticket.selection.feed,
                stale_epoch = ticket.epoch != self.epoch,
                "Discarding superseded fetch result"
            );
            return Completion::Discarded;
        }
        self.in_flight = None;

        match result {
            Ok(trips) => {
                info!(feed = %ticket.selection.feed, trips = trips.len(), "Trips loaded");
                self.state.trips = trips;
                self.state.last_updated = Some(at);
                self.state.error = None;
                self.state.phase = Phase::Loaded;
            }
            Err(e) => {
                warn!(feed = %ticket.selection.feed, error = %e, "Trip fetch failed");
                self.state.error = Some(format!(
                    "There was a problem retrieving data for line {}. {e}",
                    ticket.selection.feed.key().to_uppercase()
                ));
                self.state.phase = Phase::Errored;
            }
        }
        Completion::Applied
    }

    /// Builds the board for the current state.
    pub fn view(&self, ctx: DisplayContext<'_>) -> RealtimeView {
        let selection = self.state.selection;
        RealtimeView {
            selection,
            feed_label: selection.feed.label(),
            board: build_board(&self.state.trips, &selection, ctx),
            loading: self.state.loading(),
            error: self.state.error.clone(),
            last_updated: self.state.last_updated,
            has_trips: !self.state.trips.is_empty(),
            available_sub_lines: selection.feed.sub_lines().to_vec(),
        }
    }

    fn issue(&mut self) -> FetchTicket {
        self.next_seq += 1;
        let ticket = FetchTicket {
            seq: self.next_seq,
            epoch: self.epoch,
            selection: self.state.selection,
        };
        self.in_flight = Some(ticket);
        self.state.phase = Phase::Loading;
        ticket
    }
}
