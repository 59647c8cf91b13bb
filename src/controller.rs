//! Background driver for a [`Session`].
//!
//! A single task owns the session and is the only place it is mutated. It
//! reacts to user commands, a fixed-period refresh timer and fetch
//! completions, and publishes a fresh [`RealtimeView`] on a `watch` channel
//! after every change.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::board::DisplayContext;
use crate::config::SessionConfig;
use crate::error::FetchError;
use crate::feeds::{FeedKey, LineSelection};
use crate::fetch::Transport;
use crate::models::Trip;
use crate::parser::parse_trips;
use crate::session::{Completion, FetchTicket, RealtimeView, SelectionChange, Session, Trigger};
use crate::stations::StationLookup;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("session controller has stopped")]
pub struct ControllerClosed;

#[derive(Debug)]
enum Command {
    Select(LineSelection),
    Refresh,
    Shutdown,
}

type FetchOutput = (FetchTicket, Result<Vec<Trip>, FetchError>);

/// Handle to a running session.
///
/// Dropping the handle without calling [`shutdown`](Self::shutdown) aborts
/// the background task.
pub struct SessionController {
    commands: mpsc::UnboundedSender<Command>,
    view: watch::Receiver<RealtimeView>,
    task: Option<JoinHandle<()>>,
}

impl SessionController {
    /// Activates a session: the first fetch starts immediately and the
    /// refresh timer first fires one interval later.
    pub fn spawn(
        transport: Arc<dyn Transport>,
        stations: Arc<dyn StationLookup>,
        config: SessionConfig,
    ) -> Self {
        let session = Session::new(config.initial_selection);
        let initial = session.view(DisplayContext {
            stations: stations.as_ref(),
            now: Utc::now(),
            tz: config.timezone,
        });
        let (view_tx, view_rx) = watch::channel(initial);
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();

        let worker = Worker {
            session,
            transport,
            stations,
            config,
            view: view_tx,
        };
        let task = tokio::spawn(worker.run(commands_rx));

        Self {
            commands: commands_tx,
            view: view_rx,
            task: Some(task),
        }
    }

    /// Switches line. Changing feeds clears the board and fetches at once;
    /// changing only the sub-line re-filters what is loaded.
    pub fn select(&self, selection: LineSelection) -> Result<(), ControllerClosed> {
        self.send(Command::Select(selection))
    }

    /// Requests an immediate refresh of the current selection.
    pub fn refresh(&self) -> Result<(), ControllerClosed> {
        self.send(Command::Refresh)
    }

    /// A receiver that observes every published view.
    pub fn subscribe(&self) -> watch::Receiver<RealtimeView> {
        self.view.clone()
    }

    /// The most recently published view.
    pub fn current(&self) -> RealtimeView {
        self.view.borrow().clone()
    }

    /// Stops the timer and the session task, waiting for it to finish.
    /// Fetches still in flight are abandoned.
    pub async fn shutdown(mut self) {
        let Some(task) = self.task.take() else {
            return;
        };
        if self.commands.send(Command::Shutdown).is_err() {
            debug!("Session task already stopped");
        }
        if let Err(e) = task.await {
            if !e.is_cancelled() {
                error!(error = %e, "Session task ended abnormally");
            }
        }
    }

    fn send(&self, command: Command) -> Result<(), ControllerClosed> {
        self.commands.send(command).map_err(|_| ControllerClosed)
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Fetches and decodes the trip list for `feed`.
#[tracing::instrument(skip(transport))]
pub async fn fetch_trips(transport: &dyn Transport, feed: FeedKey) -> Result<Vec<Trip>, FetchError> {
    let payload = transport.fetch_json(&feed.trips_path()).await?;
    parse_trips(payload)
}

struct Worker {
    session: Session,
    transport: Arc<dyn Transport>,
    stations: Arc<dyn StationLookup>,
    config: SessionConfig,
    view: watch::Sender<RealtimeView>,
}

impl Worker {
    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        let period = self.config.refresh_interval;
        info!(
            feed = %self.session.state().selection.feed,
            interval_secs = period.as_secs(),
            "Session activated"
        );

        let mut fetches: JoinSet<FetchOutput> = JoinSet::new();
        let ticket = self.session.request(Trigger::Activation);
        self.start(&mut fetches, ticket);

        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(Command::Select(selection)) => match self.session.select(selection) {
                        SelectionChange::Unchanged => {}
                        SelectionChange::Refiltered => self.publish(),
                        SelectionChange::Refetch(ticket) => {
                            ticker.reset();
                            self.start(&mut fetches, Some(ticket));
                        }
                    },
                    Some(Command::Refresh) => {
                        let ticket = self.session.request(Trigger::Manual);
                        self.start(&mut fetches, ticket);
                    }
                    Some(Command::Shutdown) | None => break,
                },
                _ = ticker.tick() => {
                    let ticket = self.session.request(Trigger::Timer);
                    self.start(&mut fetches, ticket);
                }
                Some(joined) = fetches.join_next() => match joined {
                    Ok((ticket, result)) => {
                        if self.session.complete(ticket, result, Utc::now()) == Completion::Applied {
                            self.publish();
                        }
                    }
                    Err(e) => error!(error = %e, "Fetch task failed"),
                },
            }
        }

        fetches.abort_all();
        info!("Session deactivated");
    }

    /// Spawns the fetch for `ticket` (if any) and publishes the loading state.
    fn start(&mut self, fetches: &mut JoinSet<FetchOutput>, ticket: Option<FetchTicket>) {
        let Some(ticket) = ticket else {
            return;
        };
        let transport = Arc::clone(&self.transport);
        fetches.spawn(async move {
            let result = fetch_trips(transport.as_ref(), ticket.selection.feed).await;
            (ticket, result)
        });
        self.publish();
    }

    fn publish(&self) {
        let view = self.session.view(DisplayContext {
            stations: self.stations.as_ref(),
            now: Utc::now(),
            tz: self.config.timezone,
        });
        self.view.send_replace(view);
    }
}
