use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use subway_realtime::accessibility::{PanelState, StationPanel};
use subway_realtime::config::SessionConfig;
use subway_realtime::controller::SessionController;
use subway_realtime::error::FetchError;
use subway_realtime::feeds::{FeedKey, LineSelection};
use subway_realtime::fetch::Transport;
use subway_realtime::session::RealtimeView;
use subway_realtime::stations::{StationDirectory, StationLookup};
use tokio::sync::oneshot;

const BDFM_TRIPS: &str = include_str!("fixtures/bdfm_trips.json");
const ACCESSIBILITY_A42: &str = include_str!("fixtures/accessibility_a42.json");
const STOPS: &str = include_str!("fixtures/stops.txt");

type Reply = Result<Value, FetchError>;

enum Scripted {
    Ready(Reply),
    Gated(oneshot::Receiver<Reply>),
}

/// In-memory transport answering each path from a queue of scripted replies.
#[derive(Default)]
struct FakeTransport {
    replies: Mutex<HashMap<String, VecDeque<Scripted>>>,
    requests: Mutex<Vec<String>>,
}

impl FakeTransport {
    fn reply(&self, path: &str, reply: Reply) {
        self.push(path, Scripted::Ready(reply));
    }

    fn gate(&self, path: &str) -> oneshot::Sender<Reply> {
        let (tx, rx) = oneshot::channel();
        self.push(path, Scripted::Gated(rx));
        tx
    }

    fn push(&self, path: &str, scripted: Scripted) {
        self.replies
            .lock()
            .unwrap()
            .entry(path.to_string())
            .or_default()
            .push_back(scripted);
    }

    fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn fetch_json(&self, path: &str) -> Result<Value, FetchError> {
        self.requests.lock().unwrap().push(path.to_string());
        let next = self
            .replies
            .lock()
            .unwrap()
            .get_mut(path)
            .and_then(VecDeque::pop_front);
        match next {
            Some(Scripted::Ready(reply)) => reply,
            Some(Scripted::Gated(rx)) => rx
                .await
                .unwrap_or_else(|_| Err(FetchError::Malformed("gate dropped".to_string()))),
            None => Err(FetchError::Status {
                status: 404,
                path: path.to_string(),
            }),
        }
    }
}

fn fixture(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap()
}

fn stations() -> Arc<dyn StationLookup> {
    Arc::new(StationDirectory::from_reader(STOPS.as_bytes()).unwrap())
}

fn spawn(transport: &Arc<FakeTransport>, selection: LineSelection) -> SessionController {
    let transport: Arc<dyn Transport> = transport.clone();
    SessionController::spawn(
        transport,
        stations(),
        SessionConfig::default().with_selection(selection),
    )
}

fn ids(trips: &[subway_realtime::board::DisplayTrip]) -> Vec<&str> {
    trips.iter().map(|t| t.trip_id.as_str()).collect()
}

fn loaded(v: &RealtimeView) -> bool {
    v.has_trips && !v.loading
}

#[tokio::test]
async fn test_full_board_from_fixture() {
    let transport = Arc::new(FakeTransport::default());
    transport.reply("/bdfm", Ok(fixture(BDFM_TRIPS)));

    let controller = spawn(&transport, LineSelection::new(FeedKey::Bdfm));
    let view = controller.subscribe().wait_for(loaded).await.unwrap().clone();

    assert_eq!(ids(&view.board.northbound), ["D.N12R", "087650_B..N23R"]);
    assert_eq!(ids(&view.board.southbound), ["F.S07R", "134100_M..S71R"]);
    assert_eq!(view.error, None);
    assert!(view.last_updated.is_some());
    assert_eq!(view.available_sub_lines, ['B', 'D', 'F', 'M']);

    let f_train = &view.board.southbound[0];
    assert_eq!(f_train.route_label, "F");
    let stations: Vec<_> = f_train.stops.iter().map(|s| s.station.as_str()).collect();
    assert_eq!(
        stations,
        ["Roosevelt Island", "Lexington Av/63 St", "57 St", "5 Av/53 St"]
    );
    assert_eq!(f_train.stops[2].eta.to_string(), "N/A");
    assert_eq!(f_train.stops[2].arrival_clock, "N/A");
    assert_eq!(f_train.stops[0].arrival_clock, "12:31");

    assert_eq!(view.board.northbound[1].route_label, "B");
    assert!(view.board.northbound[1].stops.is_empty());

    assert_eq!(transport.requests(), ["/bdfm"]);
    controller.shutdown().await;
}

#[tokio::test]
async fn test_sub_line_filter_end_to_end() {
    let transport = Arc::new(FakeTransport::default());
    transport.reply("/bdfm", Ok(fixture(BDFM_TRIPS)));

    let selection = LineSelection::new(FeedKey::Bdfm)
        .with_sub_line(Some('F'))
        .unwrap();
    let controller = spawn(&transport, selection);
    let view = controller.subscribe().wait_for(loaded).await.unwrap().clone();

    assert!(view.board.northbound.is_empty());
    assert_eq!(ids(&view.board.southbound), ["F.S07R"]);
    assert!(view.has_trips);

    controller.select(LineSelection::new(FeedKey::Bdfm)).unwrap();
    let view = controller
        .subscribe()
        .wait_for(|v| v.selection.sub_line.is_none())
        .await
        .unwrap()
        .clone();
    assert_eq!(view.board.northbound.len(), 2);
    assert_eq!(transport.requests(), ["/bdfm"]);

    controller.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_late_result_for_previous_feed_is_discarded() {
    let transport = Arc::new(FakeTransport::default());
    let release_ace = transport.gate("/ace");
    let release_bdfm = transport.gate("/bdfm");

    let controller = spawn(&transport, LineSelection::new(FeedKey::Ace));
    controller.select(LineSelection::new(FeedKey::Bdfm)).unwrap();

    release_bdfm.send(Ok(fixture(BDFM_TRIPS))).unwrap();
    let mut view = controller.subscribe();
    let shown = view
        .wait_for(|v| v.selection.feed == FeedKey::Bdfm && loaded(v))
        .await
        .unwrap()
        .clone();

    let ace_trips = serde_json::json!([{ "trip_id": "A.N01R" }, { "trip_id": "C.S02R" }]);
    release_ace.send(Ok(ace_trips)).unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;

    let after = controller.current();
    assert_eq!(after, shown);
    assert_eq!(after.selection.feed, FeedKey::Bdfm);
    assert_eq!(ids(&after.board.southbound), ["F.S07R", "134100_M..S71R"]);
    assert!(!view.has_changed().unwrap());

    controller.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_feed_change_clears_board_before_new_data_arrives() {
    let transport = Arc::new(FakeTransport::default());
    transport.reply("/bdfm", Ok(fixture(BDFM_TRIPS)));
    let release_ace = transport.gate("/ace");

    let controller = spawn(&transport, LineSelection::new(FeedKey::Bdfm));
    let mut view = controller.subscribe();
    view.wait_for(loaded).await.unwrap();

    controller.select(LineSelection::new(FeedKey::Ace)).unwrap();
    let switching = view
        .wait_for(|v| v.selection.feed == FeedKey::Ace)
        .await
        .unwrap()
        .clone();
    assert!(switching.loading);
    assert!(!switching.has_trips);
    assert!(switching.board.northbound.is_empty());
    assert!(switching.board.southbound.is_empty());
    assert_eq!(switching.feed_label, "A C E");

    release_ace
        .send(Ok(serde_json::json!([{ "trip_id": "A.N01R" }])))
        .unwrap();
    let arrived = view.wait_for(loaded).await.unwrap().clone();
    assert_eq!(ids(&arrived.board.northbound), ["A.N01R"]);

    controller.shutdown().await;
}

#[tokio::test]
async fn test_failed_refresh_keeps_previous_board() {
    let transport = Arc::new(FakeTransport::default());
    transport.reply("/bdfm", Ok(fixture(BDFM_TRIPS)));
    transport.reply(
        "/bdfm",
        Err(FetchError::Status {
            status: 503,
            path: "/bdfm".to_string(),
        }),
    );

    let controller = spawn(&transport, LineSelection::new(FeedKey::Bdfm));
    let mut view = controller.subscribe();
    let before = view.wait_for(loaded).await.unwrap().clone();

    controller.refresh().unwrap();
    let failed = view
        .wait_for(|v| v.error.is_some() && !v.loading)
        .await
        .unwrap()
        .clone();

    let error = failed.error.as_deref().unwrap();
    assert!(error.contains("line BDFM"));
    assert!(error.contains("503"));
    assert_eq!(failed.board, before.board);
    assert_eq!(failed.last_updated, before.last_updated);

    controller.shutdown().await;
}

#[tokio::test]
async fn test_malformed_payload_is_an_error_state() {
    let transport = Arc::new(FakeTransport::default());
    transport.reply("/g", Ok(serde_json::json!({ "error": "Invalid line specified" })));

    let controller = spawn(&transport, LineSelection::new(FeedKey::G));
    let view = controller
        .subscribe()
        .wait_for(|v| v.error.is_some())
        .await
        .unwrap()
        .clone();

    assert!(!view.has_trips);
    assert!(!view.loading);
    assert!(view.error.unwrap().contains("line G"));

    controller.shutdown().await;
}

#[tokio::test]
async fn test_station_accessibility_from_fixture() {
    let transport = FakeTransport::default();
    transport.reply("/mta/accessibility/A42", Ok(fixture(ACCESSIBILITY_A42)));

    let mut panel = StationPanel::new();
    let PanelState::Loaded(view) = panel.show(&transport, "A42").await.clone() else {
        panic!("accessibility did not load");
    };

    assert_eq!(view.working_elevators.len(), 2);
    assert_eq!(view.out_of_service_elevators.len(), 1);
    assert_eq!(
        view.working_elevators.len() + view.out_of_service_elevators.len(),
        view.totals.elevators
    );
    assert_eq!(view.out_of_service_elevators[0].status, "Under repair");
    assert_eq!(
        view.out_of_service_elevators[0].estimated_return.as_deref(),
        Some("03/08/2025 05:00 PM")
    );
    assert_eq!(view.working_elevators[1].location, "N/A");
    assert_eq!(view.out_of_service_escalators[0].status, "Out of Service");
    assert!(view.has_upcoming_outages);
    assert_eq!(view.outages[0].kind, "ELEVATOR");
}
