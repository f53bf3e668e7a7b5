mod roster_tests;

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::Level;

use huddle_client::{RoomCoordinator, RoomEvent, RoomHandle, RoomSnapshot};
use huddle_core::{RosterEntry, ServerEnvelope};

use crate::utils::{MockConnector, MockSignalingOutput, MockTransportFactory, StubMediaProvider};

pub const WAIT_TIMEOUT_MS: u64 = 5000;
pub const POLL_INTERVAL_MS: u64 = 10;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// One coordinator wired to mocks, plus the test's ends of every seam.
pub struct TestRoom {
    pub handle: RoomHandle,
    pub events: mpsc::UnboundedReceiver<RoomEvent>,
    /// Feed relay envelopes here; dropping it simulates channel loss.
    pub relay_tx: mpsc::Sender<ServerEnvelope>,
    pub output: Arc<MockSignalingOutput>,
    pub factory: Arc<MockTransportFactory>,
}

pub fn create_test_room() -> TestRoom {
    init_tracing();

    let (connector, relay_tx, output) = MockConnector::new();
    let factory = Arc::new(MockTransportFactory::default());
    let provider = Arc::new(StubMediaProvider::default());

    let (coordinator, handle, events) =
        RoomCoordinator::new(connector, provider, factory.clone());
    tokio::spawn(coordinator.run());

    TestRoom {
        handle,
        events,
        relay_tx,
        output,
        factory,
    }
}

impl TestRoom {
    /// Join `room_id` and deliver the relay's roster snapshot.
    pub async fn join_with_roster(
        &self,
        room_id: &str,
        self_id: &str,
        self_name: &str,
        existing: Vec<RosterEntry>,
    ) {
        self.handle
            .join(room_id, self_name)
            .await
            .expect("actor alive");
        let user_count = existing.len() as u32 + 1;
        self.relay_tx
            .send(ServerEnvelope::RoomJoined {
                room_id: room_id.to_owned(),
                self_id: self_id.into(),
                self_name: self_name.to_owned(),
                user_count,
                users: existing,
            })
            .await
            .expect("relay channel open");
        wait_for(&self.handle, |s| s.state == huddle_client::RoomState::Joined).await;
    }
}

pub fn roster_entry(id: &str, name: &str) -> RosterEntry {
    RosterEntry {
        id: id.into(),
        name: name.to_owned(),
    }
}

/// Poll snapshots until `pred` holds. Panics after the timeout.
pub async fn wait_for<F>(handle: &RoomHandle, pred: F) -> RoomSnapshot
where
    F: Fn(&RoomSnapshot) -> bool,
{
    let deadline = Instant::now() + Duration::from_millis(WAIT_TIMEOUT_MS);
    loop {
        let snapshot = handle.snapshot().await.expect("actor alive");
        if pred(&snapshot) {
            return snapshot;
        }
        assert!(
            Instant::now() < deadline,
            "condition not reached in time; last snapshot: {snapshot:?}"
        );
        tokio::time::sleep(Duration::from_millis(POLL_INTERVAL_MS)).await;
    }
}

/// Wait for a [`RoomEvent`] matching `pred`, discarding everything earlier.
pub async fn wait_for_event<F>(
    events: &mut mpsc::UnboundedReceiver<RoomEvent>,
    pred: F,
) -> RoomEvent
where
    F: Fn(&RoomEvent) -> bool,
{
    let deadline = Duration::from_millis(WAIT_TIMEOUT_MS);
    tokio::time::timeout(deadline, async {
        loop {
            let event = events.recv().await.expect("event stream open");
            if pred(&event) {
                return event;
            }
        }
    })
    .await
    .expect("event not delivered in time")
}
