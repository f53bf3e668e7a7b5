use async_trait::async_trait;
use huddle_client::{SignalingConnection, SignalingConnector, SignalingError, SignalingOutput};
use huddle_core::{ClientEnvelope, ServerEnvelope};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, mpsc};

/// Mock SignalingOutput that captures all outgoing envelopes.
pub struct MockSignalingOutput {
    sent: Mutex<Vec<ClientEnvelope>>,
}

impl MockSignalingOutput {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Everything sent so far, in order.
    pub async fn sent(&self) -> Vec<ClientEnvelope> {
        self.sent.lock().await.clone()
    }

    /// All offers addressed to `target`.
    pub async fn offers_to(&self, target: &str) -> Vec<String> {
        self.sent
            .lock()
            .await
            .iter()
            .filter_map(|e| match e {
                ClientEnvelope::Offer { target: t, sdp } if t.as_str() == target => {
                    Some(sdp.clone())
                }
                _ => None,
            })
            .collect()
    }

    /// All answers addressed to `target`.
    pub async fn answers_to(&self, target: &str) -> Vec<String> {
        self.sent
            .lock()
            .await
            .iter()
            .filter_map(|e| match e {
                ClientEnvelope::Answer { target: t, sdp } if t.as_str() == target => {
                    Some(sdp.clone())
                }
                _ => None,
            })
            .collect()
    }

    /// Poll until an envelope matching `pred` was sent. Panics on timeout.
    pub async fn wait_for<F>(&self, pred: F) -> ClientEnvelope
    where
        F: Fn(&ClientEnvelope) -> bool,
    {
        let deadline = Instant::now() + Duration::from_millis(crate::WAIT_TIMEOUT_MS);
        loop {
            if let Some(envelope) = self.sent.lock().await.iter().find(|e| pred(e)) {
                return envelope.clone();
            }
            assert!(Instant::now() < deadline, "envelope never sent");
            tokio::time::sleep(Duration::from_millis(crate::POLL_INTERVAL_MS)).await;
        }
    }
}

impl Default for MockSignalingOutput {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SignalingOutput for MockSignalingOutput {
    async fn send(&self, envelope: ClientEnvelope) -> Result<(), SignalingError> {
        tracing::debug!("[MockSignaling] send {envelope:?}");
        self.sent.lock().await.push(envelope);
        Ok(())
    }
}

/// Connector handing out one mock connection; the test keeps the relay end.
pub struct MockConnector {
    output: Arc<MockSignalingOutput>,
    incoming: StdMutex<Option<mpsc::Receiver<ServerEnvelope>>>,
}

impl MockConnector {
    pub fn new() -> (Arc<Self>, mpsc::Sender<ServerEnvelope>, Arc<MockSignalingOutput>) {
        let (relay_tx, incoming) = mpsc::channel(64);
        let output = Arc::new(MockSignalingOutput::new());
        let connector = Arc::new(Self {
            output: Arc::clone(&output),
            incoming: StdMutex::new(Some(incoming)),
        });
        (connector, relay_tx, output)
    }
}

#[async_trait]
impl SignalingConnector for MockConnector {
    async fn connect(&self) -> Result<SignalingConnection, SignalingError> {
        let incoming = self
            .incoming
            .lock()
            .expect("incoming lock")
            .take()
            .ok_or(SignalingError::Closed)?;
        Ok(SignalingConnection {
            output: Arc::clone(&self.output) as Arc<dyn SignalingOutput>,
            incoming,
        })
    }
}
