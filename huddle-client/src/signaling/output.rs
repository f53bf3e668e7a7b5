use crate::error::SignalingError;
use async_trait::async_trait;
use huddle_core::{ClientEnvelope, ServerEnvelope};
use tokio::sync::mpsc;

/// Outgoing half of the signaling channel.
///
/// Implemented by the WebSocket channel in production and by a capturing
/// mock in tests, so the coordinator never depends on the transport itself.
#[async_trait]
pub trait SignalingOutput: Send + Sync {
    async fn send(&self, envelope: ClientEnvelope) -> Result<(), SignalingError>;
}

/// A live connection to the relay: the outgoing sink plus the stream of
/// incoming envelopes. The receiver yields `None` when the relay is gone.
pub struct SignalingConnection {
    pub output: std::sync::Arc<dyn SignalingOutput>,
    pub incoming: mpsc::Receiver<ServerEnvelope>,
}

/// Opens connections to the relay. One connection per room session.
#[async_trait]
pub trait SignalingConnector: Send + Sync {
    async fn connect(&self) -> Result<SignalingConnection, SignalingError>;
}
