use crate::error::SignalingError;
use crate::signaling::{SignalingConnection, SignalingConnector, SignalingOutput};
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use huddle_core::{ClientEnvelope, ServerEnvelope};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};
use url::Url;

const INCOMING_BUFFER: usize = 256;

/// WebSocket endpoint of the relay service.
#[derive(Debug, Clone)]
pub struct SignalingConfig {
    pub url: String,
}

/// WebSocket signaling channel: JSON text frames, one envelope per frame.
///
/// A writer task drains the outgoing queue into the socket; a reader task
/// parses incoming frames into [`ServerEnvelope`]s. Dropping the incoming
/// sender (socket closed or errored) signals channel loss to the consumer.
pub struct WsSignalingChannel {
    out_tx: mpsc::UnboundedSender<Message>,
}

impl WsSignalingChannel {
    pub async fn connect(
        config: &SignalingConfig,
    ) -> Result<(Arc<Self>, mpsc::Receiver<ServerEnvelope>), SignalingError> {
        let url = Url::parse(&config.url)?;
        let (socket, _response) = connect_async(url.as_str()).await?;
        info!("Signaling channel connected to {}", url);

        let (mut sink, mut stream) = socket.split();
        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<Message>();
        let (in_tx, in_rx) = mpsc::channel(INCOMING_BUFFER);

        tokio::spawn(async move {
            while let Some(frame) = out_rx.recv().await {
                if let Err(e) = sink.send(frame).await {
                    warn!("Signaling send failed, closing writer: {e}");
                    break;
                }
            }
        });

        tokio::spawn(async move {
            while let Some(frame) = stream.next().await {
                match frame {
                    Ok(Message::Text(text)) => match serde_json::from_str::<ServerEnvelope>(&text)
                    {
                        Ok(envelope) => {
                            if in_tx.send(envelope).await.is_err() {
                                debug!("Envelope consumer gone, closing reader");
                                break;
                            }
                        }
                        Err(e) => warn!("Dropping unparseable envelope: {e}"),
                    },
                    Ok(Message::Close(_)) => {
                        info!("Relay closed the signaling channel");
                        break;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!("Signaling read failed: {e}");
                        break;
                    }
                }
            }
            // in_tx drops here; the coordinator sees end-of-stream.
        });

        Ok((Arc::new(Self { out_tx }), in_rx))
    }
}

#[async_trait]
impl SignalingOutput for WsSignalingChannel {
    async fn send(&self, envelope: ClientEnvelope) -> Result<(), SignalingError> {
        let json = serde_json::to_string(&envelope)?;
        self.out_tx
            .send(Message::Text(json.into()))
            .map_err(|_| SignalingError::Closed)
    }
}

/// Production connector: one WebSocket connection per room session.
pub struct WsConnector {
    config: SignalingConfig,
}

impl WsConnector {
    pub fn new(config: SignalingConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl SignalingConnector for WsConnector {
    async fn connect(&self) -> Result<SignalingConnection, SignalingError> {
        let (output, incoming) = WsSignalingChannel::connect(&self.config).await?;
        Ok(SignalingConnection { output, incoming })
    }
}
