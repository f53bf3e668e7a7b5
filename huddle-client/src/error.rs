use huddle_core::{ModelError, ParticipantId};
use thiserror::Error;

/// Signaling channel failures: connecting, encoding, or a closed socket.
#[derive(Debug, Error)]
pub enum SignalingError {
    #[error("invalid signaling url: {0}")]
    Url(#[from] url::ParseError),

    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("envelope encoding failed: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("signaling channel closed")]
    Closed,
}

/// Local capture failures. Fatal to joining, surfaced to the user.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("media capture unavailable: {0}")]
    Unavailable(String),
}

/// Media-transport level failures.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error(transparent)]
    Rtc(#[from] webrtc::Error),

    #[error("malformed ICE candidate payload: {0}")]
    Candidate(#[from] serde_json::Error),
}

/// Per-peer failures. These stay local to the session/registry boundary and
/// never affect other peers or the room connection itself.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("negotiation with {peer} failed: {source}")]
    Negotiation {
        peer: ParticipantId,
        source: TransportError,
    },

    #[error("signaling send to {peer} failed: {source}")]
    Signaling {
        peer: ParticipantId,
        source: SignalingError,
    },
}

impl SessionError {
    pub fn peer(&self) -> &ParticipantId {
        match self {
            Self::Negotiation { peer, .. } | Self::Signaling { peer, .. } => peer,
        }
    }
}

/// Room-level join failures, surfaced to the presentation layer.
#[derive(Debug, Error)]
pub enum JoinError {
    #[error(transparent)]
    InvalidId(#[from] ModelError),

    #[error("already in a room")]
    AlreadyJoined,

    #[error("media acquisition failed: {0}")]
    Media(#[from] MediaError),

    #[error("could not reach the signaling relay: {0}")]
    Signaling(#[from] SignalingError),
}
