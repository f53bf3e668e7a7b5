use crate::error::TransportError;
use crate::media::LocalTrack;
use async_trait::async_trait;
use huddle_core::ParticipantId;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::RTCRtpTransceiver;
use webrtc::rtp_transceiver::rtp_receiver::RTCRtpReceiver;
use webrtc::track::track_remote::TrackRemote;

/// STUN/TURN configuration for peer transports.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub ice_servers: Vec<String>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            ice_servers: vec!["stun:stun.l.google.com:19302".to_owned()],
        }
    }
}

/// Events a peer transport pushes back into the room actor.
pub enum TransportEvent {
    /// Trickle ICE: a local candidate to forward to the peer via the relay.
    CandidateGenerated(ParticipantId, String),
    /// The peer's media arrived.
    RemoteTrack(ParticipantId, Arc<TrackRemote>),
    /// The underlying connection failed, disconnected, or closed.
    PeerClosed(ParticipantId),
}

/// The opaque media-transport handle a [`PeerSession`](super::PeerSession)
/// negotiates over. One per remote participant; local tracks are attached
/// once, at creation, before any negotiation message is sent.
#[async_trait]
pub trait PeerTransport: Send + Sync {
    /// Generate a local offer and install it as the local description.
    async fn create_offer(&self) -> Result<String, TransportError>;

    /// Apply a remote offer, then generate and install the local answer.
    async fn accept_offer(&self, sdp: String) -> Result<String, TransportError>;

    /// Apply a remote answer.
    async fn accept_answer(&self, sdp: String) -> Result<(), TransportError>;

    /// Apply a remote ICE candidate (JSON payload).
    async fn add_ice_candidate(&self, candidate: String) -> Result<(), TransportError>;

    async fn close(&self) -> Result<(), TransportError>;
}

/// Creates peer transports. The registry goes through this seam so tests can
/// substitute scripted transports for real peer connections.
#[async_trait]
pub trait TransportFactory: Send + Sync {
    async fn create(
        &self,
        peer_id: ParticipantId,
        tracks: &[LocalTrack],
        events: mpsc::Sender<TransportEvent>,
    ) -> Result<Arc<dyn PeerTransport>, TransportError>;
}

/// Real transport backed by an `RTCPeerConnection`.
pub struct RtcTransport {
    peer_id: ParticipantId,
    peer_connection: Arc<RTCPeerConnection>,
}

impl RtcTransport {
    pub async fn new(
        peer_id: ParticipantId,
        config: TransportConfig,
        tracks: &[LocalTrack],
        event_tx: mpsc::Sender<TransportEvent>,
    ) -> Result<Self, TransportError> {
        let mut media_engine = MediaEngine::default();
        media_engine.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut media_engine)?;

        let api = APIBuilder::new()
            .with_media_engine(media_engine)
            .with_interceptor_registry(registry)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: vec![RTCIceServer {
                urls: config.ice_servers,
                ..Default::default()
            }],
            ..Default::default()
        };

        let peer_connection = Arc::new(api.new_peer_connection(rtc_config).await?);

        // Connection health: failures and disconnects surface as one event,
        // the room actor decides what to do with the session.
        let state_tx = event_tx.clone();
        let state_peer = peer_id.clone();
        peer_connection.on_peer_connection_state_change(Box::new(
            move |s: RTCPeerConnectionState| {
                let tx = state_tx.clone();
                let peer = state_peer.clone();

                Box::pin(async move {
                    info!("Connection state for {peer}: {s:?}");
                    match s {
                        RTCPeerConnectionState::Failed
                        | RTCPeerConnectionState::Disconnected
                        | RTCPeerConnectionState::Closed => {
                            let _ = tx.send(TransportEvent::PeerClosed(peer)).await;
                        }
                        _ => {}
                    }
                })
            },
        ));

        // Trickle ICE: every locally gathered candidate goes back through the
        // relay to the peer.
        let ice_tx = event_tx.clone();
        let ice_peer = peer_id.clone();
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let tx = ice_tx.clone();
            let peer = ice_peer.clone();

            Box::pin(async move {
                let Some(candidate) = c else { return };
                let Ok(init) = candidate.to_json() else {
                    return;
                };
                let Ok(payload) = serde_json::to_string(&init) else {
                    return;
                };
                let _ = tx
                    .send(TransportEvent::CandidateGenerated(peer, payload))
                    .await;
            })
        }));

        let track_tx = event_tx.clone();
        let track_peer = peer_id.clone();
        peer_connection.on_track(Box::new(
            move |track: Arc<TrackRemote>,
                  _receiver: Arc<RTCRtpReceiver>,
                  _transceiver: Arc<RTCRtpTransceiver>| {
                let tx = track_tx.clone();
                let peer = track_peer.clone();

                Box::pin(async move {
                    debug!("Remote track {} from {peer}", track.id());
                    let _ = tx.send(TransportEvent::RemoteTrack(peer, track)).await;
                })
            },
        ));

        // Attach local media before any offer or answer exists, so the first
        // negotiated description already carries our tracks.
        for track in tracks {
            peer_connection.add_track(Arc::clone(track)).await?;
        }

        Ok(Self {
            peer_id,
            peer_connection,
        })
    }
}

#[async_trait]
impl PeerTransport for RtcTransport {
    async fn create_offer(&self) -> Result<String, TransportError> {
        let offer = self.peer_connection.create_offer(None).await?;
        self.peer_connection
            .set_local_description(offer.clone())
            .await?;
        Ok(offer.sdp)
    }

    async fn accept_offer(&self, sdp: String) -> Result<String, TransportError> {
        let offer = RTCSessionDescription::offer(sdp)?;
        self.peer_connection.set_remote_description(offer).await?;

        let answer = self.peer_connection.create_answer(None).await?;
        self.peer_connection
            .set_local_description(answer.clone())
            .await?;
        Ok(answer.sdp)
    }

    async fn accept_answer(&self, sdp: String) -> Result<(), TransportError> {
        let answer = RTCSessionDescription::answer(sdp)?;
        self.peer_connection.set_remote_description(answer).await?;
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate: String) -> Result<(), TransportError> {
        let init: RTCIceCandidateInit = serde_json::from_str(&candidate)?;
        self.peer_connection.add_ice_candidate(init).await?;
        Ok(())
    }

    async fn close(&self) -> Result<(), TransportError> {
        debug!("Closing transport for {}", self.peer_id);
        self.peer_connection.close().await?;
        Ok(())
    }
}

/// Production factory.
pub struct RtcTransportFactory {
    config: TransportConfig,
}

impl RtcTransportFactory {
    pub fn new(config: TransportConfig) -> Self {
        Self { config }
    }
}

impl Default for RtcTransportFactory {
    fn default() -> Self {
        Self::new(TransportConfig::default())
    }
}

#[async_trait]
impl TransportFactory for RtcTransportFactory {
    async fn create(
        &self,
        peer_id: ParticipantId,
        tracks: &[LocalTrack],
        events: mpsc::Sender<TransportEvent>,
    ) -> Result<Arc<dyn PeerTransport>, TransportError> {
        let transport = RtcTransport::new(peer_id, self.config.clone(), tracks, events).await?;
        Ok(Arc::new(transport))
    }
}
