use crate::error::SessionError;
use crate::session::PeerTransport;
use crate::signaling::SignalingOutput;
use huddle_core::{ClientEnvelope, ParticipantId};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, warn};

/// Where a session stands in the offer/answer handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationState {
    New,
    HaveLocalOffer,
    HaveRemoteOffer,
    Stable,
    Closed,
}

/// One media-transport negotiation with one remote participant.
///
/// Owned exclusively by the [`SessionRegistry`](super::SessionRegistry);
/// every operation runs on the room actor, so no two steps for the same
/// peer ever interleave. ICE candidates that race ahead of the remote
/// description are queued and drained exactly once, in arrival order, the
/// moment the description lands.
pub struct PeerSession {
    peer_id: ParticipantId,
    state: NegotiationState,
    pending_remote_candidates: VecDeque<String>,
    transport: Arc<dyn PeerTransport>,
    signaling: Arc<dyn SignalingOutput>,
}

impl PeerSession {
    pub fn new(
        peer_id: ParticipantId,
        transport: Arc<dyn PeerTransport>,
        signaling: Arc<dyn SignalingOutput>,
    ) -> Self {
        Self {
            peer_id,
            state: NegotiationState::New,
            pending_remote_candidates: VecDeque::new(),
            transport,
            signaling,
        }
    }

    pub fn peer_id(&self) -> &ParticipantId {
        &self.peer_id
    }

    pub fn state(&self) -> NegotiationState {
        self.state
    }

    /// Start negotiation toward the peer. Valid only from `New`; a failure
    /// is reported upward and the session is not retried automatically.
    pub async fn initiate_offer(&mut self) -> Result<(), SessionError> {
        if self.state != NegotiationState::New {
            warn!(
                "Not initiating toward {} in state {:?}",
                self.peer_id, self.state
            );
            return Ok(());
        }

        let sdp = self
            .transport
            .create_offer()
            .await
            .map_err(|source| SessionError::Negotiation {
                peer: self.peer_id.clone(),
                source,
            })?;
        self.state = NegotiationState::HaveLocalOffer;

        self.send(ClientEnvelope::Offer {
            target: self.peer_id.clone(),
            sdp,
        })
        .await
    }

    /// Answer a remote offer. Valid from `New` (initial handshake) and from
    /// `Stable` (the peer renegotiates an established connection; the fresh
    /// answer leaves the session `Stable`). An offer mid-handshake means the
    /// relay raced or redelivered, and applying it would violate the
    /// transport's single-negotiation contract, so it is ignored.
    pub async fn accept_offer(&mut self, sdp: String) -> Result<(), SessionError> {
        if !matches!(
            self.state,
            NegotiationState::New | NegotiationState::Stable
        ) {
            warn!(
                "Ignoring offer from {} in state {:?}",
                self.peer_id, self.state
            );
            return Ok(());
        }

        self.state = NegotiationState::HaveRemoteOffer;
        let answer =
            self.transport
                .accept_offer(sdp)
                .await
                .map_err(|source| SessionError::Negotiation {
                    peer: self.peer_id.clone(),
                    source,
                })?;
        self.state = NegotiationState::Stable;

        self.send(ClientEnvelope::Answer {
            target: self.peer_id.clone(),
            sdp: answer,
        })
        .await?;

        self.drain_pending_candidates().await;
        Ok(())
    }

    /// Apply a remote answer. Valid only from `HaveLocalOffer`; a stale
    /// answer (after renegotiation or peer departure) is discarded.
    pub async fn accept_answer(&mut self, sdp: String) -> Result<(), SessionError> {
        if self.state != NegotiationState::HaveLocalOffer {
            debug!(
                "Discarding stale answer from {} in state {:?}",
                self.peer_id, self.state
            );
            return Ok(());
        }

        self.transport
            .accept_answer(sdp)
            .await
            .map_err(|source| SessionError::Negotiation {
                peer: self.peer_id.clone(),
                source,
            })?;
        self.state = NegotiationState::Stable;

        self.drain_pending_candidates().await;
        Ok(())
    }

    /// Queue the candidate until the remote description is set, then apply
    /// immediately. ICE tolerates individual failures, so application errors
    /// are logged and negotiation continues.
    pub async fn add_remote_candidate(&mut self, candidate: String) {
        match self.state {
            NegotiationState::Closed => {
                debug!("Dropping candidate for closed session {}", self.peer_id);
            }
            NegotiationState::Stable => {
                if let Err(e) = self.transport.add_ice_candidate(candidate).await {
                    warn!("Candidate from {} failed to apply: {e}", self.peer_id);
                }
            }
            _ => self.pending_remote_candidates.push_back(candidate),
        }
    }

    /// Idempotent; releases the transport and the queued candidates.
    pub async fn close(&mut self) {
        if self.state == NegotiationState::Closed {
            return;
        }
        self.state = NegotiationState::Closed;
        self.pending_remote_candidates.clear();
        if let Err(e) = self.transport.close().await {
            debug!("Transport close for {} reported: {e}", self.peer_id);
        }
    }

    async fn drain_pending_candidates(&mut self) {
        while let Some(candidate) = self.pending_remote_candidates.pop_front() {
            if let Err(e) = self.transport.add_ice_candidate(candidate).await {
                warn!("Queued candidate from {} failed to apply: {e}", self.peer_id);
            }
        }
    }

    async fn send(&self, envelope: ClientEnvelope) -> Result<(), SessionError> {
        self.signaling
            .send(envelope)
            .await
            .map_err(|source| SessionError::Signaling {
                peer: self.peer_id.clone(),
                source,
            })
    }
}
