use crate::error::SessionError;
use crate::media::LocalTrack;
use crate::session::{NegotiationState, PeerSession, TransportEvent, TransportFactory};
use crate::signaling::SignalingOutput;
use huddle_core::{Participant, ParticipantId};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Owns every [`PeerSession`] for the current room.
///
/// Single-writer: only the room actor calls in here, and nothing outside the
/// registry can reach the session map. At most one session exists per
/// participant id at any time.
pub struct SessionRegistry {
    sessions: HashMap<ParticipantId, PeerSession>,
    factory: Arc<dyn TransportFactory>,
    signaling: Arc<dyn SignalingOutput>,
    tracks: Vec<LocalTrack>,
    transport_tx: mpsc::Sender<TransportEvent>,
}

impl SessionRegistry {
    pub fn new(
        factory: Arc<dyn TransportFactory>,
        signaling: Arc<dyn SignalingOutput>,
        tracks: Vec<LocalTrack>,
        transport_tx: mpsc::Sender<TransportEvent>,
    ) -> Self {
        Self {
            sessions: HashMap::new(),
            factory,
            signaling,
            tracks,
            transport_tx,
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn contains(&self, peer_id: &ParticipantId) -> bool {
        self.sessions.contains_key(peer_id)
    }

    /// Per-peer negotiation states, for the view-model snapshot.
    pub fn states(&self) -> Vec<(ParticipantId, NegotiationState)> {
        let mut states: Vec<_> = self
            .sessions
            .values()
            .map(|s| (s.peer_id().clone(), s.state()))
            .collect();
        states.sort_by(|(a, _), (b, _)| a.cmp(b));
        states
    }

    /// We just joined: initiate an offer toward every member already present.
    ///
    /// This is the one point where this endpoint is the offer-initiator; a
    /// later `UserJoined` never triggers an offer from this side (the new
    /// participant observes us in its own roster snapshot and offers first),
    /// which is what prevents glare without a numeric tie-break.
    ///
    /// Per-peer failures are collected, not propagated: one unreachable peer
    /// must not affect the others.
    pub async fn on_room_joined(
        &mut self,
        self_id: &ParticipantId,
        existing: &[Participant],
    ) -> Vec<SessionError> {
        let mut failures = Vec::new();
        for participant in existing {
            if &participant.id == self_id || self.sessions.contains_key(&participant.id) {
                continue;
            }
            if let Err(e) = self.create_session(&participant.id).await {
                failures.push(e);
                continue;
            }
            let offered = match self.sessions.get_mut(&participant.id) {
                Some(session) => session.initiate_offer().await,
                None => Ok(()),
            };
            if let Err(e) = offered {
                self.drop_session(e.peer().clone()).await;
                failures.push(e);
            }
        }
        failures
    }

    /// Peer left the room: close and forget its session.
    pub async fn on_user_left(&mut self, peer_id: &ParticipantId) {
        if let Some(mut session) = self.sessions.remove(peer_id) {
            info!("Closing session for departed peer {peer_id}");
            session.close().await;
        }
    }

    /// Route a remote offer, creating the session first if absent. An offer
    /// may legitimately arrive before any local roster event mentioned the
    /// peer, so this is the one routing path allowed to create.
    pub async fn on_offer(
        &mut self,
        from: &ParticipantId,
        sdp: String,
    ) -> Result<(), SessionError> {
        if !self.sessions.contains_key(from) {
            self.create_session(from).await?;
        }
        let result = match self.sessions.get_mut(from) {
            Some(session) => session.accept_offer(sdp).await,
            None => Ok(()),
        };
        if let Err(e) = &result {
            self.drop_session(e.peer().clone()).await;
        }
        result
    }

    pub async fn on_answer(
        &mut self,
        from: &ParticipantId,
        sdp: String,
    ) -> Result<(), SessionError> {
        let Some(session) = self.sessions.get_mut(from) else {
            warn!("Dropping answer from unknown peer {from}");
            return Ok(());
        };
        let result = session.accept_answer(sdp).await;
        if let Err(e) = &result {
            self.drop_session(e.peer().clone()).await;
        }
        result
    }

    pub async fn on_ice_candidate(&mut self, from: &ParticipantId, candidate: String) {
        let Some(session) = self.sessions.get_mut(from) else {
            warn!("Dropping candidate from unknown peer {from}");
            return;
        };
        session.add_remote_candidate(candidate).await;
    }

    /// Close the session for a peer whose transport died. Returns whether a
    /// session existed.
    pub async fn close_peer(&mut self, peer_id: &ParticipantId) -> bool {
        match self.sessions.remove(peer_id) {
            Some(mut session) => {
                session.close().await;
                true
            }
            None => false,
        }
    }

    /// Close everything. Called once, on leaving the room.
    pub async fn teardown(&mut self) {
        for (_, mut session) in self.sessions.drain() {
            session.close().await;
        }
    }

    async fn create_session(&mut self, peer_id: &ParticipantId) -> Result<(), SessionError> {
        let transport = self
            .factory
            .create(peer_id.clone(), &self.tracks, self.transport_tx.clone())
            .await
            .map_err(|source| SessionError::Negotiation {
                peer: peer_id.clone(),
                source,
            })?;
        let session = PeerSession::new(peer_id.clone(), transport, Arc::clone(&self.signaling));
        self.sessions.insert(peer_id.clone(), session);
        Ok(())
    }

    async fn drop_session(&mut self, peer_id: ParticipantId) {
        if let Some(mut session) = self.sessions.remove(&peer_id) {
            session.close().await;
        }
    }

}
