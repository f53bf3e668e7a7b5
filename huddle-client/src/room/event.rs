use crate::error::JoinError;
use crate::session::NegotiationState;
use huddle_core::{ChatMessage, Participant, ParticipantId, RoomId};
use std::fmt;
use std::sync::Arc;
use webrtc::track::track_remote::TrackRemote;

/// Room connection lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomState {
    Disconnected,
    Connecting,
    Joined,
    Leaving,
}

/// State-change notifications consumed by the presentation layer.
pub enum RoomEvent {
    StateChanged(RoomState),
    /// The relay acknowledged the join. `roster` holds the members that were
    /// already present, excluding this endpoint.
    Joined {
        self_participant: Participant,
        roster: Vec<Participant>,
    },
    ParticipantJoined(Participant),
    ParticipantLeft(Participant),
    Chat(ChatMessage),
    /// A peer's media arrived and can be rendered.
    RemoteTrack {
        peer_id: ParticipantId,
        track: Arc<TrackRemote>,
    },
    /// Per-peer connection failure. Other peers and the room are unaffected.
    PeerFailed(ParticipantId),
    JoinFailed(JoinError),
    /// The relay connection dropped; the room has been torn down. Whether to
    /// rejoin is the caller's decision.
    ChannelLost,
}

impl fmt::Debug for RoomEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StateChanged(state) => write!(f, "StateChanged({state:?})"),
            Self::Joined { self_participant, roster } => write!(
                f,
                "Joined(self={}, roster={})",
                self_participant.id,
                roster.len()
            ),
            Self::ParticipantJoined(p) => write!(f, "ParticipantJoined({})", p.id),
            Self::ParticipantLeft(p) => write!(f, "ParticipantLeft({})", p.id),
            Self::Chat(msg) => write!(f, "Chat(from={})", msg.sender_id),
            Self::RemoteTrack { peer_id, .. } => write!(f, "RemoteTrack({peer_id})"),
            Self::PeerFailed(id) => write!(f, "PeerFailed({id})"),
            Self::JoinFailed(e) => write!(f, "JoinFailed({e})"),
            Self::ChannelLost => write!(f, "ChannelLost"),
        }
    }
}

/// Point-in-time view-model: everything the presentation layer renders.
#[derive(Debug, Clone)]
pub struct RoomSnapshot {
    pub state: RoomState,
    pub room_id: Option<RoomId>,
    pub self_participant: Option<Participant>,
    /// All present members including self, sorted by id.
    pub roster: Vec<Participant>,
    /// Per-peer negotiation states, sorted by id.
    pub peers: Vec<(ParticipantId, NegotiationState)>,
    pub chat: Vec<ChatMessage>,
    pub audio_enabled: bool,
    pub video_enabled: bool,
}

impl RoomSnapshot {
    pub fn peer_state(&self, id: &ParticipantId) -> Option<NegotiationState> {
        self.peers
            .iter()
            .find(|(peer, _)| peer == id)
            .map(|(_, state)| *state)
    }
}
