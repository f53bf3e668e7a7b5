use crate::model::{ChatMessage, ParticipantId};
use serde::{Deserialize, Serialize};

/// One roster line inside `RoomJoined`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct RosterEntry {
    pub id: ParticipantId,
    pub name: String,
}

/// Envelopes sent by this endpoint to the relay.
///
/// Peer-addressed variants carry a `target`; the relay rewrites it into the
/// `from` field of the matching [`ServerEnvelope`] before forwarding.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "op", content = "d")]
pub enum ClientEnvelope {
    Join {
        room: String,
        display_name: String,
    },
    LeaveCall,
    Offer {
        target: ParticipantId,
        sdp: String,
    },
    Answer {
        target: ParticipantId,
        sdp: String,
    },
    IceCandidate {
        target: ParticipantId,
        candidate: String,
    },
    Chat {
        room: String,
        body: String,
    },
}

/// Envelopes delivered by the relay to this endpoint.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "op", content = "d")]
pub enum ServerEnvelope {
    RoomJoined {
        room_id: String,
        self_id: ParticipantId,
        self_name: String,
        user_count: u32,
        /// Members already present, excluding this endpoint.
        users: Vec<RosterEntry>,
    },
    UserJoined {
        id: ParticipantId,
        name: String,
    },
    UserLeft {
        id: ParticipantId,
        name: String,
    },
    Offer {
        from: ParticipantId,
        sdp: String,
    },
    Answer {
        from: ParticipantId,
        sdp: String,
    },
    IceCandidate {
        from: ParticipantId,
        candidate: String,
    },
    Chat(ChatMessage),
}
