//! Protocol model for the huddle signaling relay: participant and room
//! identity, chat messages, and the signaling envelopes exchanged with the
//! relay service.

pub mod model;

pub use model::{
    ChatMessage, ClientEnvelope, ModelError, Participant, ParticipantId, RoomId, RosterEntry,
    ServerEnvelope, validate_display_name,
};
