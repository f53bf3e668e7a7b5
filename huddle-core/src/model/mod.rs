mod chat;
mod envelope;
mod participant;
mod room;

pub use chat::ChatMessage;
pub use envelope::{ClientEnvelope, RosterEntry, ServerEnvelope};
pub use participant::{Participant, ParticipantId, validate_display_name};
pub use room::RoomId;

use thiserror::Error;

/// Validation failures for relay-facing identifiers.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("room id must be 6-8 alphanumeric characters, got {0:?}")]
    InvalidRoomId(String),

    #[error("display name must be 3-20 characters of [A-Za-z0-9_], got {0:?}")]
    InvalidDisplayName(String),
}
