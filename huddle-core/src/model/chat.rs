use crate::model::ParticipantId;
use serde::{Deserialize, Serialize};

/// A chat message as delivered by the relay.
///
/// The relay stamps the timestamp; log ordering is relay arrival order, so
/// every participant sees the same log.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub sender_id: ParticipantId,
    pub sender_name: String,
    pub body: String,
    pub timestamp_ms: u64,
}
