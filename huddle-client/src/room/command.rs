use crate::room::RoomSnapshot;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

/// Locally-triggered operations, processed by the room actor in arrival
/// order alongside relay envelopes and transport events.
#[derive(Debug)]
pub enum RoomCommand {
    /// Join a room. Valid only while disconnected.
    Join { room: String, display_name: String },

    /// Leave the current room, tearing down every peer session.
    Leave,

    /// Send a chat message through the relay. Whitespace-only bodies are
    /// dropped; the message appears in the log only when the relay delivers
    /// it back.
    SendChat { body: String },

    ToggleAudio,
    ToggleVideo,

    /// View-model query.
    Snapshot {
        reply: oneshot::Sender<RoomSnapshot>,
    },
}

/// The room actor has shut down.
#[derive(Debug, Error)]
#[error("room coordinator is gone")]
pub struct RoomGone;

/// Cloneable front door to the room actor.
#[derive(Clone)]
pub struct RoomHandle {
    cmd_tx: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    pub(crate) fn new(cmd_tx: mpsc::Sender<RoomCommand>) -> Self {
        Self { cmd_tx }
    }

    pub async fn join(
        &self,
        room: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Result<(), RoomGone> {
        self.send(RoomCommand::Join {
            room: room.into(),
            display_name: display_name.into(),
        })
        .await
    }

    pub async fn leave(&self) -> Result<(), RoomGone> {
        self.send(RoomCommand::Leave).await
    }

    pub async fn send_chat(&self, body: impl Into<String>) -> Result<(), RoomGone> {
        self.send(RoomCommand::SendChat { body: body.into() }).await
    }

    pub async fn toggle_audio(&self) -> Result<(), RoomGone> {
        self.send(RoomCommand::ToggleAudio).await
    }

    pub async fn toggle_video(&self) -> Result<(), RoomGone> {
        self.send(RoomCommand::ToggleVideo).await
    }

    /// Current view-model state, as of all messages processed so far.
    pub async fn snapshot(&self) -> Result<RoomSnapshot, RoomGone> {
        let (reply, rx) = oneshot::channel();
        self.send(RoomCommand::Snapshot { reply }).await?;
        rx.await.map_err(|_| RoomGone)
    }

    async fn send(&self, command: RoomCommand) -> Result<(), RoomGone> {
        self.cmd_tx.send(command).await.map_err(|_| RoomGone)
    }
}
