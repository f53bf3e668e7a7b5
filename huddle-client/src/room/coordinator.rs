use crate::error::JoinError;
use crate::media::{MediaProvider, MediaSource};
use crate::room::{RoomCommand, RoomEvent, RoomHandle, RoomSnapshot, RoomState};
use crate::session::{SessionRegistry, TransportEvent, TransportFactory};
use crate::signaling::{SignalingConnector, SignalingOutput};
use huddle_core::{
    ChatMessage, ClientEnvelope, Participant, ParticipantId, RoomId, ServerEnvelope,
    validate_display_name,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

const COMMAND_BUFFER: usize = 64;
const TRANSPORT_BUFFER: usize = 256;

/// Top-level orchestrator for one room session.
///
/// Owns the signaling channel, the local media source, and the session
/// registry for exactly one room session's lifetime; there are no
/// process-wide singletons. Runs as a single actor: relay envelopes, local
/// commands, and transport events are interleaved into one queue, so no two
/// negotiation steps for the same peer ever run concurrently.
pub struct RoomCoordinator {
    state: RoomState,
    room_id: Option<RoomId>,
    self_participant: Option<Participant>,
    roster: HashMap<ParticipantId, Participant>,
    chat_log: Vec<ChatMessage>,

    media: Option<MediaSource>,
    registry: Option<SessionRegistry>,
    signaling: Option<Arc<dyn SignalingOutput>>,
    signal_rx: Option<mpsc::Receiver<ServerEnvelope>>,

    connector: Arc<dyn SignalingConnector>,
    media_provider: Arc<dyn MediaProvider>,
    factory: Arc<dyn TransportFactory>,

    command_rx: mpsc::Receiver<RoomCommand>,
    transport_rx: mpsc::Receiver<TransportEvent>,
    transport_tx: mpsc::Sender<TransportEvent>,
    events_tx: mpsc::UnboundedSender<RoomEvent>,
}

impl RoomCoordinator {
    pub fn new(
        connector: Arc<dyn SignalingConnector>,
        media_provider: Arc<dyn MediaProvider>,
        factory: Arc<dyn TransportFactory>,
    ) -> (Self, RoomHandle, mpsc::UnboundedReceiver<RoomEvent>) {
        let (cmd_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (transport_tx, transport_rx) = mpsc::channel(TRANSPORT_BUFFER);
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let coordinator = Self {
            state: RoomState::Disconnected,
            room_id: None,
            self_participant: None,
            roster: HashMap::new(),
            chat_log: Vec::new(),
            media: None,
            registry: None,
            signaling: None,
            signal_rx: None,
            connector,
            media_provider,
            factory,
            command_rx,
            transport_rx,
            transport_tx,
            events_tx,
        };

        (coordinator, RoomHandle::new(cmd_tx), events_rx)
    }

    /// The room event loop. Spawn it; it finishes when every handle is gone.
    pub async fn run(mut self) {
        info!("Room coordinator started");

        loop {
            tokio::select! {
                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(cmd) => self.handle_command(cmd).await,
                        None => {
                            info!("All handles dropped, shutting down");
                            break;
                        }
                    }
                }

                event = self.transport_rx.recv() => {
                    if let Some(event) = event {
                        self.handle_transport_event(event).await;
                    }
                }

                envelope = Self::recv_envelope(&mut self.signal_rx) => {
                    match envelope {
                        Some(envelope) => self.handle_envelope(envelope).await,
                        None => self.handle_channel_lost().await,
                    }
                }
            }
        }

        self.teardown_room().await;
        info!("Room coordinator finished");
    }

    /// Pends forever while no channel is open, so the select arm stays quiet
    /// between room sessions.
    async fn recv_envelope(
        signal_rx: &mut Option<mpsc::Receiver<ServerEnvelope>>,
    ) -> Option<ServerEnvelope> {
        match signal_rx {
            Some(rx) => rx.recv().await,
            None => std::future::pending().await,
        }
    }

    async fn handle_command(&mut self, command: RoomCommand) {
        match command {
            RoomCommand::Join { room, display_name } => self.handle_join(room, display_name).await,
            RoomCommand::Leave => self.handle_leave().await,
            RoomCommand::SendChat { body } => self.handle_send_chat(body).await,
            RoomCommand::ToggleAudio => {
                if let Some(media) = &self.media {
                    let on = media.toggle_audio();
                    debug!("Microphone {}", if on { "unmuted" } else { "muted" });
                }
            }
            RoomCommand::ToggleVideo => {
                if let Some(media) = &self.media {
                    let on = media.toggle_video();
                    debug!("Camera {}", if on { "enabled" } else { "disabled" });
                }
            }
            RoomCommand::Snapshot { reply } => {
                let _ = reply.send(self.snapshot());
            }
        }
    }

    async fn handle_join(&mut self, room: String, display_name: String) {
        if self.state != RoomState::Disconnected {
            self.report_join_failure(JoinError::AlreadyJoined);
            return;
        }
        let room_id = match RoomId::parse(&room) {
            Ok(id) => id,
            Err(e) => {
                self.report_join_failure(e.into());
                return;
            }
        };
        if let Err(e) = validate_display_name(&display_name) {
            self.report_join_failure(e.into());
            return;
        }

        // Permission/device failure is fatal to joining and never retried
        // automatically.
        let media = match self.media_provider.acquire().await {
            Ok(media) => media,
            Err(e) => {
                self.report_join_failure(e.into());
                return;
            }
        };

        let connection = match self.connector.connect().await {
            Ok(connection) => connection,
            Err(e) => {
                media.stop();
                self.report_join_failure(e.into());
                return;
            }
        };

        let join = ClientEnvelope::Join {
            room: room_id.to_string(),
            display_name,
        };
        if let Err(e) = connection.output.send(join).await {
            media.stop();
            self.report_join_failure(e.into());
            return;
        }

        self.registry = Some(SessionRegistry::new(
            Arc::clone(&self.factory),
            Arc::clone(&connection.output),
            media.tracks().to_vec(),
            self.transport_tx.clone(),
        ));
        self.signaling = Some(connection.output);
        self.signal_rx = Some(connection.incoming);
        self.media = Some(media);
        self.room_id = Some(room_id);
        self.set_state(RoomState::Connecting);
    }

    async fn handle_leave(&mut self) {
        if !matches!(self.state, RoomState::Connecting | RoomState::Joined) {
            warn!("Leave ignored in state {:?}", self.state);
            return;
        }
        info!("Leaving room");
        self.set_state(RoomState::Leaving);
        if let Some(signaling) = &self.signaling {
            let _ = signaling.send(ClientEnvelope::LeaveCall).await;
        }
        self.teardown_room().await;
        self.set_state(RoomState::Disconnected);
    }

    async fn handle_send_chat(&mut self, body: String) {
        if self.state != RoomState::Joined {
            warn!("Chat ignored in state {:?}", self.state);
            return;
        }
        let body = body.trim();
        if body.is_empty() {
            return;
        }
        let (Some(signaling), Some(room_id)) = (&self.signaling, &self.room_id) else {
            return;
        };
        // No local echo: the message joins the log only when the relay
        // delivers it back, so every participant sees the same ordering.
        let envelope = ClientEnvelope::Chat {
            room: room_id.to_string(),
            body: body.to_owned(),
        };
        if let Err(e) = signaling.send(envelope).await {
            warn!("Chat send failed: {e}");
        }
    }

    async fn handle_envelope(&mut self, envelope: ServerEnvelope) {
        match envelope {
            ServerEnvelope::RoomJoined {
                room_id,
                self_id,
                self_name,
                user_count,
                users,
            } => {
                if self.state != RoomState::Connecting {
                    warn!("RoomJoined ignored in state {:?}", self.state);
                    return;
                }
                debug!("Relay confirmed {room_id}: {user_count} member(s)");

                let me = Participant::new(self_id, self_name);
                let existing: Vec<Participant> = users
                    .into_iter()
                    .map(|entry| Participant::new(entry.id, entry.name))
                    .collect();
                for participant in &existing {
                    self.roster
                        .insert(participant.id.clone(), participant.clone());
                }
                self.roster.insert(me.id.clone(), me.clone());
                self.self_participant = Some(me.clone());
                self.set_state(RoomState::Joined);
                self.emit(RoomEvent::Joined {
                    self_participant: me.clone(),
                    roster: existing.clone(),
                });

                // The one place this endpoint initiates offers: everyone the
                // roster snapshot says is already here.
                if let Some(registry) = self.registry.as_mut() {
                    for failure in registry.on_room_joined(&me.id, &existing).await {
                        error!("{failure}");
                        self.events_tx
                            .send(RoomEvent::PeerFailed(failure.peer().clone()))
                            .ok();
                    }
                }
            }

            ServerEnvelope::UserJoined { id, name } => {
                if self.state != RoomState::Joined {
                    warn!("UserJoined ignored in state {:?}", self.state);
                    return;
                }
                if self.roster.contains_key(&id) {
                    warn!("Duplicate join for {id}");
                    return;
                }
                info!("{name} ({id}) joined");
                let participant = Participant::new(id, name);
                self.roster
                    .insert(participant.id.clone(), participant.clone());
                // No offer from this side: the newcomer sees us in its
                // roster snapshot and initiates.
                self.emit(RoomEvent::ParticipantJoined(participant));
            }

            ServerEnvelope::UserLeft { id, name } => {
                if self.state != RoomState::Joined {
                    return;
                }
                let Some(participant) = self.roster.remove(&id) else {
                    warn!("UserLeft for unknown participant {id}");
                    return;
                };
                info!("{name} ({id}) left");
                if let Some(registry) = self.registry.as_mut() {
                    registry.on_user_left(&participant.id).await;
                }
                self.emit(RoomEvent::ParticipantLeft(participant));
            }

            ServerEnvelope::Offer { from, sdp } => {
                if self.state != RoomState::Joined {
                    warn!("Offer from {from} ignored in state {:?}", self.state);
                    return;
                }
                if let Some(registry) = self.registry.as_mut() {
                    if let Err(e) = registry.on_offer(&from, sdp).await {
                        error!("{e}");
                        self.emit(RoomEvent::PeerFailed(from));
                    }
                }
            }

            ServerEnvelope::Answer { from, sdp } => {
                if let Some(registry) = self.registry.as_mut() {
                    if let Err(e) = registry.on_answer(&from, sdp).await {
                        error!("{e}");
                        self.emit(RoomEvent::PeerFailed(from));
                    }
                }
            }

            ServerEnvelope::IceCandidate { from, candidate } => {
                if let Some(registry) = self.registry.as_mut() {
                    registry.on_ice_candidate(&from, candidate).await;
                }
            }

            ServerEnvelope::Chat(message) => {
                if self.state != RoomState::Joined {
                    return;
                }
                self.chat_log.push(message.clone());
                self.emit(RoomEvent::Chat(message));
            }
        }
    }

    async fn handle_transport_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::CandidateGenerated(peer_id, candidate) => {
                let Some(signaling) = &self.signaling else {
                    return;
                };
                let envelope = ClientEnvelope::IceCandidate {
                    target: peer_id,
                    candidate,
                };
                if let Err(e) = signaling.send(envelope).await {
                    warn!("Candidate send failed: {e}");
                }
            }

            TransportEvent::RemoteTrack(peer_id, track) => {
                self.emit(RoomEvent::RemoteTrack { peer_id, track });
            }

            TransportEvent::PeerClosed(peer_id) => {
                // Arrives for sessions we closed ourselves too; only a live
                // session turning up dead is worth reporting.
                if let Some(registry) = self.registry.as_mut() {
                    if registry.close_peer(&peer_id).await {
                        warn!("Transport lost for {peer_id}");
                        self.emit(RoomEvent::PeerFailed(peer_id));
                    }
                }
            }
        }
    }

    /// Relay connection dropped out from under us: room-level failure.
    async fn handle_channel_lost(&mut self) {
        if !matches!(self.state, RoomState::Connecting | RoomState::Joined) {
            self.signal_rx = None;
            return;
        }
        error!("Signaling channel lost");
        self.teardown_room().await;
        self.emit(RoomEvent::ChannelLost);
        self.set_state(RoomState::Disconnected);
    }

    async fn teardown_room(&mut self) {
        if let Some(mut registry) = self.registry.take() {
            registry.teardown().await;
        }
        if let Some(media) = self.media.take() {
            media.stop();
        }
        self.signaling = None;
        self.signal_rx = None;
        self.room_id = None;
        self.self_participant = None;
        self.roster.clear();
        self.chat_log.clear();
    }

    fn snapshot(&self) -> RoomSnapshot {
        let mut roster: Vec<Participant> = self.roster.values().cloned().collect();
        roster.sort_by(|a, b| a.id.cmp(&b.id));
        RoomSnapshot {
            state: self.state,
            room_id: self.room_id.clone(),
            self_participant: self.self_participant.clone(),
            roster,
            peers: self
                .registry
                .as_ref()
                .map(SessionRegistry::states)
                .unwrap_or_default(),
            chat: self.chat_log.clone(),
            audio_enabled: self.media.as_ref().is_some_and(MediaSource::audio_enabled),
            video_enabled: self.media.as_ref().is_some_and(MediaSource::video_enabled),
        }
    }

    fn set_state(&mut self, state: RoomState) {
        if self.state == state {
            return;
        }
        debug!("Room state {:?} -> {state:?}", self.state);
        self.state = state;
        self.emit(RoomEvent::StateChanged(state));
    }

    fn report_join_failure(&self, error: JoinError) {
        error!("Join failed: {error}");
        let _ = self.events_tx.send(RoomEvent::JoinFailed(error));
    }

    fn emit(&self, event: RoomEvent) {
        let _ = self.events_tx.send(event);
    }
}
