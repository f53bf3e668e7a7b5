//! Peer-connection signaling coordinator for one-to-one video calls.
//!
//! The coordinator negotiates and maintains a direct media transport between
//! two endpoints through an out-of-band signaling relay, and keeps that
//! transport consistent as participants join, leave, and exchange
//! asynchronous network-discovery messages.
//!
//! Everything runs inside a single per-room actor ([`room::RoomCoordinator`]):
//! relay envelopes, local commands, and transport events are processed one at
//! a time in arrival order, so no two negotiation steps for the same peer
//! ever interleave.

pub mod error;
pub mod media;
pub mod room;
pub mod session;
pub mod signaling;

pub use error::{JoinError, MediaError, SessionError, SignalingError, TransportError};
pub use media::{MediaProvider, MediaSource, StaticMediaProvider};
pub use room::{RoomCommand, RoomCoordinator, RoomEvent, RoomHandle, RoomSnapshot, RoomState};
pub use session::{
    NegotiationState, PeerSession, PeerTransport, RtcTransportFactory, SessionRegistry,
    TransportConfig, TransportEvent, TransportFactory,
};
pub use signaling::{
    SignalingConfig, SignalingConnection, SignalingConnector, SignalingOutput, WsConnector,
};
