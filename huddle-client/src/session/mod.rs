mod peer_session;
mod registry;
mod transport;


pub use peer_session::{NegotiationState, PeerSession};
pub use registry::SessionRegistry;
pub use transport::{
    PeerTransport, RtcTransport, RtcTransportFactory, TransportConfig, TransportEvent,
    TransportFactory,
};
