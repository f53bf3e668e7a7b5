mod output;
mod ws;

pub use output::{SignalingConnection, SignalingConnector, SignalingOutput};
pub use ws::{SignalingConfig, WsConnector, WsSignalingChannel};
