//! WebSocket signaling server: random pairing plus WebRTC handshake relay

mod actor;
mod matchmaker;
mod messages;
mod server;
mod types;

pub use actor::{MatchStats, MatchmakerHandle};
pub use matchmaker::{MatchEvent, Matchmaker, Notification};
pub use messages::{ClientMessage, ServerMessage, SignalKind};
pub use server::{DEFAULT_SIGNALING_PORT, SignalingServer};
pub use types::{ConnectionId, OutboundMessage, OutboundSender, SignalingError};
