use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::types::ConnectionId;

/// Messages sent from client to server
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Enter the waiting pool, or pair with whoever is waiting
    #[serde(rename = "join")]
    Join,

    /// Leave the current pairing (or stop waiting)
    #[serde(rename = "hangup")]
    Hangup,

    #[serde(rename = "offer")]
    Offer { target: ConnectionId, sdp: Value },

    #[serde(rename = "answer")]
    Answer { target: ConnectionId, sdp: Value },

    #[serde(rename = "ice-candidate")]
    IceCandidate {
        target: ConnectionId,
        candidate: Value,
    },
}

/// Messages sent from server to client
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    /// Sent once after the handshake
    #[serde(rename = "connected")]
    Connected {
        #[serde(rename = "yourId")]
        your_id: ConnectionId,
    },

    #[serde(rename = "partner_found")]
    PartnerFound {
        #[serde(rename = "partnerId")]
        partner_id: ConnectionId,
    },

    #[serde(rename = "offer")]
    Offer { sdp: Value, source: ConnectionId },

    #[serde(rename = "answer")]
    Answer { sdp: Value, source: ConnectionId },

    #[serde(rename = "ice-candidate")]
    IceCandidate {
        candidate: Value,
        source: ConnectionId,
    },

    /// The partner hung up or disconnected; send `join` to look for another
    #[serde(rename = "partner_hangup")]
    PartnerHangup,

    /// Error response
    #[serde(rename = "error")]
    Error { message: String },
}

/// Kind of relayed WebRTC handshake message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    Offer,
    Answer,
    IceCandidate,
}

impl SignalKind {
    /// Build the message the target receives, tagged with the sender.
    pub fn into_server_message(self, payload: Value, source: ConnectionId) -> ServerMessage {
        match self {
            SignalKind::Offer => ServerMessage::Offer {
                sdp: payload,
                source,
            },
            SignalKind::Answer => ServerMessage::Answer {
                sdp: payload,
                source,
            },
            SignalKind::IceCandidate => ServerMessage::IceCandidate {
                candidate: payload,
                source,
            },
        }
    }
}
