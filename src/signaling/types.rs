use std::fmt;

use axum::extract::ws::Utf8Bytes;
use rand::Rng;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;
use tokio::sync::mpsc;

/// Signaling server errors
#[derive(Debug, Error)]
pub enum SignalingError {
    #[error("server full: {0} connections")]
    ServerFull(usize),

    #[error("invalid connection id: {0:?}")]
    InvalidConnectionId(String),

    #[error("internal error: {0}")]
    Internal(String),
}

const CONNECTION_ID_PREFIX: &[u8] = b"conn_";
const CONNECTION_ID_LEN: usize = 21;
const HEX_CHARS: &[u8] = b"0123456789abcdef";

/// Connection ID: 21-byte fixed array ("conn_" + 16 lowercase hex)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId {
    bytes: [u8; CONNECTION_ID_LEN],
}

impl ConnectionId {
    pub fn generate() -> Self {
        let value: u64 = rand::rng().random();
        Self::from_u64(value)
    }

    pub fn from_u64(value: u64) -> Self {
        let mut bytes = [0u8; CONNECTION_ID_LEN];
        let prefix_len = CONNECTION_ID_PREFIX.len();
        bytes[..prefix_len].copy_from_slice(CONNECTION_ID_PREFIX);

        for i in 0..16 {
            let nibble = ((value >> (60 - i * 4)) & 0xF) as usize;
            bytes[prefix_len + i] = HEX_CHARS[nibble];
        }
        Self { bytes }
    }

    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.bytes).unwrap_or("")
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Only the exact form produced by `generate` is accepted, so a malformed
/// address can never alias a live connection.
impl TryFrom<&str> for ConnectionId {
    type Error = SignalingError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        let src = s.as_bytes();
        let well_formed = src.len() == CONNECTION_ID_LEN
            && src.starts_with(CONNECTION_ID_PREFIX)
            && src[CONNECTION_ID_PREFIX.len()..]
                .iter()
                .all(|b| HEX_CHARS.contains(b));
        if !well_formed {
            return Err(SignalingError::InvalidConnectionId(s.to_string()));
        }

        let mut bytes = [0u8; CONNECTION_ID_LEN];
        bytes.copy_from_slice(src);
        Ok(Self { bytes })
    }
}

impl Serialize for ConnectionId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ConnectionId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        ConnectionId::try_from(s.as_str()).map_err(D::Error::custom)
    }
}

/// Wrapper for outbound WebSocket text frames.
#[derive(Debug, Clone)]
pub struct OutboundMessage(Utf8Bytes);

impl OutboundMessage {
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Get the inner Utf8Bytes for Message::Text
    pub fn into_inner(self) -> Utf8Bytes {
        self.0
    }
}

impl From<String> for OutboundMessage {
    fn from(s: String) -> Self {
        Self(Utf8Bytes::from(s))
    }
}

pub type OutboundSender = mpsc::UnboundedSender<OutboundMessage>;
