use std::collections::HashMap;

use tracing::{debug, info};

use super::messages::ServerMessage;
use super::types::ConnectionId;

/// Event the matchmaker wants delivered to one connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchEvent {
    PartnerFound(ConnectionId),
    PartnerHangup,
}

impl MatchEvent {
    pub fn into_server_message(self) -> ServerMessage {
        match self {
            MatchEvent::PartnerFound(partner_id) => ServerMessage::PartnerFound { partner_id },
            MatchEvent::PartnerHangup => ServerMessage::PartnerHangup,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Notification {
    pub to: ConnectionId,
    pub event: MatchEvent,
}

/// Waiting pool and pair table.
///
/// Pairing is last-in-first-out: `join` pairs the caller with the most
/// recently queued connection. When one side of a pair leaves, the other
/// side is told with `partner_hangup` and left unmatched; it is never put
/// back into the pool on its own and has to `join` again.
#[derive(Debug, Default)]
pub struct Matchmaker {
    waiting: Vec<ConnectionId>,
    pairs: HashMap<ConnectionId, ConnectionId>,
}

impl Matchmaker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pair `id` with the newest waiting connection, or queue it.
    ///
    /// A connection that is already waiting or matched is left alone.
    pub fn join(&mut self, id: ConnectionId) -> Vec<Notification> {
        if self.is_waiting(&id) || self.pairs.contains_key(&id) {
            debug!("Ignoring duplicate join from {}", id);
            return Vec::new();
        }

        match self.waiting.pop() {
            Some(partner) => {
                self.pairs.insert(id, partner);
                self.pairs.insert(partner, id);

                info!("Paired {} with {}", id, partner);
                vec![
                    Notification {
                        to: id,
                        event: MatchEvent::PartnerFound(partner),
                    },
                    Notification {
                        to: partner,
                        event: MatchEvent::PartnerFound(id),
                    },
                ]
            }
            None => {
                self.waiting.push(id);
                info!("{} is waiting for a partner", id);
                Vec::new()
            }
        }
    }

    /// Remove `id` from the pair table and the waiting pool.
    ///
    /// Returns the hangup notice for the former partner, if there was one.
    /// Calling it again for the same id does nothing.
    pub fn cleanup(&mut self, id: ConnectionId) -> Option<Notification> {
        let notice = self.pairs.remove(&id).map(|partner| {
            self.pairs.remove(&partner);
            info!("{} left, unpairing {}", id, partner);
            Notification {
                to: partner,
                event: MatchEvent::PartnerHangup,
            }
        });

        // linear scan, fine at this scale
        self.waiting.retain(|waiting| *waiting != id);

        notice
    }

    pub fn partner_of(&self, id: &ConnectionId) -> Option<ConnectionId> {
        self.pairs.get(id).copied()
    }

    pub fn is_waiting(&self, id: &ConnectionId) -> bool {
        self.waiting.contains(id)
    }

    pub fn waiting_len(&self) -> usize {
        self.waiting.len()
    }

    /// Number of active pairs (not table entries).
    pub fn pair_count(&self) -> usize {
        self.pairs.len() / 2
    }
}
