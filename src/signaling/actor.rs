use std::collections::HashMap;

use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use super::matchmaker::{Matchmaker, Notification};
use super::messages::{ServerMessage, SignalKind};
use super::types::{ConnectionId, OutboundMessage, OutboundSender, SignalingError};

/// Commands sent to the matchmaker actor
pub(crate) enum MatchCommand {
    Connect {
        tx: OutboundSender,
        reply: oneshot::Sender<Result<ConnectionId, SignalingError>>,
    },
    Join {
        id: ConnectionId,
    },
    Hangup {
        id: ConnectionId,
    },
    Disconnect {
        id: ConnectionId,
    },
    Signal {
        kind: SignalKind,
        source: ConnectionId,
        target: ConnectionId,
        payload: Value,
    },
    Stats {
        reply: oneshot::Sender<MatchStats>,
    },
}

/// Point-in-time counters from the matchmaker actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchStats {
    pub connections: usize,
    pub waiting: usize,
    pub pairs: usize,
}

pub(crate) async fn matchmaker_actor(
    mut rx: mpsc::Receiver<MatchCommand>,
    max_connections: Option<usize>,
) {
    let mut matchmaker = Matchmaker::new();
    let mut connections: HashMap<ConnectionId, OutboundSender> = HashMap::new();

    while let Some(cmd) = rx.recv().await {
        match cmd {
            MatchCommand::Connect { tx, reply } => {
                let result = match max_connections {
                    Some(max) if connections.len() >= max => {
                        warn!("Rejecting connection, {} already open", max);
                        Err(SignalingError::ServerFull(max))
                    }
                    _ => {
                        let mut id = ConnectionId::generate();
                        while connections.contains_key(&id) {
                            id = ConnectionId::generate();
                        }
                        connections.insert(id, tx);
                        info!("Connection {} registered", id);
                        Ok(id)
                    }
                };
                let _ = reply.send(result);
            }

            MatchCommand::Join { id } => {
                if !connections.contains_key(&id) {
                    debug!("Join from unknown connection {}", id);
                    continue;
                }
                for notification in matchmaker.join(id) {
                    deliver(&connections, notification);
                }
            }

            MatchCommand::Hangup { id } => {
                if let Some(notification) = matchmaker.cleanup(id) {
                    deliver(&connections, notification);
                }
            }

            MatchCommand::Disconnect { id } => {
                if let Some(notification) = matchmaker.cleanup(id) {
                    deliver(&connections, notification);
                }
                if connections.remove(&id).is_some() {
                    info!("Connection {} released", id);
                }
            }

            MatchCommand::Signal {
                kind,
                source,
                target,
                payload,
            } => {
                let msg = kind.into_server_message(payload, source);
                if !send_to(&connections, &target, &msg) {
                    debug!("Dropping {:?} from {} to unknown {}", kind, source, target);
                }
            }

            MatchCommand::Stats { reply } => {
                let _ = reply.send(MatchStats {
                    connections: connections.len(),
                    waiting: matchmaker.waiting_len(),
                    pairs: matchmaker.pair_count(),
                });
            }
        }
    }
}

fn deliver(connections: &HashMap<ConnectionId, OutboundSender>, notification: Notification) {
    let msg = notification.event.into_server_message();
    if !send_to(connections, &notification.to, &msg) {
        debug!("Dropping {:?} for gone {}", notification.event, notification.to);
    }
}

/// Returns false when `to` has no live connection.
fn send_to(
    connections: &HashMap<ConnectionId, OutboundSender>,
    to: &ConnectionId,
    msg: &ServerMessage,
) -> bool {
    let Some(tx) = connections.get(to) else {
        return false;
    };
    match serde_json::to_string(msg) {
        Ok(json) => tx.send(OutboundMessage::from(json)).is_ok(),
        Err(e) => {
            error!("Failed to serialize message for {}: {}", to, e);
            false
        }
    }
}

/// Handle to communicate with the matchmaker actor
#[derive(Clone)]
pub struct MatchmakerHandle {
    pub(crate) tx: mpsc::Sender<MatchCommand>,
}

impl MatchmakerHandle {
    /// Spawn the actor on the current runtime and return a handle to it.
    pub fn spawn(max_connections: Option<usize>) -> Self {
        let (tx, rx) = mpsc::channel::<MatchCommand>(1024);
        tokio::spawn(matchmaker_actor(rx, max_connections));
        Self { tx }
    }

    /// Register a new connection and get its id
    pub async fn connect(&self, tx: OutboundSender) -> Result<ConnectionId, SignalingError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        let _ = self
            .tx
            .send(MatchCommand::Connect {
                tx,
                reply: reply_tx,
            })
            .await;
        reply_rx
            .await
            .map_err(|_| SignalingError::Internal("actor channel closed".to_string()))?
    }

    /// Enter the waiting pool or pair up
    pub async fn join(&self, id: ConnectionId) {
        let _ = self.tx.send(MatchCommand::Join { id }).await;
    }

    /// Leave the current pairing or the waiting pool
    pub async fn hangup(&self, id: ConnectionId) {
        let _ = self.tx.send(MatchCommand::Hangup { id }).await;
    }

    /// Same as hangup, then forget the connection
    pub async fn disconnect(&self, id: ConnectionId) {
        let _ = self.tx.send(MatchCommand::Disconnect { id }).await;
    }

    /// Forward a handshake payload to `target`, tagged with `source`
    pub async fn route_signal(
        &self,
        kind: SignalKind,
        source: ConnectionId,
        target: ConnectionId,
        payload: Value,
    ) {
        let _ = self
            .tx
            .send(MatchCommand::Signal {
                kind,
                source,
                target,
                payload,
            })
            .await;
    }

    pub async fn stats(&self) -> Result<MatchStats, SignalingError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        let _ = self.tx.send(MatchCommand::Stats { reply: reply_tx }).await;
        reply_rx
            .await
            .map_err(|_| SignalingError::Internal("actor channel closed".to_string()))
    }
}
