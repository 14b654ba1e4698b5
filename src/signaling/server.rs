use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{ConnectInfo, State, WebSocketUpgrade};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::actor::MatchmakerHandle;
use super::messages::{ClientMessage, ServerMessage, SignalKind};
use super::types::{ConnectionId, OutboundMessage, OutboundSender};
use crate::config::Config;

pub const DEFAULT_SIGNALING_PORT: u16 = 3000;
const HEALTH_BODY: &str = "Signaling server is running";

/// Per-connection settings shared by every connection task
#[derive(Debug)]
struct ConnectionSettings {
    allowed_origin: Option<String>,
    ping_interval: Duration,
    pong_timeout: Duration,
}

#[derive(Clone)]
struct AppState {
    handle: MatchmakerHandle,
    settings: Arc<ConnectionSettings>,
}

pub struct SignalingServer {
    listener: TcpListener,
    state: AppState,
}

impl SignalingServer {
    /// Bind the listener and start the matchmaker actor.
    pub async fn bind(config: &Config) -> std::io::Result<Self> {
        config
            .validate()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;

        let listener = TcpListener::bind(config.bind_addr()).await?;
        info!("Signaling server listening on {}", listener.local_addr()?);
        if let Some(origin) = &config.allowed_origin {
            info!("Accepting WebSocket handshakes from {}", origin);
        }

        Ok(Self {
            listener,
            state: AppState {
                handle: MatchmakerHandle::spawn(config.max_connections),
                settings: Arc::new(ConnectionSettings {
                    allowed_origin: config.allowed_origin.clone(),
                    ping_interval: config.ping_interval,
                    pong_timeout: config.pong_timeout,
                }),
            },
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn handle(&self) -> MatchmakerHandle {
        self.state.handle.clone()
    }

    pub async fn run(self) -> std::io::Result<()> {
        let app = build_router(self.state);
        axum::serve(
            self.listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
    }
}

/// `/` and `/healthz` answer liveness checks, `/ws` carries signaling.
fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/healthz", get(health))
        .route("/ws", get(ws_handler))
        .with_state(state)
}

async fn health() -> &'static str {
    HEALTH_BODY
}

fn origin_allowed(allowed: Option<&str>, origin: Option<&str>) -> bool {
    match allowed {
        None => true,
        Some(allowed) => origin.is_some_and(|o| o.trim_end_matches('/') == allowed),
    }
}

/// WebSocket upgrade handler.
async fn ws_handler(
    ws: WebSocketUpgrade,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Response {
    let origin = headers.get(header::ORIGIN).and_then(|v| v.to_str().ok());
    if !origin_allowed(state.settings.allowed_origin.as_deref(), origin) {
        warn!("Rejected handshake from {} with origin {:?}", addr, origin);
        return (StatusCode::FORBIDDEN, "origin not allowed").into_response();
    }

    ws.on_upgrade(move |socket| async move {
        if let Err(e) = handle_connection(socket, addr, state).await {
            error!("Connection error from {}: {}", addr, e);
        }
    })
}

async fn handle_connection(
    socket: WebSocket,
    addr: SocketAddr,
    state: AppState,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let AppState { handle, settings } = state;
    let (mut ws_tx, mut ws_rx) = socket.split();

    info!("WebSocket connection from {}", addr);

    let (tx, mut rx) = mpsc::unbounded_channel::<OutboundMessage>();
    let (ctrl_tx, mut ctrl_rx) = mpsc::unbounded_channel::<Message>();

    let conn_id = match handle.connect(tx.clone()).await {
        Ok(id) => id,
        Err(e) => {
            let err = ServerMessage::Error {
                message: e.to_string(),
            };
            ws_tx
                .send(Message::Text(serde_json::to_string(&err)?.into()))
                .await?;
            ws_tx.close().await?;
            return Ok(());
        }
    };

    let hello = ServerMessage::Connected { your_id: conn_id };
    let _ = tx.send(OutboundMessage::from(serde_json::to_string(&hello)?));

    let mut ping_interval = tokio::time::interval(settings.ping_interval);
    let mut waiting_for_pong = false;
    let mut pong_deadline: Option<tokio::time::Instant> = None;

    let send_task = tokio::spawn(async move {
        loop {
            tokio::select! {
                Some(msg) = rx.recv() => {
                    let ws_msg = Message::Text(msg.into_inner());
                    if ws_tx.send(ws_msg).await.is_err() {
                        break;
                    }
                }
                Some(ctrl_msg) = ctrl_rx.recv() => {
                    if ws_tx.send(ctrl_msg).await.is_err() {
                        break;
                    }
                }
                else => break,
            }
        }
    });

    loop {
        let pong_timeout = async {
            match pong_deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            _ = ping_interval.tick() => {
                if waiting_for_pong {
                    warn!("No Pong received, disconnecting {}", conn_id);
                    break;
                }
                if ctrl_tx.send(Message::Ping(Bytes::new())).is_err() {
                    break;
                }
                waiting_for_pong = true;
                pong_deadline = Some(tokio::time::Instant::now() + settings.pong_timeout);
                debug!("Ping sent to {}", conn_id);
            }

            _ = pong_timeout => {
                warn!("Pong timeout, disconnecting {}", conn_id);
                break;
            }

            msg = ws_rx.next() => {
                let msg = match msg {
                    Some(Ok(m)) => m,
                    Some(Err(e)) => {
                        warn!("WebSocket error: {}", e);
                        break;
                    }
                    None => break,
                };

                match msg {
                    Message::Text(text) => {
                        if let Err(e) = handle_text_message(text.as_str(), &tx, &handle, conn_id).await {
                            warn!("Message handling error: {}", e);
                        }
                    }
                    Message::Pong(_) => {
                        waiting_for_pong = false;
                        pong_deadline = None;
                        debug!("Pong received from {}", conn_id);
                    }
                    Message::Close(_) => {
                        info!("Close received from {}", conn_id);
                        break;
                    }
                    _ => {}
                }
            }
        }
    }

    handle.disconnect(conn_id).await;

    send_task.abort();
    info!("WebSocket disconnected: {} ({})", conn_id, addr);

    Ok(())
}

async fn handle_text_message(
    text: &str,
    tx: &OutboundSender,
    handle: &MatchmakerHandle,
    conn_id: ConnectionId,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let client_msg: ClientMessage = match serde_json::from_str(text) {
        Ok(m) => m,
        Err(e) => {
            let err = ServerMessage::Error {
                message: format!("Invalid message: {}", e),
            };
            let _ = tx.send(OutboundMessage::from(serde_json::to_string(&err)?));
            return Ok(());
        }
    };

    match client_msg {
        ClientMessage::Join => handle.join(conn_id).await,
        ClientMessage::Hangup => handle.hangup(conn_id).await,
        ClientMessage::Offer { target, sdp } => {
            handle
                .route_signal(SignalKind::Offer, conn_id, target, sdp)
                .await
        }
        ClientMessage::Answer { target, sdp } => {
            handle
                .route_signal(SignalKind::Answer, conn_id, target, sdp)
                .await
        }
        ClientMessage::IceCandidate { target, candidate } => {
            handle
                .route_signal(SignalKind::IceCandidate, conn_id, target, candidate)
                .await
        }
    }

    Ok(())
}
