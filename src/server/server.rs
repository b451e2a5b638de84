//! WebSocket server implementation.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Mutex};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;
use tracing::{debug, info, warn};

use crate::config::ServerConfig;
use crate::data::{default_questions, load_questions_from_json};
use crate::models::ConnectionId;
use crate::protocol::{ClientMessage, ServerMessage};
use crate::ServerError;

use super::error::CoordinatorError;
use super::state::ServerState;

/// Shared server state wrapped in Arc<Mutex> for async access.
///
/// Every request runs to completion under the lock, so mutations and the
/// pushes they cause are never interleaved with another request.
pub type SharedState = Arc<Mutex<ServerState>>;

/// Smallest sweep period accepted by the challenge sweeper.
const MIN_SWEEP_INTERVAL: Duration = Duration::from_millis(10);

/// Run the quiz server until Ctrl-C.
pub async fn run(config: ServerConfig) -> Result<(), ServerError> {
    let questions = match &config.questions_path {
        Some(path) => load_questions_from_json(path)?,
        None => default_questions(),
    };
    info!(count = questions.len(), "loaded questions");

    let state = Arc::new(Mutex::new(ServerState::new(
        questions,
        config.challenge_timeout,
    )));

    let listener = TcpListener::bind(config.addr()).await?;
    info!(addr = %listener.local_addr()?, "server listening");

    tokio::select! {
        _ = serve(listener, state, config.sweep_interval) => {}
        signal = tokio::signal::ctrl_c() => {
            signal?;
            info!("shutting down");
        }
    }

    Ok(())
}

/// Accept connections on `listener` forever.
pub async fn serve(listener: TcpListener, state: SharedState, sweep_interval: Duration) {
    tokio::spawn(sweep_challenges(Arc::clone(&state), sweep_interval));

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                tokio::spawn(handle_connection(stream, addr, Arc::clone(&state)));
            }
            Err(e) => {
                warn!(error = %e, "failed to accept connection");
            }
        }
    }
}

/// Periodically expire challenges nobody answered.
async fn sweep_challenges(state: SharedState, period: Duration) {
    let mut ticker = tokio::time::interval(period.max(MIN_SWEEP_INTERVAL));
    loop {
        ticker.tick().await;
        let expired = state.lock().await.expire_challenges(Instant::now());
        if expired > 0 {
            debug!(expired, "challenge sweep");
        }
    }
}

/// Handle a single WebSocket connection.
async fn handle_connection(stream: TcpStream, addr: SocketAddr, state: SharedState) {
    let ws_stream = match tokio_tungstenite::accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!(%addr, error = %e, "WebSocket handshake failed");
            return;
        }
    };

    let id = ConnectionId::new();
    debug!(%id, %addr, "handshake complete");

    // Create channel for sending messages to this client
    let (tx, rx) = mpsc::unbounded_channel::<ServerMessage>();
    let errors = tx.clone();
    state.lock().await.connect(id, tx);

    handle_messages(id, ws_stream, rx, errors, &state).await;

    state.lock().await.disconnect(id);
}

/// Pump messages for a connected client until it goes away.
async fn handle_messages(
    id: ConnectionId,
    ws_stream: WebSocketStream<TcpStream>,
    mut rx: mpsc::UnboundedReceiver<ServerMessage>,
    errors: mpsc::UnboundedSender<ServerMessage>,
    state: &SharedState,
) {
    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    // Forward queued messages from the channel to the socket
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let json = match serde_json::to_string(&msg) {
                Ok(json) => json,
                Err(e) => {
                    warn!(%id, error = %e, "failed to encode message");
                    continue;
                }
            };
            if ws_sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(msg) = ws_receiver.next().await {
        let text = match msg {
            Ok(Message::Text(text)) => text.to_string(),
            Ok(Message::Close(_)) => break,
            Err(e) => {
                debug!(%id, error = %e, "read failed");
                break;
            }
            _ => continue,
        };

        let client_msg: ClientMessage = match serde_json::from_str(&text) {
            Ok(m) => m,
            Err(e) => {
                warn!(%id, error = %e, "unparseable frame");
                let _ = errors.send(parse_failure_reply(&text, &e));
                continue;
            }
        };

        let mut state = state.lock().await;
        handle_client_message(&mut state, id, client_msg);
    }

    send_task.abort();
}

/// Dispatch one client request and acknowledge it.
///
/// `challengeResponse` is only acknowledged when it fails.
pub fn handle_client_message(state: &mut ServerState, id: ConnectionId, msg: ClientMessage) {
    let event = msg.event_name();
    let ack_success = !matches!(msg, ClientMessage::ChallengeResponse { .. });

    let result = match msg {
        ClientMessage::Register { name } => state.register(id, &name),
        ClientMessage::Challenge { target } => state.challenge(id, &target),
        ClientMessage::ChallengeResponse { to, accepted } => state.respond(id, &to, accepted),
        ClientMessage::SubmitAnswer {
            session_id,
            answer,
            player_handle,
        } => check_player_handle(id, player_handle.as_deref())
            .and_then(|()| answer_index(answer))
            .and_then(|answer| state.submit_answer(id, &session_id, answer)),
    };

    match result {
        Ok(()) if ack_success => {
            state.gateway().send(id, ServerMessage::ack_ok(event));
        }
        Ok(()) => {}
        Err(e) => {
            warn!(%id, event, error = %e, "request rejected");
            state
                .gateway()
                .send(id, ServerMessage::ack_err(event, e.to_string()));
        }
    }
}

/// Reply to a frame that did not parse.
///
/// If the event name is still readable the client gets a failed ack for
/// that event, so a request is never left without an answer.
fn parse_failure_reply(text: &str, err: &serde_json::Error) -> ServerMessage {
    let message = format!("could not parse message: {}", err);
    let event = serde_json::from_str::<serde_json::Value>(text)
        .ok()
        .and_then(|frame| frame.get("event")?.as_str().and_then(ClientMessage::known_event));

    match event {
        Some(event) => ServerMessage::ack_err(event, message),
        None => ServerMessage::Error { message },
    }
}

fn answer_index(answer: i64) -> Result<usize, CoordinatorError> {
    usize::try_from(answer)
        .map_err(|_| CoordinatorError::InvalidInput(format!("answer {} is not an option index", answer)))
}

/// A client may echo its own handle; it must not claim someone else's.
fn check_player_handle(id: ConnectionId, claimed: Option<&str>) -> Result<(), CoordinatorError> {
    match claimed {
        Some(handle) if handle.parse::<ConnectionId>().ok() != Some(id) => Err(
            CoordinatorError::InvalidInput("playerHandle does not match this connection".to_string()),
        ),
        _ => Ok(()),
    }
}
