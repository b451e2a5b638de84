//! End-to-end matches over real WebSocket connections.

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use quiz_duel::protocol::{ClientMessage, EndReason, ServerMessage};
use quiz_duel::{default_questions, serve, ConnectionId, ServerState};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

async fn start_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let state = Arc::new(Mutex::new(ServerState::new(
        default_questions(),
        Duration::from_secs(30),
    )));
    tokio::spawn(serve(listener, state, Duration::from_millis(50)));
    format!("ws://{}", addr)
}

struct TestClient {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
    id: ConnectionId,
}

impl TestClient {
    async fn connect(url: &str) -> Self {
        let (ws, _) = connect_async(url).await.unwrap();
        let mut client = Self {
            ws,
            id: ConnectionId::new(),
        };
        match client.recv().await {
            ServerMessage::Connected { id } => client.id = id,
            other => panic!("expected Connected, got {:?}", other),
        }
        client
    }

    async fn send(&mut self, msg: ClientMessage) {
        let json = serde_json::to_string(&msg).unwrap();
        self.ws.send(Message::Text(json.into())).await.unwrap();
    }

    async fn recv(&mut self) -> ServerMessage {
        loop {
            let frame = tokio::time::timeout(Duration::from_secs(5), self.ws.next())
                .await
                .expect("timed out waiting for a message")
                .expect("connection closed")
                .unwrap();
            if let Message::Text(text) = frame {
                return serde_json::from_str(&text).unwrap();
            }
        }
    }

    async fn recv_until(&mut self, wanted: impl Fn(&ServerMessage) -> bool) -> ServerMessage {
        loop {
            let msg = self.recv().await;
            if wanted(&msg) {
                return msg;
            }
        }
    }

    async fn register(&mut self, name: &str) {
        self.send(ClientMessage::Register {
            name: name.to_string(),
        })
        .await;
        let ack = self
            .recv_until(|m| matches!(m, ServerMessage::Ack { .. }))
            .await;
        assert_eq!(ack, ServerMessage::ack_ok("register"));
    }
}

/// Alice challenges Bob, Bob accepts; returns the session id.
async fn start_match(alice: &mut TestClient, bob: &mut TestClient) -> String {
    alice
        .send(ClientMessage::Challenge {
            target: bob.id.to_string(),
        })
        .await;
    let ack = alice
        .recv_until(|m| matches!(m, ServerMessage::Ack { .. }))
        .await;
    assert_eq!(ack, ServerMessage::ack_ok("challenge"));

    let request = bob
        .recv_until(|m| matches!(m, ServerMessage::ChallengeRequest { .. }))
        .await;
    assert_eq!(
        request,
        ServerMessage::ChallengeRequest {
            from: alice.id,
            from_name: "Alice".to_string(),
        }
    );

    bob.send(ClientMessage::ChallengeResponse {
        to: alice.id.to_string(),
        accepted: true,
    })
    .await;

    let ServerMessage::QuizStart {
        session_id,
        question,
        opponent,
    } = alice
        .recv_until(|m| matches!(m, ServerMessage::QuizStart { .. }))
        .await
    else {
        unreachable!()
    };
    assert_eq!(opponent.name, "Bob");
    assert_eq!(question.text, "What is the capital of France?");

    let ServerMessage::QuizStart {
        session_id: bob_session_id,
        ..
    } = bob
        .recv_until(|m| matches!(m, ServerMessage::QuizStart { .. }))
        .await
    else {
        unreachable!()
    };
    assert_eq!(session_id, bob_session_id);

    session_id
}

#[tokio::test]
async fn test_full_match() {
    let url = start_server().await;
    let mut alice = TestClient::connect(&url).await;
    let mut bob = TestClient::connect(&url).await;
    alice.register("Alice").await;
    bob.register("Bob").await;

    let session_id = start_match(&mut alice, &mut bob).await;

    alice
        .send(ClientMessage::SubmitAnswer {
            session_id: session_id.clone(),
            answer: 1,
            player_handle: Some(alice.id.to_string()),
        })
        .await;
    let ServerMessage::UpdateScores { scores, .. } = bob
        .recv_until(|m| matches!(m, ServerMessage::UpdateScores { .. }))
        .await
    else {
        unreachable!()
    };
    assert_eq!(scores[&alice.id.to_string()], 2);
    assert_eq!(scores[&bob.id.to_string()], 0);

    bob.send(ClientMessage::SubmitAnswer {
        session_id: session_id.clone(),
        answer: 0,
        player_handle: None,
    })
    .await;

    let (alice_id, bob_id) = (alice.id, bob.id);
    for client in [&mut alice, &mut bob] {
        let end = client
            .recv_until(|m| matches!(m, ServerMessage::QuizEnd { .. }))
            .await;
        let ServerMessage::QuizEnd {
            scores,
            winner,
            reason,
            ..
        } = end
        else {
            unreachable!()
        };
        assert_eq!(reason, EndReason::Completed);
        assert_eq!(scores[&alice_id.to_string()], 3);
        assert_eq!(scores[&bob_id.to_string()], 0);
        assert_eq!(winner, Some(alice_id));
    }
}

#[tokio::test]
async fn test_opponent_leaving_ends_match() {
    let url = start_server().await;
    let mut alice = TestClient::connect(&url).await;
    let mut bob = TestClient::connect(&url).await;
    alice.register("Alice").await;
    bob.register("Bob").await;

    start_match(&mut alice, &mut bob).await;
    let alice_id = alice.id;
    alice.ws.close(None).await.unwrap();

    let end = bob
        .recv_until(|m| matches!(m, ServerMessage::QuizEnd { .. }))
        .await;
    assert!(matches!(
        end,
        ServerMessage::QuizEnd {
            reason: EndReason::OpponentLeft,
            winner: None,
            ..
        }
    ));

    let ServerMessage::PlayerList { players } = bob
        .recv_until(|m| matches!(m, ServerMessage::PlayerList { .. }))
        .await
    else {
        unreachable!()
    };
    assert!(players.iter().all(|p| p.id != alice_id));
}

#[tokio::test]
async fn test_negative_answer_gets_failed_ack() {
    let url = start_server().await;
    let mut client = TestClient::connect(&url).await;
    client.register("Alice").await;

    let frame = r#"{"event":"submitAnswer","payload":{"sessionId":"x","answer":-1}}"#;
    client
        .ws
        .send(Message::Text(frame.to_string().into()))
        .await
        .unwrap();

    let ack = client
        .recv_until(|m| matches!(m, ServerMessage::Ack { .. }))
        .await;
    let ServerMessage::Ack { event, success, .. } = ack else {
        unreachable!()
    };
    assert_eq!(event, "submitAnswer");
    assert!(!success);
}

#[tokio::test]
async fn test_garbage_frame_gets_error() {
    let url = start_server().await;
    let mut client = TestClient::connect(&url).await;

    client
        .ws
        .send(Message::Text("not json".to_string().into()))
        .await
        .unwrap();

    assert!(matches!(client.recv().await, ServerMessage::Error { .. }));
}
