use std::time::Duration;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures::{Sink, SinkExt, StreamExt};
use log::{debug, error, info};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use crate::domain::roles::CategorySelector;
use crate::handlers::http::AppState;
use crate::handlers::models::{Ack, AckResult, ClientEvent, ErrorPayload, InboundFrame, ServerEvent};
use crate::state::lobby::ConnectionId;

/// Upper bound for flushing queued frames after the reader ends
const WRITER_DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// WebSocket upgrade for `GET /ws`
pub async fn ws_handler(ws: WebSocketUpgrade, State(app_state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, app_state))
}

/// One connection: a writer task drains the outbound queue, this task reads
async fn handle_socket(socket: WebSocket, app_state: AppState) {
    let (sender, mut receiver) = socket.split();
    let (tx, rx) = mpsc::unbounded_channel::<ServerEvent>();
    let conn = app_state.registry.register(tx);
    info!("Connection {} opened ({} live)", conn, app_state.registry.connection_count());

    let writer = spawn_writer(sender, rx);

    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => handle_text(&app_state, conn, &text).await,
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                debug!("Connection {} read error: {}", conn, e);
                break;
            }
        }
    }

    // dropping the registry's sender lets the writer finish its queue
    app_state.registry.unregister(conn);
    let lobbies_left = app_state.manager.disconnect(conn).await;
    finish_writer(conn, writer).await;
    info!(
        "Connection {} closed (left {} lobbies, {} live)",
        conn,
        lobbies_left,
        app_state.registry.connection_count()
    );
}

/// Encode queued events onto the socket until the queue closes
fn spawn_writer<S>(mut sink: S, mut rx: mpsc::UnboundedReceiver<ServerEvent>) -> JoinHandle<()>
where
    S: Sink<Message> + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let text = match serde_json::to_string(&event) {
                Ok(text) => text,
                Err(e) => {
                    error!("Failed to encode {}: {}", event.name(), e);
                    continue;
                }
            };
            if sink.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    })
}

/// Wait for the writer to flush, aborting it only if the peer stalls
async fn finish_writer(conn: ConnectionId, mut writer: JoinHandle<()>) {
    if tokio::time::timeout(WRITER_DRAIN_TIMEOUT, &mut writer).await.is_err() {
        debug!("Writer for {} did not drain in time", conn);
        writer.abort();
    }
}

async fn handle_text(app_state: &AppState, conn: ConnectionId, text: &str) {
    let frame = match InboundFrame::from_text(text) {
        Ok(frame) => frame,
        Err(e) => {
            debug!("Dropping frame from {}: {}", conn, e);
            send_error(app_state, conn, e.to_string());
            return;
        }
    };

    let ack = frame.ack;
    match frame.into_event() {
        Ok(event) => dispatch(app_state, conn, ack, event).await,
        Err(e) => {
            debug!("Undecodable payload from {}: {}", conn, e);
            // a waiting ack gets the failure, otherwise fall back to an error event
            match ack {
                Some(id) => {
                    app_state.registry.emit_to(conn, ServerEvent::Ack(Ack { id, result: e.into() }));
                }
                None => send_error(app_state, conn, e.to_string()),
            }
        }
    }
}

fn send_error(app_state: &AppState, conn: ConnectionId, message: String) {
    app_state.registry.emit_to(conn, ServerEvent::Error(ErrorPayload { message }));
}

/// Route one client event to the lobby manager
/// Only create and join answer the ack; other failures are logged and dropped
pub async fn dispatch(app_state: &AppState, conn: ConnectionId, ack: Option<u64>, event: ClientEvent) {
    let manager = &app_state.manager;

    match event {
        ClientEvent::CreateLobby(req) => {
            let lobby_code = manager.create_lobby(conn, req.player_name).await;
            reply(app_state, conn, ack, AckResult::LobbyCreated { lobby_code });
        }
        ClientEvent::JoinLobby(req) => {
            let result = match manager.join_lobby(conn, &req.lobby_code, req.player_name).await {
                Ok(()) => AckResult::Joined { success: true },
                Err(e) => {
                    debug!("Join of {} to {} refused: {}", conn, req.lobby_code, e.kind());
                    e.into()
                }
            };
            reply(app_state, conn, ack, result);
        }
        ClientEvent::StartGame(req) => {
            let category = CategorySelector::parse(&req.category);
            if let Err(e) = manager.start_game(conn, &req.lobby_code, req.spy_count, &category).await {
                debug!("startGame on {} by {} ignored: {}", req.lobby_code, conn, e.kind());
            }
        }
        ClientEvent::EndGame(req) => {
            if let Err(e) = manager.end_game(conn, &req.lobby_code).await {
                debug!("endGame on {} by {} ignored: {}", req.lobby_code, conn, e.kind());
            }
        }
        ClientEvent::RestartGame(req) => {
            let category = CategorySelector::parse(&req.category);
            if let Err(e) = manager.restart_game(conn, &req.lobby_code, req.spy_count, &category).await {
                debug!("restartGame on {} by {} ignored: {}", req.lobby_code, conn, e.kind());
            }
        }
    }
}

fn reply(app_state: &AppState, conn: ConnectionId, ack: Option<u64>, result: AckResult) {
    match ack {
        Some(id) => {
            app_state.registry.emit_to(conn, ServerEvent::Ack(Ack { id, result }));
        }
        None => debug!("No ack id from {}, result dropped", conn),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::models::{CreateLobbyRequest, EndGameRequest, GameEnd, JoinLobbyRequest, StartGameRequest};
    use crate::utils::config::Config;
    use crate::utils::worddb::WordDb;
    use std::sync::Arc;

    fn app() -> AppState {
        AppState::new(Arc::new(Config::default()), Arc::new(WordDb::load()))
    }

    fn connect(app_state: &AppState) -> (ConnectionId, mpsc::UnboundedReceiver<ServerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (app_state.registry.register(tx), rx)
    }

    fn last_ack(rx: &mut mpsc::UnboundedReceiver<ServerEvent>) -> Option<Ack> {
        let mut found = None;
        while let Ok(event) = rx.try_recv() {
            if let ServerEvent::Ack(ack) = event {
                found = Some(ack);
            }
        }
        found
    }

    #[tokio::test]
    async fn test_create_answers_ack() {
        let app_state = app();
        let (alice, mut rx) = connect(&app_state);
        let create = ClientEvent::CreateLobby(CreateLobbyRequest { player_name: "Alice".into() });

        dispatch(&app_state, alice, Some(1), create).await;

        let ack = last_ack(&mut rx).unwrap();
        assert_eq!(ack.id, 1);
        assert!(matches!(ack.result, AckResult::LobbyCreated { ref lobby_code } if lobby_code.len() == 5));
    }

    #[tokio::test]
    async fn test_join_unknown_lobby_answers_error() {
        let app_state = app();
        let (bob, mut rx) = connect(&app_state);
        let join = ClientEvent::JoinLobby(JoinLobbyRequest {
            lobby_code: "ZZZZZ".into(),
            player_name: "Bob".into(),
        });

        dispatch(&app_state, bob, Some(7), join).await;

        let ack = last_ack(&mut rx).unwrap();
        assert_eq!(ack.id, 7);
        assert_eq!(
            ack.result,
            AckResult::Failed {
                error: "Lobby nicht gefunden.".into(),
                kind: "LobbyNotFound",
            }
        );
    }

    #[tokio::test]
    async fn test_silent_failures_send_nothing() {
        let app_state = app();
        let (bob, mut rx) = connect(&app_state);

        let start = ClientEvent::StartGame(StartGameRequest {
            lobby_code: "ZZZZZ".into(),
            spy_count: 1,
            category: "Zufall".into(),
        });
        dispatch(&app_state, bob, Some(2), start).await;
        dispatch(&app_state, bob, None, ClientEvent::EndGame(EndGameRequest { lobby_code: "ZZZZZ".into() })).await;

        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_malformed_text_answers_error_event() {
        let app_state = app();
        let (alice, mut rx) = connect(&app_state);

        handle_text(&app_state, alice, "not json").await;

        assert!(matches!(rx.try_recv(), Ok(ServerEvent::Error(_))));
        assert_eq!(app_state.manager.lobby_count(), 0);
    }

    #[tokio::test]
    async fn test_bad_payload_answers_pending_ack() {
        let app_state = app();
        let (bob, mut rx) = connect(&app_state);

        handle_text(&app_state, bob, r#"{"event":"joinLobby","ack":5,"data":{"lobbyCode":"ZZZZZ"}}"#).await;

        let ack = last_ack(&mut rx).unwrap();
        assert_eq!(ack.id, 5);
        assert!(matches!(
            ack.result,
            AckResult::Failed { ref error, kind: "MalformedFrame" } if error.contains("playerName")
        ));
    }

    #[tokio::test]
    async fn test_unknown_event_answers_pending_ack() {
        let app_state = app();
        let (alice, mut rx) = connect(&app_state);

        handle_text(&app_state, alice, r#"{"event":"leaveLobby","ack":8,"data":{}}"#).await;

        let ack = last_ack(&mut rx).unwrap();
        assert_eq!(ack.id, 8);
        assert!(matches!(ack.result, AckResult::Failed { kind: "UnknownEvent", .. }));
    }

    #[tokio::test]
    async fn test_writer_flushes_queue_before_exit() {
        let (sink, mut frames) = futures::channel::mpsc::unbounded::<Message>();
        let (tx, rx) = mpsc::unbounded_channel();
        for _ in 0..3 {
            tx.send(ServerEvent::GameEnd(GameEnd { spy_names: vec!["Bob".into()] })).unwrap();
        }
        drop(tx);

        finish_writer(ConnectionId::new(), spawn_writer(sink, rx)).await;

        let mut delivered = 0;
        while let Ok(Some(Message::Text(text))) = frames.try_next() {
            assert!(text.contains("gameEnd"));
            delivered += 1;
        }
        assert_eq!(delivered, 3);
    }
}
