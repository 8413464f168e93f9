//! WebSocket adapter: runs a [`StreamSession`] over an axum WebSocket.

use crate::protocol::ServerMessage;
use crate::session::{Disconnected, StreamSession, Transport};
use crate::state::AppState;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use protmap_core::QueryError;

/// [`Transport`] over one upgraded WebSocket connection.
pub struct WsTransport {
    socket: WebSocket,
}

impl WsTransport {
    pub fn new(socket: WebSocket) -> Self {
        Self { socket }
    }
}

impl Transport for WsTransport {
    async fn recv(&mut self) -> Option<Result<String, QueryError>> {
        loop {
            match self.socket.recv().await? {
                Ok(Message::Text(text)) => return Some(Ok(text.as_str().to_owned())),
                Ok(Message::Binary(bytes)) => return Some(binary_text(&bytes)),
                Ok(Message::Close(_)) => return None,
                // Ping/pong replies are handled by axum.
                Ok(Message::Ping(_) | Message::Pong(_)) => {}
                Err(e) => {
                    tracing::debug!(error = %e, "websocket receive failed");
                    return None;
                }
            }
        }
    }

    async fn send(&mut self, message: ServerMessage) -> Result<(), Disconnected> {
        let text = match serde_json::to_string(&message) {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(error = %e, "failed to encode server message");
                return Err(Disconnected);
            }
        };
        self.socket
            .send(Message::Text(text.into()))
            .await
            .map_err(|_| Disconnected)
    }
}

/// Binary frames are accepted when they hold UTF-8 text.
fn binary_text(bytes: &[u8]) -> Result<String, QueryError> {
    String::from_utf8(bytes.to_vec()).map_err(|e| {
        QueryError::MalformedMessage(format!("binary frame is not valid UTF-8 ({})", e.utf8_error()))
    })
}

/// `GET /ws`: upgrade and run one session until the client leaves.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| async move {
        let id = state.next_session_id();
        let summary = StreamSession::new(id, WsTransport::new(socket), state.sessions())
            .run()
            .await;
        tracing::info!(
            session = id,
            messages = summary.messages,
            errors = summary.errors,
            "websocket session ended"
        );
    })
}
