use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use super::traits::{Connection, Connector, Frame};
use crate::error::StreamError;

/// WebSocket transport backed by `tokio-tungstenite`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WsConnector;

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self, url: &str) -> Result<Box<dyn Connection>, StreamError> {
        let (ws, response) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(|e| StreamError::Connect {
                url: url.to_string(),
                message: e.to_string(),
            })?;
        tracing::debug!(
            target: "planner.stream",
            stage = "ws.handshake",
            url = %url,
            status = %response.status()
        );
        Ok(Box::new(WsConnection { ws, broken: false }))
    }
}

struct WsConnection {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
    /// tungstenite errors are not recoverable; the next read reports the
    /// connection as gone.
    broken: bool,
}

#[async_trait]
impl Connection for WsConnection {
    async fn next_frame(&mut self) -> Option<Result<Frame, StreamError>> {
        if self.broken {
            return None;
        }
        let msg = match self.ws.next().await? {
            Ok(msg) => msg,
            Err(e) => {
                self.broken = true;
                return Some(Err(StreamError::Transport(e.to_string())));
            }
        };
        let frame = match msg {
            Message::Text(text) => Frame::Text(text.to_string()),
            Message::Binary(bytes) => Frame::Binary(bytes.to_vec()),
            Message::Close(_) => Frame::Close,
            Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => Frame::Control,
        };
        Some(Ok(frame))
    }

    async fn send_text(&mut self, text: String) -> Result<(), StreamError> {
        self.ws
            .send(Message::Text(text.into()))
            .await
            .map_err(|e| StreamError::Transport(e.to_string()))
    }

    async fn close(&mut self) -> Result<(), StreamError> {
        self.ws
            .close(None)
            .await
            .map_err(|e| StreamError::Transport(e.to_string()))
    }
}
