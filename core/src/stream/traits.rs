use async_trait::async_trait;

use super::event::ProgressEvent;
use crate::error::StreamError;

/// Callbacks of one progress stream. Only `on_message` is mandatory.
///
/// Calls for one connection arrive in frame order, from the stream task.
pub trait ProgressObserver: Send + Sync {
    fn on_message(&self, event: ProgressEvent);

    fn on_open(&self) {}

    fn on_close(&self) {}

    fn on_error(&self, _error: &StreamError) {}

    /// Reconnect budget is spent; nothing else will be delivered.
    fn on_gave_up(&self, _attempts: u32) {}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    Binary(Vec<u8>),
    /// Ping, pong and other control traffic.
    Control,
    Close,
}

#[async_trait]
pub trait Connection: Send {
    /// `None` once the peer is gone.
    async fn next_frame(&mut self) -> Option<Result<Frame, StreamError>>;

    async fn send_text(&mut self, text: String) -> Result<(), StreamError>;

    async fn close(&mut self) -> Result<(), StreamError>;
}

#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, url: &str) -> Result<Box<dyn Connection>, StreamError>;
}
