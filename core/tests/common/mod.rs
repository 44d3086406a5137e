#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use planner_core::config::BackoffStrategy;
use planner_core::error::StreamError;
use planner_core::stream::{
    Connection, Connector, Frame, ReconnectPolicy, StreamConfig, StreamSignal,
};
use tokio::sync::mpsc;

/// Feeds frames into an accepted scripted connection. Dropping it makes the
/// peer go away.
pub type FrameTx = mpsc::UnboundedSender<Frame>;

pub enum Attempt {
    Refuse,
    Accept(mpsc::UnboundedReceiver<Frame>),
}

pub fn accept() -> (Attempt, FrameTx) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Attempt::Accept(rx), tx)
}

/// In-memory connector playing back a fixed list of connection attempts.
/// Attempts beyond the script are refused.
#[derive(Default)]
pub struct ScriptedConnector {
    attempts: Mutex<VecDeque<Attempt>>,
    pub connects: AtomicUsize,
    pub opened: Arc<AtomicBool>,
    pub sent: Arc<Mutex<Vec<String>>>,
}

impl ScriptedConnector {
    pub fn new(attempts: Vec<Attempt>) -> Arc<Self> {
        Arc::new(Self {
            attempts: Mutex::new(attempts.into()),
            ..Default::default()
        })
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connector for ScriptedConnector {
    async fn connect(&self, url: &str) -> Result<Box<dyn Connection>, StreamError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        let next = self.attempts.lock().unwrap().pop_front();
        match next {
            Some(Attempt::Accept(frames)) => {
                self.opened.store(true, Ordering::SeqCst);
                Ok(Box::new(ScriptedConnection {
                    frames,
                    sent: self.sent.clone(),
                }))
            }
            Some(Attempt::Refuse) | None => Err(StreamError::Connect {
                url: url.to_string(),
                message: "connection refused".to_string(),
            }),
        }
    }
}

struct ScriptedConnection {
    frames: mpsc::UnboundedReceiver<Frame>,
    sent: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl Connection for ScriptedConnection {
    async fn next_frame(&mut self) -> Option<Result<Frame, StreamError>> {
        self.frames.recv().await.map(Ok)
    }

    async fn send_text(&mut self, text: String) -> Result<(), StreamError> {
        self.sent.lock().unwrap().push(text);
        Ok(())
    }

    async fn close(&mut self) -> Result<(), StreamError> {
        self.frames.close();
        Ok(())
    }
}

pub fn fast_policy(max_attempts: u32) -> ReconnectPolicy {
    ReconnectPolicy {
        max_attempts,
        base_delay: Duration::from_millis(5),
        max_delay: Duration::from_millis(50),
        strategy: BackoffStrategy::Fixed,
    }
}

pub fn stream_config(max_attempts: u32) -> StreamConfig {
    StreamConfig {
        url: "ws://scripted/api/v1/agent/ws/progress".to_string(),
        policy: fast_policy(max_attempts),
    }
}

pub fn text(s: &str) -> Frame {
    Frame::Text(s.to_string())
}

pub async fn next_signal(rx: &mut mpsc::UnboundedReceiver<StreamSignal>) -> StreamSignal {
    tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("timed out waiting for a stream signal")
        .expect("signal channel closed")
}
