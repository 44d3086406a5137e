use std::future::Future;
use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use super::event::{decode_binary, decode_frame, DecodeError, ProgressEvent};
use super::reconnect::{
    CloseOutcome, ConnectionMachine, ConnectionState, InvalidTransition, ReconnectPolicy,
};
use super::traits::{Connection, Connector, Frame, ProgressObserver};
use super::transport::WsConnector;
use crate::config::AppConfig;
use crate::error::StreamError;

const FRAME_PREVIEW_LIMIT: usize = 200;

#[derive(Debug, Clone)]
pub struct StreamConfig {
    pub url: String,
    pub policy: ReconnectPolicy,
}

impl StreamConfig {
    pub fn from_app(cfg: &AppConfig) -> Self {
        Self {
            url: cfg.backend.ws_url.clone(),
            policy: ReconnectPolicy::from(&cfg.reconnect),
        }
    }
}

/// Snapshot published by the stream task after every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionStatus {
    pub state: ConnectionState,
    pub attempts: u32,
    /// Successful opens since the client started.
    pub opens: u64,
}

enum Command {
    Send(String),
    Close,
}

/// Opens progress streams. Every `connect` call gets its own task, socket
/// and reconnect budget.
#[derive(Clone)]
pub struct ProgressStreamClient {
    config: StreamConfig,
    connector: Arc<dyn Connector>,
}

impl ProgressStreamClient {
    pub fn new(config: StreamConfig) -> Self {
        Self::with_connector(config, Arc::new(WsConnector))
    }

    pub fn with_connector(config: StreamConfig, connector: Arc<dyn Connector>) -> Self {
        Self { config, connector }
    }

    /// Spawns the stream task. Must be called inside a tokio runtime.
    pub fn connect(&self, observer: Arc<dyn ProgressObserver>) -> ProgressHandle {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let initial = ConnectionStatus {
            state: ConnectionState::Connecting,
            attempts: 0,
            opens: 0,
        };
        let (status_tx, status_rx) = watch::channel(initial);

        let task = StreamTask {
            url: self.config.url.clone(),
            connector: self.connector.clone(),
            observer,
            machine: ConnectionMachine::new(self.config.policy),
            commands: cmd_rx,
            status: status_tx,
            opens: 0,
        };
        let join = tokio::spawn(async move {
            if let Err(e) = task.run().await {
                tracing::error!(target: "planner.stream", stage = "task", error = %e);
            }
        });

        ProgressHandle {
            commands: cmd_tx,
            status: status_rx,
            join,
        }
    }
}

/// Control side of a running stream. Dropping the handle closes the stream.
pub struct ProgressHandle {
    commands: mpsc::UnboundedSender<Command>,
    status: watch::Receiver<ConnectionStatus>,
    join: JoinHandle<()>,
}

impl ProgressHandle {
    pub fn status(&self) -> ConnectionStatus {
        *self.status.borrow()
    }

    pub fn state(&self) -> ConnectionState {
        self.status().state
    }

    pub fn attempts(&self) -> u32 {
        self.status().attempts
    }

    /// Sends `{"message": text}` if the channel is open right now. Anything
    /// sent while not open is dropped, never queued.
    pub fn send(&self, text: impl Into<String>) -> bool {
        if self.state() != ConnectionState::Open {
            tracing::warn!(
                target: "planner.stream",
                stage = "send",
                state = ?self.state(),
                "stream not open, message dropped"
            );
            return false;
        }
        self.commands.send(Command::Send(text.into())).is_ok()
    }

    /// Stops the stream without reconnecting.
    pub fn close(&self) {
        let _ = self.commands.send(Command::Close);
    }

    /// Resolves once the stream has opened at least once. Fails if the
    /// reconnect budget runs out or the stream is closed first.
    pub async fn wait_open(&self) -> Result<(), StreamError> {
        let mut rx = self.status.clone();
        loop {
            let status = *rx.borrow_and_update();
            if status.opens > 0 {
                return Ok(());
            }
            if status.state == ConnectionState::Failed {
                return Err(StreamError::GaveUp {
                    attempts: status.attempts,
                });
            }
            if rx.changed().await.is_err() {
                let status = *rx.borrow();
                return match status.state {
                    _ if status.opens > 0 => Ok(()),
                    ConnectionState::Failed => Err(StreamError::GaveUp {
                        attempts: status.attempts,
                    }),
                    _ => Err(StreamError::ClosedBeforeOpen),
                };
            }
        }
    }

    /// Waits for the stream task to finish.
    pub async fn join(self) -> Result<(), StreamError> {
        let ProgressHandle { join, .. } = self;
        join.await.map_err(|_| StreamError::TaskGone)
    }
}

struct StreamTask {
    url: String,
    connector: Arc<dyn Connector>,
    observer: Arc<dyn ProgressObserver>,
    machine: ConnectionMachine,
    commands: mpsc::UnboundedReceiver<Command>,
    status: watch::Sender<ConnectionStatus>,
    opens: u64,
}

impl StreamTask {
    fn publish(&self) {
        self.status.send_replace(ConnectionStatus {
            state: self.machine.state(),
            attempts: self.machine.attempts(),
            opens: self.opens,
        });
    }

    fn shutdown(&mut self) {
        self.machine.on_shutdown();
        self.publish();
        tracing::debug!(target: "planner.stream", stage = "shutdown", url = %self.url);
    }

    async fn run(mut self) -> Result<(), InvalidTransition> {
        loop {
            tracing::debug!(
                target: "planner.stream",
                stage = "connect",
                url = %self.url,
                attempt = self.machine.attempts()
            );
            let connector = self.connector.clone();
            let url = self.url.clone();
            let connected = match until_shutdown(&mut self.commands, connector.connect(&url)).await
            {
                Some(res) => res,
                None => {
                    self.shutdown();
                    return Ok(());
                }
            };

            match connected {
                Ok(mut conn) => {
                    self.machine.on_open()?;
                    self.opens += 1;
                    self.publish();
                    tracing::info!(target: "planner.stream", stage = "open", url = %self.url);
                    self.observer.on_open();

                    if self.pump(conn.as_mut()).await {
                        if let Err(e) = conn.close().await {
                            tracing::debug!(target: "planner.stream", stage = "close", error = %e);
                        }
                        self.shutdown();
                        self.observer.on_close();
                        return Ok(());
                    }
                }
                Err(e) => {
                    tracing::warn!(target: "planner.stream", stage = "connect", error = %e);
                    self.observer.on_error(&e);
                }
            }

            self.observer.on_close();
            match self.machine.on_closed()? {
                CloseOutcome::Reconnect { attempt, delay } => {
                    self.publish();
                    tracing::info!(
                        target: "planner.stream",
                        stage = "reconnect.scheduled",
                        attempt = attempt,
                        max_attempts = self.machine.policy().max_attempts,
                        delay_ms = delay.as_millis() as u64
                    );
                    if until_shutdown(&mut self.commands, tokio::time::sleep(delay))
                        .await
                        .is_none()
                    {
                        self.shutdown();
                        return Ok(());
                    }
                    self.machine.on_reconnect()?;
                    self.publish();
                }
                CloseOutcome::GiveUp { attempts } => {
                    self.publish();
                    tracing::warn!(
                        target: "planner.stream",
                        stage = "reconnect.exhausted",
                        attempts = attempts
                    );
                    self.observer.on_gave_up(attempts);
                    return Ok(());
                }
            }
        }
    }

    /// Forwards frames until the peer goes away (`false`) or the caller
    /// closes the stream (`true`).
    async fn pump(&mut self, conn: &mut dyn Connection) -> bool {
        loop {
            tokio::select! {
                biased;
                cmd = self.commands.recv() => match cmd {
                    Some(Command::Send(text)) => {
                        let payload = serde_json::json!({ "message": text }).to_string();
                        if let Err(e) = conn.send_text(payload).await {
                            tracing::warn!(target: "planner.stream", stage = "send", error = %e);
                            self.observer.on_error(&e);
                        }
                    }
                    Some(Command::Close) | None => return true,
                },
                frame = conn.next_frame() => match frame {
                    None | Some(Ok(Frame::Close)) => {
                        tracing::info!(target: "planner.stream", stage = "closed", url = %self.url);
                        return false;
                    }
                    Some(Ok(Frame::Text(text))) => self.dispatch(decode_frame(&text), &text),
                    Some(Ok(Frame::Binary(bytes))) => {
                        let preview = String::from_utf8_lossy(&bytes).into_owned();
                        self.dispatch(decode_binary(&bytes), &preview)
                    }
                    Some(Ok(Frame::Control)) => {}
                    Some(Err(e)) => {
                        tracing::warn!(target: "planner.stream", stage = "transport", error = %e);
                        self.observer.on_error(&e);
                    }
                },
            }
        }
    }

    fn dispatch(&self, decoded: Result<ProgressEvent, DecodeError>, raw: &str) {
        match decoded {
            Ok(event) => {
                tracing::debug!(
                    target: "planner.stream",
                    stage = "frame",
                    kind = event.kind.as_str(),
                    step = ?event.step
                );
                self.observer.on_message(event);
            }
            Err(e) => {
                let preview: String = raw.chars().take(FRAME_PREVIEW_LIMIT).collect();
                tracing::warn!(
                    target: "planner.stream",
                    stage = "frame.decode",
                    error = %e,
                    frame = %preview,
                    "dropping undecodable frame"
                );
            }
        }
    }
}

/// Drives `fut` while honouring commands. Returns `None` if the stream was
/// closed (or every handle dropped) first. Sends issued meanwhile are
/// dropped because nothing is open.
async fn until_shutdown<F: Future>(
    commands: &mut mpsc::UnboundedReceiver<Command>,
    fut: F,
) -> Option<F::Output> {
    tokio::pin!(fut);
    loop {
        tokio::select! {
            biased;
            cmd = commands.recv() => match cmd {
                Some(Command::Send(_)) => {
                    tracing::warn!(target: "planner.stream", stage = "send", "stream not open, message dropped");
                }
                Some(Command::Close) | None => return None,
            },
            out = &mut fut => return Some(out),
        }
    }
}
