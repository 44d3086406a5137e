use tokio::sync::mpsc;

use super::event::ProgressEvent;
use super::traits::ProgressObserver;
use crate::error::StreamError;

/// Observer callbacks flattened into one ordered message type.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamSignal {
    Open,
    Event(ProgressEvent),
    Error(String),
    Closed,
    GaveUp { attempts: u32 },
}

/// Forwards every callback into an unbounded channel, preserving order.
/// Lets async code consume the stream with `recv().await` instead of
/// callbacks.
pub struct ChannelObserver {
    tx: mpsc::UnboundedSender<StreamSignal>,
}

impl ChannelObserver {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<StreamSignal>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn forward(&self, signal: StreamSignal) {
        // receiver gone means nobody is watching anymore
        let _ = self.tx.send(signal);
    }
}

impl ProgressObserver for ChannelObserver {
    fn on_message(&self, event: ProgressEvent) {
        self.forward(StreamSignal::Event(event));
    }

    fn on_open(&self) {
        self.forward(StreamSignal::Open);
    }

    fn on_close(&self) {
        self.forward(StreamSignal::Closed);
    }

    fn on_error(&self, error: &StreamError) {
        self.forward(StreamSignal::Error(error.to_string()));
    }

    fn on_gave_up(&self, attempts: u32) {
        self.forward(StreamSignal::GaveUp { attempts });
    }
}
