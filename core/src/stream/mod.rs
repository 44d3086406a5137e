//! Live progress feed of a plan execution.

mod client;
pub mod event;
pub mod reconnect;
mod signal;
mod traits;
mod transport;

pub use client::{ConnectionStatus, ProgressHandle, ProgressStreamClient, StreamConfig};
pub use event::{decode_frame, DecodeError, ProgressEvent, ProgressKind, RawFrame};
pub use reconnect::{
    CloseOutcome, ConnectionMachine, ConnectionState, ConnectionTransition, ReconnectPolicy,
};
pub use signal::{ChannelObserver, StreamSignal};
pub use traits::{Connection, Connector, Frame, ProgressObserver};
pub use transport::WsConnector;
