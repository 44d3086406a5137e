//! Connection lifecycle and reconnect budget, kept free of any I/O.

use std::time::Duration;

use crate::config::{BackoffStrategy, ReconnectConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    /// Closed and not coming back on its own: either waiting for a scheduled
    /// reconnect or shut down by the caller.
    Closed,
    /// Reconnect budget exhausted.
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub strategy: BackoffStrategy,
}

impl ReconnectPolicy {
    /// Delay before reconnect attempt `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        match self.strategy {
            BackoffStrategy::Fixed => self.base_delay,
            BackoffStrategy::Exponential => {
                let shift = attempt.saturating_sub(1).min(31);
                self.base_delay
                    .saturating_mul(1u32 << shift)
                    .min(self.max_delay.max(self.base_delay))
            }
        }
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        ReconnectPolicy::from(&ReconnectConfig::default())
    }
}

impl From<&ReconnectConfig> for ReconnectPolicy {
    fn from(cfg: &ReconnectConfig) -> Self {
        Self {
            max_attempts: cfg.max_attempts,
            base_delay: Duration::from_millis(cfg.base_delay_ms),
            max_delay: Duration::from_millis(cfg.max_delay_ms),
            strategy: cfg.strategy,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseOutcome {
    Reconnect { attempt: u32, delay: Duration },
    GiveUp { attempts: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid connection transition from {from:?} to {to:?}")]
pub struct InvalidTransition {
    pub from: ConnectionState,
    pub to: ConnectionState,
}

pub struct ConnectionTransition;

impl ConnectionTransition {
    pub fn validate(from: ConnectionState, to: ConnectionState) -> Result<(), InvalidTransition> {
        use ConnectionState::*;

        let is_valid = match (from, to) {
            (Failed, _) => false,
            (Connecting, Open) | (Connecting, Closed) => true,
            (Open, Closed) => true,
            // a scheduled reconnect fires
            (Closed, Connecting) => true,
            (Closed, Failed) => true,
            _ => false,
        };

        if is_valid {
            Ok(())
        } else {
            Err(InvalidTransition { from, to })
        }
    }

    pub fn is_terminal(state: ConnectionState) -> bool {
        matches!(state, ConnectionState::Failed)
    }
}

/// State of one stream client: current connection state plus the number of
/// reconnects tried since the last successful open.
#[derive(Debug, Clone)]
pub struct ConnectionMachine {
    state: ConnectionState,
    attempts: u32,
    policy: ReconnectPolicy,
}

impl ConnectionMachine {
    pub fn new(policy: ReconnectPolicy) -> Self {
        Self {
            state: ConnectionState::Connecting,
            attempts: 0,
            policy,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn policy(&self) -> &ReconnectPolicy {
        &self.policy
    }

    fn transition(&mut self, to: ConnectionState) -> Result<(), InvalidTransition> {
        ConnectionTransition::validate(self.state, to)?;
        self.state = to;
        Ok(())
    }

    /// Channel established; the budget is refilled.
    pub fn on_open(&mut self) -> Result<(), InvalidTransition> {
        self.transition(ConnectionState::Open)?;
        self.attempts = 0;
        Ok(())
    }

    /// The channel closed (or never opened). Decides between one more
    /// attempt and giving up.
    pub fn on_closed(&mut self) -> Result<CloseOutcome, InvalidTransition> {
        self.transition(ConnectionState::Closed)?;

        if self.attempts < self.policy.max_attempts {
            self.attempts += 1;
            Ok(CloseOutcome::Reconnect {
                attempt: self.attempts,
                delay: self.policy.delay_for(self.attempts),
            })
        } else {
            self.transition(ConnectionState::Failed)?;
            Ok(CloseOutcome::GiveUp {
                attempts: self.attempts,
            })
        }
    }

    /// A scheduled reconnect timer fired.
    pub fn on_reconnect(&mut self) -> Result<(), InvalidTransition> {
        self.transition(ConnectionState::Connecting)
    }

    /// Caller asked for shutdown; no reconnect follows.
    pub fn on_shutdown(&mut self) {
        if !ConnectionTransition::is_terminal(self.state) {
            self.state = ConnectionState::Closed;
        }
    }
}
