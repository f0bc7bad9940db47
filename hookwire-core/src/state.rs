// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Channel lifecycle state machine.
//!
//! Implements the channel lifecycle: Closed → Open → Closed. A channel that
//! has been closed is retired and cannot be opened again.

use crate::error::HookwireError;

/// Channel lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    /// No shared objects are held.
    Closed,

    /// Shared region and synchronization handles are held.
    Open,
}

impl ChannelState {
    /// Get the state name for error messages.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Closed => "Closed",
            Self::Open => "Open",
        }
    }
}

impl std::fmt::Display for ChannelState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Which side of the channel this process plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelRole {
    /// Owns the shared objects and drains events.
    Consumer,
    /// Attaches to existing objects and pushes events.
    Producer,
}

impl ChannelRole {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Consumer => "consumer",
            Self::Producer => "producer",
        }
    }
}

impl std::fmt::Display for ChannelRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Tracks the lifecycle of one channel instance.
#[derive(Debug)]
pub struct ChannelLifecycle {
    current: ChannelState,
    retired: bool,
}

impl ChannelLifecycle {
    pub fn new() -> Self {
        Self {
            current: ChannelState::Closed,
            retired: false,
        }
    }

    pub fn state(&self) -> ChannelState {
        self.current
    }

    /// Whether the channel was closed after having been open.
    pub fn is_retired(&self) -> bool {
        self.retired
    }

    /// Check if transition to the target state is valid.
    pub fn can_transition_to(&self, target: ChannelState) -> bool {
        match (self.current, target) {
            (ChannelState::Closed, ChannelState::Open) => !self.retired,
            (ChannelState::Open, ChannelState::Closed) => true,
            _ => false,
        }
    }

    /// Attempt to transition to a new state.
    pub fn transition_to(&mut self, target: ChannelState) -> Result<(), HookwireError> {
        if !self.can_transition_to(target) {
            return Err(HookwireError::InvalidStateTransition {
                from: if self.retired { "Closed (retired)" } else { self.current.name() },
                to: target.name(),
            });
        }

        tracing::debug!(from = self.current.name(), to = target.name(), "Channel transition");

        if target == ChannelState::Closed {
            self.retired = true;
        }
        self.current = target;

        Ok(())
    }
}

impl Default for ChannelLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let lifecycle = ChannelLifecycle::new();
        assert_eq!(lifecycle.state(), ChannelState::Closed);
        assert!(!lifecycle.is_retired());
    }

    #[test]
    fn test_open_then_close() {
        let mut lifecycle = ChannelLifecycle::new();
        assert!(lifecycle.transition_to(ChannelState::Open).is_ok());
        assert_eq!(lifecycle.state(), ChannelState::Open);

        assert!(lifecycle.transition_to(ChannelState::Closed).is_ok());
        assert_eq!(lifecycle.state(), ChannelState::Closed);
        assert!(lifecycle.is_retired());
    }

    #[test]
    fn test_invalid_transitions() {
        let mut lifecycle = ChannelLifecycle::new();

        // Closing a channel that was never opened
        assert!(lifecycle.transition_to(ChannelState::Closed).is_err());

        lifecycle.transition_to(ChannelState::Open).unwrap();
        // Opening twice
        assert!(lifecycle.transition_to(ChannelState::Open).is_err());

        lifecycle.transition_to(ChannelState::Closed).unwrap();
        // Reuse after close
        let err = lifecycle.transition_to(ChannelState::Open).unwrap_err();
        assert!(err.to_string().contains("retired"));
    }
}
