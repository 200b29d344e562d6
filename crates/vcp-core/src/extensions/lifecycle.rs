//! Extension lifecycle state machine

use super::{ExtensionError, ExtensionResult};
use serde::Serialize;
use std::time::SystemTime;

/// Extension lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtensionState {
    /// Registered but not initialized
    Created,

    /// `initialize` is running
    Initializing,

    /// Receiving messages
    Active,

    /// `cleanup` is running
    ShuttingDown,

    /// Cleaned up
    Stopped,

    /// Initialization or cleanup failed
    Failed,
}

impl ExtensionState {
    /// Check if the extension should receive messages
    pub fn is_operational(&self) -> bool {
        matches!(self, ExtensionState::Active)
    }

    /// Check if cleanup should run
    pub fn needs_cleanup(&self) -> bool {
        matches!(self, ExtensionState::Active | ExtensionState::Failed)
    }
}

/// State change record
#[derive(Debug, Clone)]
pub struct StateChange {
    pub from: ExtensionState,
    pub to: ExtensionState,
    pub timestamp: SystemTime,
    pub reason: Option<String>,
}

/// Tracks one extension's state and recent transitions
#[derive(Debug)]
pub struct ExtensionLifecycle {
    state: ExtensionState,
    history: Vec<StateChange>,
    max_history: usize,
}

impl Default for ExtensionLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtensionLifecycle {
    pub fn new() -> Self {
        Self {
            state: ExtensionState::Created,
            history: Vec::new(),
            max_history: 20,
        }
    }

    pub fn state(&self) -> ExtensionState {
        self.state
    }

    pub fn history(&self) -> &[StateChange] {
        &self.history
    }

    /// Transition to new state
    pub fn transition(&mut self, new_state: ExtensionState, reason: Option<String>) -> ExtensionResult<()> {
        use ExtensionState::*;

        let valid = matches!(
            (self.state, new_state),
            (Created, Initializing)
                | (Initializing, Active)
                | (Initializing, Failed)
                | (Active, ShuttingDown)
                | (Active, Failed)
                | (Failed, ShuttingDown)
                | (ShuttingDown, Stopped)
                | (ShuttingDown, Failed)
        );

        if !valid {
            return Err(ExtensionError::InvalidTransition {
                from: self.state,
                to: new_state,
            });
        }

        self.history.push(StateChange {
            from: self.state,
            to: new_state,
            timestamp: SystemTime::now(),
            reason,
        });
        if self.history.len() > self.max_history {
            self.history.remove(0);
        }

        self.state = new_state;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path() {
        let mut lifecycle = ExtensionLifecycle::new();
        lifecycle.transition(ExtensionState::Initializing, None).unwrap();
        lifecycle.transition(ExtensionState::Active, None).unwrap();
        assert!(lifecycle.state().is_operational());
        lifecycle.transition(ExtensionState::ShuttingDown, None).unwrap();
        lifecycle.transition(ExtensionState::Stopped, Some("cleanup done".into())).unwrap();
        assert_eq!(lifecycle.history().len(), 4);
        assert_eq!(lifecycle.history()[3].reason.as_deref(), Some("cleanup done"));
    }

    #[test]
    fn test_invalid_transition() {
        let mut lifecycle = ExtensionLifecycle::new();
        let err = lifecycle.transition(ExtensionState::Active, None).unwrap_err();
        assert!(matches!(err, ExtensionError::InvalidTransition { .. }));
        assert_eq!(lifecycle.state(), ExtensionState::Created);
    }
}
