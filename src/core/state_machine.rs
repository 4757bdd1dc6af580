//! State machine for tracking a publish run
//!
//! A run moves strictly forward:
//! `Init → VersionResolved → VersionsWritten → ArtifactsPublishing →
//! UmbrellaPublishing → Done`. `Aborted` is reachable only before anything
//! is mutated: from `Init` (fatal precondition) or from `VersionResolved`
//! (operator declined the confirmation).

use crate::core::error::{PublishError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Publishing state
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PublishState {
    Init,
    VersionResolved,
    VersionsWritten,
    ArtifactsPublishing,
    UmbrellaPublishing,
    Done,
    Aborted,
}

impl fmt::Display for PublishState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl PublishState {
    /// Check if `to` is a legal successor of this state
    pub fn can_transition_to(self, to: PublishState) -> bool {
        use PublishState::*;
        matches!(
            (self, to),
            (Init, VersionResolved)
                | (Init, Aborted)
                | (VersionResolved, VersionsWritten)
                | (VersionResolved, Aborted)
                | (VersionsWritten, ArtifactsPublishing)
                | (ArtifactsPublishing, UmbrellaPublishing)
                | (ArtifactsPublishing, Done)
                | (UmbrellaPublishing, Done)
        )
    }

    /// Check if this state ends a run
    pub fn is_terminal(self) -> bool {
        matches!(self, PublishState::Done | PublishState::Aborted)
    }
}

/// State transition
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StateTransition {
    /// From state
    pub from: PublishState,

    /// To state
    pub to: PublishState,

    /// Timestamp
    pub timestamp: DateTime<Utc>,

    /// Free-form note (version, abort reason)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// State machine for tracking a publish run
#[derive(Debug)]
pub struct PublishStateMachine {
    current_state: PublishState,
    transitions: Vec<StateTransition>,
}

impl Default for PublishStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl PublishStateMachine {
    /// Create a new state machine in `Init`
    pub fn new() -> Self {
        Self {
            current_state: PublishState::Init,
            transitions: Vec::new(),
        }
    }

    /// Transition to a new state
    ///
    /// # Errors
    ///
    /// Returns `PublishError::InvalidTransition` if `to` does not follow the
    /// current state.
    pub fn transition(&mut self, to: PublishState, note: Option<String>) -> Result<()> {
        if !self.current_state.can_transition_to(to) {
            return Err(PublishError::InvalidTransition {
                from: self.current_state.to_string(),
                to: to.to_string(),
            });
        }

        tracing::debug!(from = %self.current_state, to = %to, "publish state transition");

        self.transitions.push(StateTransition {
            from: self.current_state,
            to,
            timestamp: Utc::now(),
            note,
        });
        self.current_state = to;

        Ok(())
    }

    /// Get current state
    pub fn state(&self) -> PublishState {
        self.current_state
    }

    /// Recorded transitions, oldest first
    pub fn transitions(&self) -> &[StateTransition] {
        &self.transitions
    }

    /// Get elapsed time between first and last transition
    pub fn elapsed_ms(&self) -> i64 {
        match (self.transitions.first(), self.transitions.last()) {
            (Some(first), Some(last)) => (last.timestamp - first.timestamp).num_milliseconds(),
            _ => 0,
        }
    }

    /// Get transition history as human-readable string
    pub fn history(&self) -> String {
        self.transitions
            .iter()
            .map(|t| {
                let time = t.timestamp.to_rfc3339();
                let note = t
                    .note
                    .as_ref()
                    .map(|n| format!(" ({})", n))
                    .unwrap_or_default();
                format!("{}: {} → {}{}", time, t.from, t.to, note)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
