//! Per (entity, kind) mutation lifecycle
//!
//! `Idle -> Pending -> {Committed | RolledBack} -> Idle`

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationPhase {
    #[default]
    Idle,
    Pending,
    Committed,
    RolledBack,
}

impl fmt::Display for MutationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Pending => "pending",
            Self::Committed => "committed",
            Self::RolledBack => "rolled_back",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("illegal mutation transition {from} -> {to}")]
pub struct IllegalTransition {
    pub from: MutationPhase,
    pub to: MutationPhase,
}

/// Validates a phase transition
///
/// # Errors
/// [`IllegalTransition`] when `to` is not reachable from `from`.
pub fn validate_transition(from: MutationPhase, to: MutationPhase) -> Result<(), IllegalTransition> {
    if allowed_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(IllegalTransition { from, to })
    }
}

#[must_use]
pub fn allowed_transitions(from: MutationPhase) -> &'static [MutationPhase] {
    use MutationPhase::*;
    match from {
        Idle => &[Pending],
        Pending => &[Committed, RolledBack],
        Committed | RolledBack => &[Idle],
    }
}
