//! Explicit plan session
//!
//! Plan-scoped operations take a [`Session`] instead of reading a global
//! "current plan".

use mochi_model::PlanId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
    /// Signed in; changes go through the authority
    #[default]
    Authenticated,
    /// Not signed in; new entities get guest ids and stay local
    Guest,
    /// Local draft file only, no authority attached
    Draft,
}

/// Plan being worked on, and how
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Session {
    pub plan_id: PlanId,
    pub mode: SessionMode,
}

impl Session {
    #[inline]
    #[must_use]
    pub fn authenticated(plan_id: PlanId) -> Self {
        Self {
            plan_id,
            mode: SessionMode::Authenticated,
        }
    }

    #[inline]
    #[must_use]
    pub fn guest(plan_id: PlanId) -> Self {
        Self {
            plan_id,
            mode: SessionMode::Guest,
        }
    }

    #[inline]
    #[must_use]
    pub fn draft(plan_id: PlanId) -> Self {
        Self {
            plan_id,
            mode: SessionMode::Draft,
        }
    }

    /// Changes made in this session never reach the authority
    #[inline]
    #[must_use]
    pub fn is_local_only(&self) -> bool {
        !matches!(self.mode, SessionMode::Authenticated)
    }
}
