//! Mutation tickets
//!
//! Every accepted mutation returns a [`MutationTicket`] synchronously. The
//! ticket resolves once the mutation is back to Idle.

use crate::error::SyncError;
use mochi_model::{EntityRef, RequestToken};
use tokio::sync::oneshot;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOutcome {
    /// Confirmed; `entity` is the final reference (assigned id for adds)
    Committed { entity: EntityRef },
    /// The optimistic change was undone
    RolledBack(SyncError),
    /// Applied locally, nothing sent (guest entity or draft mode)
    LocalOnly,
    /// Bulk save accepted; the view should continue at `target`
    Redirected { target: String },
    /// Share link issued
    Shared { url: String },
}

impl MutationOutcome {
    #[inline]
    #[must_use]
    pub fn is_committed(&self) -> bool {
        matches!(
            self,
            Self::Committed { .. } | Self::Redirected { .. } | Self::Shared { .. }
        )
    }

    #[inline]
    #[must_use]
    pub fn is_rolled_back(&self) -> bool {
        matches!(self, Self::RolledBack(_))
    }

    #[must_use]
    pub fn error(&self) -> Option<&SyncError> {
        match self {
            Self::RolledBack(e) => Some(e),
            _ => None,
        }
    }
}

/// Handle to an in-flight or finished mutation
#[derive(Debug)]
pub struct MutationTicket {
    token: RequestToken,
    entity: EntityRef,
    rx: oneshot::Receiver<MutationOutcome>,
}

impl MutationTicket {
    pub(crate) fn pending(
        token: RequestToken,
        entity: EntityRef,
        rx: oneshot::Receiver<MutationOutcome>,
    ) -> Self {
        Self { token, entity, rx }
    }

    pub(crate) fn resolved(token: RequestToken, entity: EntityRef, outcome: MutationOutcome) -> Self {
        let (tx, rx) = oneshot::channel();
        let _ = tx.send(outcome);
        Self { token, entity, rx }
    }

    #[inline]
    #[must_use]
    pub fn token(&self) -> RequestToken {
        self.token
    }

    /// Entity the mutation was issued against (provisional id for adds)
    #[inline]
    #[must_use]
    pub fn entity(&self) -> &EntityRef {
        &self.entity
    }

    /// Wait for the mutation to finish
    pub async fn outcome(self) -> MutationOutcome {
        self.rx.await.unwrap_or_else(|_| {
            MutationOutcome::RolledBack(SyncError::Internal("mutation task dropped".to_string()))
        })
    }
}
