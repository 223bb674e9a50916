//! Sync error taxonomy

use crate::state_machine::IllegalTransition;
use mochi_authority::AuthorityError;
use mochi_model::{EntityRef, ModelError, MutationKind};
use mochi_store::StoreError;

/// Message shown when the authority refused a change
pub const SAVE_FAILED: &str = "Failed to save changes";

/// Message shown when the authority could not be reached
pub const NETWORK_ERROR: &str = "Network error, please try again";

/// Errors of the optimistic mutation engine
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyncError {
    /// No answer from the authority (transport failure or timeout)
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    /// The authority refused the change
    #[error("rejected by authority: {0}")]
    AuthorityRejected(String),

    /// Target already exists on the authority
    #[error("conflict, continue at {redirect_target}")]
    Conflict { redirect_target: String },

    /// Input failed local validation; nothing was sent
    #[error("validation failed for {field}")]
    ValidationFailed { field: &'static str },

    /// A conflicting mutation on the entity is still pending
    #[error("{entity} is busy with a pending {kind}")]
    Busy { entity: EntityRef, kind: MutationKind },

    #[error("not found: {0}")]
    NotFound(EntityRef),

    /// The operation needs the authority but the entity exists only locally
    #[error("{0} is not synced")]
    NotSynced(EntityRef),

    #[error("internal error: {0}")]
    Internal(String),
}

impl SyncError {
    /// Error leads to a rollback of an applied optimistic change
    #[inline]
    #[must_use]
    pub fn is_rollback(&self) -> bool {
        matches!(
            self,
            Self::NetworkUnreachable(_) | Self::AuthorityRejected(_) | Self::Conflict { .. }
        )
    }

    /// Text for the inline notice
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::NetworkUnreachable(_) => NETWORK_ERROR.to_string(),
            Self::AuthorityRejected(_) | Self::Internal(_) => SAVE_FAILED.to_string(),
            Self::Conflict { .. } => "Already saved, opening it".to_string(),
            Self::ValidationFailed { field } => format!("Please enter a valid {field}"),
            Self::Busy { .. } => "Still saving, please wait".to_string(),
            Self::NotFound(_) => "This entry no longer exists".to_string(),
            Self::NotSynced(_) => "Save this plan first".to_string(),
        }
    }
}

impl From<AuthorityError> for SyncError {
    fn from(err: AuthorityError) -> Self {
        match err {
            AuthorityError::Unreachable(reason) => Self::NetworkUnreachable(reason),
            AuthorityError::Timeout => Self::NetworkUnreachable("request timed out".to_string()),
            AuthorityError::Rejected { reason } => Self::AuthorityRejected(reason),
            AuthorityError::Conflict { redirect } => Self::Conflict {
                redirect_target: redirect,
            },
            AuthorityError::Unauthorized => Self::AuthorityRejected("not authorized".to_string()),
            AuthorityError::Decode(reason) => {
                Self::AuthorityRejected(format!("malformed response: {reason}"))
            }
        }
    }
}

impl From<ModelError> for SyncError {
    fn from(err: ModelError) -> Self {
        Self::ValidationFailed { field: err.field() }
    }
}

impl From<StoreError> for SyncError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(entity) => Self::NotFound(entity),
            StoreError::Invalid(model) => model.into(),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<IllegalTransition> for SyncError {
    fn from(err: IllegalTransition) -> Self {
        Self::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mochi_model::ItemId;

    #[test]
    fn rollback_classification() {
        assert!(SyncError::NetworkUnreachable("x".into()).is_rollback());
        assert!(SyncError::AuthorityRejected("x".into()).is_rollback());
        assert!(!SyncError::ValidationFailed { field: "name" }.is_rollback());
        assert!(!SyncError::Busy {
            entity: ItemId::new("a").into(),
            kind: MutationKind::Toggle
        }
        .is_rollback());
    }

    #[test]
    fn user_messages() {
        assert_eq!(
            SyncError::AuthorityRejected("db".into()).user_message(),
            SAVE_FAILED
        );
        assert_eq!(
            SyncError::from(AuthorityError::Timeout).user_message(),
            NETWORK_ERROR
        );
        let local = SyncError::NotSynced(EntityRef::Plan(mochi_model::PlanId::new("guest_1")));
        assert_eq!(local.user_message(), "Save this plan first");
        assert!(!local.is_rollback());
    }

    #[test]
    fn authority_errors_convert() {
        assert_eq!(
            SyncError::from(AuthorityError::Conflict {
                redirect: "/plans/4".into()
            }),
            SyncError::Conflict {
                redirect_target: "/plans/4".into()
            }
        );
        assert!(matches!(
            SyncError::from(AuthorityError::Unauthorized),
            SyncError::AuthorityRejected(_)
        ));
    }

    #[test]
    fn store_errors_convert() {
        let missing = EntityRef::Item(ItemId::new("gone"));
        assert_eq!(
            SyncError::from(StoreError::NotFound(missing.clone())),
            SyncError::NotFound(missing)
        );
        assert_eq!(
            SyncError::from(StoreError::Invalid(ModelError::SelfMove)),
            SyncError::ValidationFailed { field: "target" }
        );
    }
}
