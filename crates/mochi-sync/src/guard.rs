//! Single-flight guard table
//!
//! A mutation claims a set of (entity, kind) keys before anything is applied.
//! Two claims on the same entity conflict when they share a kind or when
//! either kind is exclusive. A claim is all-or-nothing and never queued.

use crate::error::SyncError;
use crate::state_machine::{validate_transition, MutationPhase};
use mochi_model::{EntityRef, MutationKind, RequestToken};
use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::error;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct GuardKey {
    pub(crate) entity: EntityRef,
    pub(crate) kind: MutationKind,
}

impl GuardKey {
    pub(crate) fn new(entity: impl Into<EntityRef>, kind: MutationKind) -> Self {
        Self {
            entity: entity.into(),
            kind,
        }
    }

    fn conflicts_with(&self, other: &Self) -> bool {
        self.entity == other.entity
            && (self.kind == other.kind || self.kind.is_exclusive() || other.kind.is_exclusive())
    }
}

#[derive(Debug, Clone, Copy)]
struct Claim {
    token: RequestToken,
    phase: MutationPhase,
}

#[derive(Debug, Default)]
pub(crate) struct GuardTable {
    claims: Mutex<HashMap<GuardKey, Claim>>,
}

impl GuardTable {
    /// Fail with `Busy` if any key conflicts with a pending claim
    pub(crate) fn check(&self, keys: &[GuardKey]) -> Result<(), SyncError> {
        let claims = self.claims.lock();
        Self::find_conflict(&claims, keys)
    }

    /// Claim every key as Pending for `token`
    pub(crate) fn claim(&self, token: RequestToken, keys: &[GuardKey]) -> Result<(), SyncError> {
        let mut claims = self.claims.lock();
        Self::find_conflict(&claims, keys)?;
        validate_transition(MutationPhase::Idle, MutationPhase::Pending)?;
        for key in keys {
            claims.insert(
                key.clone(),
                Claim {
                    token,
                    phase: MutationPhase::Pending,
                },
            );
        }
        Ok(())
    }

    /// Move `token`'s keys through `outcome` back to Idle
    pub(crate) fn finish(&self, token: RequestToken, keys: &[GuardKey], outcome: MutationPhase) {
        let mut claims = self.claims.lock();
        for key in keys {
            let Some(claim) = claims.get_mut(key) else {
                continue;
            };
            if claim.token != token {
                continue;
            }
            let result = validate_transition(claim.phase, outcome)
                .and_then(|()| validate_transition(outcome, MutationPhase::Idle));
            if let Err(e) = result {
                error!(entity = %key.entity, kind = %key.kind, error = %e, "guard transition");
            }
            claims.remove(key);
        }
    }

    pub(crate) fn phase(&self, entity: &EntityRef, kind: MutationKind) -> MutationPhase {
        let key = GuardKey::new(entity.clone(), kind);
        self.claims
            .lock()
            .get(&key)
            .map_or(MutationPhase::Idle, |c| c.phase)
    }

    pub(crate) fn is_busy(&self, entity: &EntityRef) -> bool {
        self.claims.lock().keys().any(|k| &k.entity == entity)
    }

    pub(crate) fn pending_count(&self) -> usize {
        self.claims.lock().len()
    }

    fn find_conflict(claims: &HashMap<GuardKey, Claim>, keys: &[GuardKey]) -> Result<(), SyncError> {
        for key in keys {
            if let Some(held) = claims.keys().find(|held| held.conflicts_with(key)) {
                return Err(SyncError::Busy {
                    entity: held.entity.clone(),
                    kind: held.kind,
                });
            }
        }
        Ok(())
    }
}
