//! Error types for the entity store and its persistence adapters

use mochi_model::{CategoryId, EntityRef, ModelError};

/// Store operation errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Addressed entity is not in the store
    #[error("entity not found: {0}")]
    NotFound(EntityRef),

    /// The mutation is invalid for the current state
    #[error("invalid mutation: {0}")]
    Invalid(#[from] ModelError),

    /// The intent does not fit the target (e.g. a move aimed at a plan)
    #[error("intent does not apply to {target}: {reason}")]
    Mismatch { target: EntityRef, reason: String },

    /// A canonical order is not a permutation of the category's items
    #[error("order for category {0} does not match its items")]
    OrderMismatch(CategoryId),

    /// Draft file could not be read or written
    #[error("persistence error: {0}")]
    Persist(#[from] PersistError),
}

impl StoreError {
    /// Build a mismatch error
    #[inline]
    pub fn mismatch(target: &EntityRef, reason: impl Into<String>) -> Self {
        Self::Mismatch {
            target: target.clone(),
            reason: reason.into(),
        }
    }
}

/// Local persistence errors
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed draft file: {0}")]
    Format(#[from] serde_json::Error),

    /// File was written by a newer or unknown format
    #[error("unsupported draft file version {0}")]
    UnsupportedVersion(u32),
}
