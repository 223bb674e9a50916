//! mochilist optimistic sync
//!
//! Every user mutation follows the same three-phase protocol:
//!
//! 1. **Idle -> Pending**: validate, claim the (entity, kind) guard, snapshot
//!    and apply the change to the [`EntityStore`](mochi_store::EntityStore)
//! 2. **Pending -> Committed**: the authority confirmed; canonical corrections
//!    (assigned ids, canonical order, checked echo) are applied
//! 3. **Pending -> RolledBack**: rejection, network failure or timeout; the
//!    snapshot is restored exactly and an inline [`Notice`] is published
//!
//! A second conflicting mutation while one is pending is rejected with
//! [`SyncError::Busy`]; nothing is queued and nothing is retried.
//!
//! # Example
//!
//! ```rust,no_run
//! use mochi_model::ItemId;
//! use mochi_store::EntityStore;
//! use mochi_sync::{SyncConfig, SyncEngine};
//! use std::sync::Arc;
//!
//! # async fn run(authority: Arc<dyn mochi_authority::Authority>) -> Result<(), mochi_sync::SyncError> {
//! let store = Arc::new(EntityStore::new());
//! let engine = SyncEngine::new(store, authority, SyncConfig::default());
//!
//! let ticket = engine.toggle(&ItemId::new("17"))?;
//! let outcome = ticket.outcome().await;
//! println!("{outcome:?}");
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod config;
mod engine;
mod error;
mod guard;
pub mod state_machine;
mod surface;
mod ticket;

pub use config::SyncConfig;
pub use engine::SyncEngine;
pub use error::{SyncError, NETWORK_ERROR, SAVE_FAILED};
pub use state_machine::{validate_transition, MutationPhase};
pub use surface::{ErrorSurface, Notice, SyncEvent};
pub use ticket::{MutationOutcome, MutationTicket};

/// Commonly used items
pub mod prelude {
    pub use crate::{
        ErrorSurface, MutationOutcome, MutationPhase, MutationTicket, Notice, SyncConfig,
        SyncEngine, SyncError, SyncEvent,
    };
    pub use mochi_model::{CategoryId, EntityRef, Field, ItemId, MutationKind, PlanId, Visibility};
    pub use mochi_store::{EntityStore, Session, SessionMode};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
