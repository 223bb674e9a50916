//! mochilist entity store
//!
//! In-memory source of truth for plans, with:
//! - synchronous `apply` / `restore` of mutation intents
//! - a broadcast of [`StoreChange`] for every state change
//! - optional write-through to a [`LocalPersistence`] adapter (draft mode)
//! - the [`Session`] value that scopes plan operations

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod error;
pub mod persistence;
mod session;
mod snapshot;
mod store;

pub use error::{PersistError, StoreError};
pub use persistence::{JsonFilePersistence, LocalPersistence, MemoryPersistence, StoreState};
pub use session::{Session, SessionMode};
pub use snapshot::{Entity, Snapshot};
pub use store::{EntityStore, StoreChange, CHANGE_CAPACITY};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
