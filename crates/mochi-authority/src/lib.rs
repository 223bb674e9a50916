//! mochilist authority boundary
//!
//! The remote authoritative store is an [`Authority`]: one async method per
//! mutation kind, each taking a typed request and returning a typed
//! acknowledgement or an [`AuthorityError`].
//!
//! [`HttpAuthority`] implements it over JSON/HTTP.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod client;
mod config;
mod error;
pub mod http;
pub mod types;

pub use client::{Authority, AuthorityCall, Confirmation};
pub use config::AuthorityConfig;
pub use error::AuthorityError;
pub use http::{interpret, Envelope, HttpAuthority};
pub use types::{
    AddCategory, AddItem, Assigned, CategoryPayload, ChecklistSaved, DayPayload, Delete,
    DetailPayload, EditField, ItemPayload, MoveAck, MoveItem, Redirect, ReplaceChecklist,
    SaveSchedule, SaveTemplate, SetChecked, ShareLink, SharePlan, ToggleAck,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
