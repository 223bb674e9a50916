//! mochilist data model
//!
//! Plain data types shared by the store, the authority boundary and the
//! optimistic sync engine.
//!
//! # Core Concepts
//!
//! - [`Plan`]: a trip with its options, checklist and schedule
//! - [`ChecklistCategory`] / [`ChecklistItem`]: ordered packing checklist
//! - [`ScheduleDay`] / [`ScheduleEntry`]: per-day itinerary
//! - [`MutationIntent`]: one user action, alive for a single round-trip
//! - [`move_relative`]: the drag ordering rule
//!
//! # Example
//!
//! ```rust
//! use mochi_model::{ChecklistItem, move_relative};
//!
//! let mut items = vec![
//!     ChecklistItem::new("A"),
//!     ChecklistItem::new("B"),
//!     ChecklistItem::new("C"),
//! ];
//! let a = items[0].checklist_item_id.clone();
//! let c = items[2].checklist_item_id.clone();
//!
//! // C is dragged onto A: C sits after A, so it lands right before A.
//! move_relative(&mut items, &c, &a, |i| &i.checklist_item_id).unwrap();
//! assert_eq!(items[0].name, "C");
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod checklist;
mod error;
mod ids;
mod intent;
mod plan;
mod reorder;
mod schedule;

pub use checklist::{default_checklist, ChecklistCategory, ChecklistItem, DEFAULT_CATEGORY_TITLE, NEW_CATEGORY_TITLE};
pub use error::ModelError;
pub use ids::{
    CategoryId, EntityRef, ItemId, PlanId, RequestToken, GUEST_PREFIX, PROVISIONAL_PREFIX,
};
pub use intent::{Field, IntentPayload, MutationIntent, MutationKind};
pub use plan::{Plan, PlanDraft, PlanOptions, Visibility, DEFAULT_DEPARTURE};
pub use reorder::{move_relative, Placement};
pub use schedule::{validate_schedule, ScheduleDay, ScheduleEntry};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
