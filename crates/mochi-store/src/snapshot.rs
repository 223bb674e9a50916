//! Restore state captured before a mutation

use mochi_model::{
    CategoryId, ChecklistCategory, ChecklistItem, EntityRef, Field, ItemId, Plan, PlanId,
};
use serde::{Deserialize, Serialize};

/// Cloned view of one entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Entity {
    Plan(Plan),
    Category(ChecklistCategory),
    Item(ChecklistItem),
}

/// Opaque restore state returned by `EntityStore::apply`
///
/// Restoring a snapshot puts back exactly what it captured and nothing else,
/// so concurrent mutations on other entities survive a rollback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Snapshot {
    /// Removed item and where it lived
    Item {
        plan: PlanId,
        category: CategoryId,
        index: usize,
        item: ChecklistItem,
    },
    /// Removed category and where it lived
    Category {
        plan: PlanId,
        index: usize,
        category: ChecklistCategory,
    },
    /// Removed plan and where it lived
    Plan { index: usize, plan: Box<Plan> },
    /// Item order of one category
    Order {
        category: CategoryId,
        order: Vec<ItemId>,
    },
    /// Prior checked flag
    Checked { item: ItemId, checked: bool },
    /// Prior field value
    Field {
        target: EntityRef,
        field: Field,
        value: String,
    },
    /// Entity did not exist before (rolled back by removing it)
    Absent(EntityRef),
    /// Nothing was applied
    Unchanged,
}

impl Snapshot {
    /// Entity a restore of this snapshot touches
    #[must_use]
    pub fn entity(&self) -> Option<EntityRef> {
        match self {
            Self::Item { item, .. } => Some(item.checklist_item_id.clone().into()),
            Self::Category { category, .. } => Some(category.checklist_id.clone().into()),
            Self::Plan { plan, .. } => Some(plan.plan_id.clone().into()),
            Self::Order { category, .. } => Some(category.clone().into()),
            Self::Checked { item, .. } => Some(item.clone().into()),
            Self::Field { target, .. } | Self::Absent(target) => Some(target.clone()),
            Self::Unchanged => None,
        }
    }

    /// Captured order, for reorder snapshots
    #[must_use]
    pub fn order(&self) -> Option<&[ItemId]> {
        match self {
            Self::Order { order, .. } => Some(order),
            _ => None,
        }
    }
}
