//! Typed requests and acknowledgements
//!
//! Every request carries the [`RequestToken`] of the intent it was built
//! from. Tokens are for correlation in logs only; they are not sent.

use mochi_model::{
    CategoryId, ChecklistCategory, EntityRef, Field, ItemId, PlanId, RequestToken, ScheduleDay,
    Visibility,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetChecked {
    pub token: RequestToken,
    pub item_id: ItemId,
    pub checked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveItem {
    pub token: RequestToken,
    pub dragged_id: ItemId,
    pub target_id: ItemId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditField {
    pub token: RequestToken,
    pub target: EntityRef,
    pub field: Field,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddItem {
    pub token: RequestToken,
    pub category_id: CategoryId,
    pub name: String,
    pub quantity: String,
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddCategory {
    pub token: RequestToken,
    pub plan_id: PlanId,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delete {
    pub token: RequestToken,
    pub target: EntityRef,
}

/// Item as sent by a bulk checklist save
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemPayload {
    pub name: String,
    pub quantity: String,
    pub required: bool,
    pub checked: bool,
}

/// Category as sent by a bulk checklist save
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryPayload {
    pub name: String,
    pub items: Vec<ItemPayload>,
}

/// Whole-checklist replace (guest checklist promotion)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplaceChecklist {
    pub token: RequestToken,
    pub plan_id: PlanId,
    pub categories: Vec<CategoryPayload>,
}

impl ReplaceChecklist {
    /// Build from the current checklist; ids are not sent
    #[must_use]
    pub fn from_checklist(token: RequestToken, plan_id: PlanId, checklist: &[ChecklistCategory]) -> Self {
        let categories = checklist
            .iter()
            .map(|c| CategoryPayload {
                name: c.title.clone(),
                items: c
                    .items
                    .iter()
                    .map(|i| ItemPayload {
                        name: i.name.clone(),
                        quantity: i.quantity.clone(),
                        required: i.required,
                        checked: i.checked,
                    })
                    .collect(),
            })
            .collect();
        Self {
            token,
            plan_id,
            categories,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailPayload {
    pub time: String,
    pub activity: String,
    pub transport_notes: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayPayload {
    pub day: u32,
    pub details: Vec<DetailPayload>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveSchedule {
    pub token: RequestToken,
    pub plan_id: PlanId,
    pub days: Vec<DayPayload>,
}

impl SaveSchedule {
    #[must_use]
    pub fn from_days(token: RequestToken, plan_id: PlanId, days: &[ScheduleDay]) -> Self {
        let days = days
            .iter()
            .map(|d| DayPayload {
                day: d.day,
                details: d
                    .entries
                    .iter()
                    .map(|e| DetailPayload {
                        time: e.time.clone(),
                        activity: e.activity.clone(),
                        transport_notes: e.note.clone(),
                    })
                    .collect(),
            })
            .collect();
        Self {
            token,
            plan_id,
            days,
        }
    }
}

/// Canonical echo of the stored flag
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ToggleAck {
    pub checked: Option<bool>,
}

/// Canonical order of the category, when the authority reports one
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MoveAck {
    pub order: Option<Vec<ItemId>>,
}

/// Authority-assigned id of a created entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assigned {
    pub id: String,
}

/// Where the client should go after a bulk save
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub target: String,
}

/// Answer to a whole-checklist save
///
/// `checklist` is the stored checklist with authority ids, when echoed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecklistSaved {
    pub target: String,
    pub checklist: Option<Vec<ChecklistCategory>>,
}

impl ChecklistSaved {
    #[must_use]
    pub fn redirect(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            checklist: None,
        }
    }
}

/// Issue a share link for a plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharePlan {
    pub token: RequestToken,
    pub plan_id: PlanId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareLink {
    pub url: String,
}

/// Publish a plan as a reusable template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveTemplate {
    pub token: RequestToken,
    pub plan_id: PlanId,
    pub title: String,
    pub description: String,
    pub visibility: Visibility,
}
