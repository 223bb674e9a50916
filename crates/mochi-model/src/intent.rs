//! Mutation intents
//!
//! A [`MutationIntent`] describes exactly one user action. It is built by the
//! sync engine, applied optimistically by the store and translated into one
//! authority request. It is never persisted.

use crate::checklist::{ChecklistCategory, ChecklistItem, DEFAULT_CATEGORY_TITLE};
use crate::error::ModelError;
use crate::ids::{CategoryId, EntityRef, ItemId, PlanId, RequestToken};
use crate::plan::Visibility;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of mutation; single-flight is tracked per (entity, kind)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationKind {
    Toggle,
    Reorder,
    EditField,
    Add,
    Delete,
    /// Whole-checklist, whole-schedule or template save
    BulkSave,
    /// Share link request; changes nothing locally
    Share,
}

impl MutationKind {
    /// Exclusive kinds conflict with every other claim on the same entity
    #[inline]
    #[must_use]
    pub fn is_exclusive(self) -> bool {
        matches!(self, Self::Add | Self::Delete | Self::BulkSave)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Toggle => "toggle",
            Self::Reorder => "reorder",
            Self::EditField => "edit_field",
            Self::Add => "add",
            Self::Delete => "delete",
            Self::BulkSave => "bulk_save",
            Self::Share => "share",
        }
    }
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Editable scalar fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    ItemName,
    Quantity,
    CategoryTitle,
    PlanTitle,
    Description,
    Visibility,
    Transport,
    Accommodation,
    PriceRange,
}

impl Field {
    /// Wire name of the field
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ItemName => "name",
            Self::Quantity => "quantity",
            Self::CategoryTitle | Self::PlanTitle => "title",
            Self::Description => "description",
            Self::Visibility => "visibility",
            Self::Transport => "transport",
            Self::Accommodation => "accommodation",
            Self::PriceRange => "price_range",
        }
    }

    /// Whether the field exists on the referenced entity
    #[must_use]
    pub fn applies_to(self, entity: &EntityRef) -> bool {
        match entity {
            EntityRef::Item(_) => matches!(self, Self::ItemName | Self::Quantity),
            EntityRef::Category(_) => matches!(self, Self::CategoryTitle),
            EntityRef::Plan(_) => matches!(
                self,
                Self::PlanTitle
                    | Self::Description
                    | Self::Visibility
                    | Self::Transport
                    | Self::Accommodation
                    | Self::PriceRange
            ),
        }
    }

    /// Normalize raw user input for this field
    ///
    /// Every defaulting rule for edited values lives here.
    ///
    /// # Errors
    /// - [`ModelError::Empty`] for blank item names and plan titles
    /// - [`ModelError::InvalidValue`] for unknown visibility values
    pub fn normalize(self, raw: &str) -> Result<String, ModelError> {
        let value = raw.trim();
        match self {
            Self::ItemName | Self::PlanTitle if value.is_empty() => Err(ModelError::Empty {
                field: self.as_str(),
            }),
            Self::CategoryTitle if value.is_empty() => Ok(DEFAULT_CATEGORY_TITLE.to_string()),
            Self::Visibility => Visibility::from_str(value).map(|v| v.to_string()),
            _ => Ok(value.to_string()),
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the intent does to the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum IntentPayload {
    /// Set the checked flag to this value
    SetChecked { checked: bool },
    /// Move `dragged` relative to `target` inside the target category
    Move { dragged: ItemId, target: ItemId },
    /// Set an already-normalized field value
    SetField { field: Field, value: String },
    /// Append an item to a category
    InsertItem { category: CategoryId, item: ChecklistItem },
    /// Append a category to a plan
    InsertCategory { plan: PlanId, category: ChecklistCategory },
    /// Remove the target entity
    Remove,
    /// Submit-only bulk save; nothing is applied before confirmation
    Submit,
    /// Ask for a share link; nothing is applied
    Share,
}

impl IntentPayload {
    #[must_use]
    pub fn kind(&self) -> MutationKind {
        match self {
            Self::SetChecked { .. } => MutationKind::Toggle,
            Self::Move { .. } => MutationKind::Reorder,
            Self::SetField { .. } => MutationKind::EditField,
            Self::InsertItem { .. } | Self::InsertCategory { .. } => MutationKind::Add,
            Self::Remove => MutationKind::Delete,
            Self::Submit => MutationKind::BulkSave,
            Self::Share => MutationKind::Share,
        }
    }

    /// Payload leaves the store untouched
    #[inline]
    #[must_use]
    pub fn is_submit_only(&self) -> bool {
        matches!(self, Self::Submit | Self::Share)
    }
}

/// One user action for the duration of one round-trip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutationIntent {
    pub token: RequestToken,
    pub target: EntityRef,
    pub kind: MutationKind,
    pub payload: IntentPayload,
}

impl MutationIntent {
    /// Create intent with a fresh token; the kind follows the payload
    #[must_use]
    pub fn new(target: impl Into<EntityRef>, payload: IntentPayload) -> Self {
        Self {
            token: RequestToken::new(),
            target: target.into(),
            kind: payload.kind(),
            payload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exclusive_kinds() {
        assert!(MutationKind::Delete.is_exclusive());
        assert!(MutationKind::Add.is_exclusive());
        assert!(MutationKind::BulkSave.is_exclusive());
        assert!(!MutationKind::Toggle.is_exclusive());
        assert!(!MutationKind::Reorder.is_exclusive());
        assert!(!MutationKind::Share.is_exclusive());
    }

    #[test]
    fn submit_only_payloads() {
        assert!(IntentPayload::Submit.is_submit_only());
        assert!(IntentPayload::Share.is_submit_only());
        assert!(!IntentPayload::Remove.is_submit_only());
        assert_eq!(IntentPayload::Share.kind(), MutationKind::Share);
    }

    #[test]
    fn intent_kind_follows_payload() {
        let intent = MutationIntent::new(ItemId::new("a"), IntentPayload::SetChecked { checked: true });
        assert_eq!(intent.kind, MutationKind::Toggle);
        assert_eq!(intent.target, EntityRef::Item(ItemId::new("a")));
    }

    #[test]
    fn normalize_rules() {
        assert_eq!(Field::Quantity.normalize("  2 "), Ok("2".to_string()));
        assert_eq!(Field::Quantity.normalize(""), Ok(String::new()));
        assert_eq!(
            Field::ItemName.normalize("   "),
            Err(ModelError::Empty { field: "name" })
        );
        assert_eq!(
            Field::PlanTitle.normalize(""),
            Err(ModelError::Empty { field: "title" })
        );
        assert_eq!(
            Field::CategoryTitle.normalize(""),
            Ok(DEFAULT_CATEGORY_TITLE.to_string())
        );
        assert_eq!(Field::Visibility.normalize("Public"), Ok("public".to_string()));
        assert!(Field::Visibility.normalize("friends").is_err());
    }

    #[test]
    fn field_applicability() {
        let item = EntityRef::Item(ItemId::new("i"));
        let plan = EntityRef::Plan(PlanId::new("p"));
        assert!(Field::Quantity.applies_to(&item));
        assert!(!Field::Quantity.applies_to(&plan));
        assert!(Field::Visibility.applies_to(&plan));
        assert!(!Field::CategoryTitle.applies_to(&item));
    }
}
