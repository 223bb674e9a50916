//! Checklist categories and items

use crate::error::ModelError;
use crate::ids::{CategoryId, ItemId};
use crate::intent::Field;
use serde::{Deserialize, Serialize};

/// Title used when a category title is cleared
pub const DEFAULT_CATEGORY_TITLE: &str = "Category";

/// Title used when a category is added without one
pub const NEW_CATEGORY_TITLE: &str = "New category";

fn default_required() -> bool {
    true
}

/// One packing item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub checklist_item_id: ItemId,
    #[serde(rename = "item_name")]
    pub name: String,
    #[serde(rename = "is_checked", default)]
    pub checked: bool,
    /// Free text ("2", "1 pair", ...)
    #[serde(default)]
    pub quantity: String,
    /// Essential column when true, extra column otherwise
    #[serde(rename = "is_required", default = "default_required")]
    pub required: bool,
}

impl ChecklistItem {
    /// Create an unchecked, required item with a fresh id
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_id(ItemId::generate(), name)
    }

    #[must_use]
    pub fn with_id(id: ItemId, name: impl Into<String>) -> Self {
        Self {
            checklist_item_id: id,
            name: name.into(),
            checked: false,
            quantity: String::new(),
            required: true,
        }
    }

    #[must_use]
    pub fn with_quantity(mut self, quantity: impl Into<String>) -> Self {
        self.quantity = quantity.into();
        self
    }

    /// Move the item to the extra column
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    #[must_use]
    pub fn checked(mut self) -> Self {
        self.checked = true;
        self
    }

    /// Display label: `name (quantity)` or just `name`
    #[must_use]
    pub fn label(&self) -> String {
        if self.quantity.is_empty() {
            self.name.clone()
        } else {
            format!("{} ({})", self.name, self.quantity)
        }
    }

    #[must_use]
    pub fn field(&self, field: Field) -> Option<String> {
        match field {
            Field::ItemName => Some(self.name.clone()),
            Field::Quantity => Some(self.quantity.clone()),
            _ => None,
        }
    }

    /// Write an already-normalized value
    ///
    /// # Errors
    /// [`ModelError::FieldNotApplicable`] for non-item fields
    pub fn set_field(&mut self, field: Field, value: String) -> Result<(), ModelError> {
        match field {
            Field::ItemName => self.name = value,
            Field::Quantity => self.quantity = value,
            other => {
                return Err(ModelError::FieldNotApplicable {
                    field: other.as_str(),
                    entity: "item".to_string(),
                })
            }
        }
        Ok(())
    }
}

/// Ordered group of items
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistCategory {
    pub checklist_id: CategoryId,
    pub title: String,
    #[serde(default)]
    pub items: Vec<ChecklistItem>,
}

impl ChecklistCategory {
    /// Create an empty category; blank titles become [`NEW_CATEGORY_TITLE`]
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self::with_id(CategoryId::generate(), title)
    }

    #[must_use]
    pub fn with_id(id: CategoryId, title: impl Into<String>) -> Self {
        let title = title.into();
        let title = title.trim();
        Self {
            checklist_id: id,
            title: if title.is_empty() {
                NEW_CATEGORY_TITLE.to_string()
            } else {
                title.to_string()
            },
            items: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_items(mut self, items: Vec<ChecklistItem>) -> Self {
        self.items = items;
        self
    }

    #[must_use]
    pub fn position(&self, id: &ItemId) -> Option<usize> {
        self.items.iter().position(|i| &i.checklist_item_id == id)
    }

    #[must_use]
    pub fn item(&self, id: &ItemId) -> Option<&ChecklistItem> {
        self.items.iter().find(|i| &i.checklist_item_id == id)
    }

    pub fn item_mut(&mut self, id: &ItemId) -> Option<&mut ChecklistItem> {
        self.items.iter_mut().find(|i| &i.checklist_item_id == id)
    }

    #[must_use]
    pub fn item_ids(&self) -> Vec<ItemId> {
        self.items.iter().map(|i| i.checklist_item_id.clone()).collect()
    }

    /// Items shown in the essential column
    pub fn essential(&self) -> impl Iterator<Item = &ChecklistItem> {
        self.items.iter().filter(|i| i.required)
    }

    /// Items shown in the extra column
    pub fn extra(&self) -> impl Iterator<Item = &ChecklistItem> {
        self.items.iter().filter(|i| !i.required)
    }

    /// First `n` item labels, used by the plan summary table
    #[must_use]
    pub fn preview(&self, n: usize) -> String {
        self.items
            .iter()
            .take(n)
            .map(ChecklistItem::label)
            .collect::<Vec<_>>()
            .join(", ")
    }

    #[must_use]
    pub fn field(&self, field: Field) -> Option<String> {
        match field {
            Field::CategoryTitle => Some(self.title.clone()),
            _ => None,
        }
    }

    /// Write an already-normalized value
    ///
    /// # Errors
    /// [`ModelError::FieldNotApplicable`] for non-category fields
    pub fn set_field(&mut self, field: Field, value: String) -> Result<(), ModelError> {
        match field {
            Field::CategoryTitle => {
                self.title = value;
                Ok(())
            }
            other => Err(ModelError::FieldNotApplicable {
                field: other.as_str(),
                entity: "category".to_string(),
            }),
        }
    }
}

/// Starting checklist for a new plan, with fresh ids every call
#[must_use]
pub fn default_checklist() -> Vec<ChecklistCategory> {
    vec![
        ChecklistCategory::new("Essentials").with_items(vec![
            ChecklistItem::new("Cash & cards"),
            ChecklistItem::new("Tickets"),
        ]),
        ChecklistCategory::new("Clothing")
            .with_items(vec![ChecklistItem::new("Change of clothes")]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_includes_quantity_when_present() {
        assert_eq!(ChecklistItem::new("Socks").label(), "Socks");
        assert_eq!(
            ChecklistItem::new("Socks").with_quantity("3 pairs").label(),
            "Socks (3 pairs)"
        );
    }

    #[test]
    fn blank_category_title_gets_default() {
        assert_eq!(ChecklistCategory::new("  ").title, NEW_CATEGORY_TITLE);
        assert_eq!(ChecklistCategory::new(" Gear ").title, "Gear");
    }

    #[test]
    fn essential_and_extra_split() {
        let cat = ChecklistCategory::new("Bag").with_items(vec![
            ChecklistItem::new("Passport"),
            ChecklistItem::new("Book").optional(),
            ChecklistItem::new("Charger"),
        ]);
        let essential: Vec<_> = cat.essential().map(|i| i.name.as_str()).collect();
        let extra: Vec<_> = cat.extra().map(|i| i.name.as_str()).collect();
        assert_eq!(essential, vec!["Passport", "Charger"]);
        assert_eq!(extra, vec!["Book"]);
    }

    #[test]
    fn preview_takes_first_items() {
        let cat = ChecklistCategory::new("Bag").with_items(vec![
            ChecklistItem::new("A").with_quantity("2"),
            ChecklistItem::new("B"),
            ChecklistItem::new("C"),
        ]);
        assert_eq!(cat.preview(2), "A (2), B");
    }

    #[test]
    fn default_checklist_ids_are_fresh() {
        let a = default_checklist();
        let b = default_checklist();
        assert_eq!(a[0].title, "Essentials");
        assert_ne!(a[0].checklist_id, b[0].checklist_id);
        assert_ne!(a[0].items[0].checklist_item_id, b[0].items[0].checklist_item_id);
    }

    #[test]
    fn item_rejects_category_fields() {
        let mut item = ChecklistItem::new("A");
        assert!(item.set_field(Field::Quantity, "2".into()).is_ok());
        assert!(item.set_field(Field::CategoryTitle, "x".into()).is_err());
        assert_eq!(item.quantity, "2");
    }

    #[test]
    fn item_json_uses_wire_names() {
        let item = ChecklistItem::with_id(ItemId::new("c1_i1"), "Tickets");
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["item_name"], "Tickets");
        assert_eq!(json["is_checked"], false);
        assert_eq!(json["is_required"], true);
    }
}
