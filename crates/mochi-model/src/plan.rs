//! Travel plans

use crate::checklist::{default_checklist, ChecklistCategory, ChecklistItem};
use crate::error::ModelError;
use crate::ids::{CategoryId, ItemId, PlanId};
use crate::intent::Field;
use crate::schedule::ScheduleDay;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Departure used when the draft leaves it blank
pub const DEFAULT_DEPARTURE: &str = "Current location";

/// Who can see a finished plan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    Private,
    Public,
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Private => "private",
            Self::Public => "public",
        })
    }
}

impl FromStr for Visibility {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "private" => Ok(Self::Private),
            "public" => Ok(Self::Public),
            _ => Err(ModelError::InvalidValue {
                field: "visibility",
                value: s.to_string(),
            }),
        }
    }
}

/// Fixed set of plan options
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanOptions {
    pub transport: Option<String>,
    pub accommodation: Option<String>,
    pub purposes: Vec<String>,
    pub needs: Vec<String>,
    pub visibility: Visibility,
    pub description: String,
    pub price_range: Option<String>,
    pub stay_locations: Vec<String>,
}

impl PlanOptions {
    #[must_use]
    pub fn transport_label(&self) -> &str {
        self.transport.as_deref().unwrap_or("unset")
    }

    #[must_use]
    pub fn accommodation_label(&self) -> &str {
        self.accommodation.as_deref().unwrap_or("unset")
    }
}

/// Input of the plan creation form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanDraft {
    pub destination: String,
    #[serde(default)]
    pub departure: String,
    pub start_date: NaiveDate,
    pub days: u32,
    #[serde(default)]
    pub companion_count: u32,
    #[serde(default)]
    pub purposes: Vec<String>,
    #[serde(default)]
    pub needs: Vec<String>,
}

impl PlanDraft {
    #[must_use]
    pub fn new(destination: impl Into<String>, start_date: NaiveDate, days: u32) -> Self {
        Self {
            destination: destination.into(),
            departure: String::new(),
            start_date,
            days,
            companion_count: 0,
            purposes: Vec::new(),
            needs: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_departure(mut self, departure: impl Into<String>) -> Self {
        self.departure = departure.into();
        self
    }

    #[must_use]
    pub fn with_purposes(mut self, purposes: Vec<String>) -> Self {
        self.purposes = purposes;
        self
    }

    #[must_use]
    pub fn with_needs(mut self, needs: Vec<String>) -> Self {
        self.needs = needs;
        self
    }

    /// # Errors
    /// - [`ModelError::Empty`] when the destination is blank
    /// - [`ModelError::InvalidValue`] when `days` is zero
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.destination.trim().is_empty() {
            return Err(ModelError::Empty {
                field: "destination",
            });
        }
        if self.days == 0 {
            return Err(ModelError::InvalidValue {
                field: "days",
                value: self.days.to_string(),
            });
        }
        Ok(())
    }
}

/// A trip with its checklist and schedule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub plan_id: PlanId,
    pub title: String,
    pub departure: String,
    pub destination: String,
    pub start_date: NaiveDate,
    pub days: u32,
    #[serde(default)]
    pub companion_count: u32,
    #[serde(default)]
    pub options: PlanOptions,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub checklist: Vec<ChecklistCategory>,
    #[serde(default)]
    pub schedule: Vec<ScheduleDay>,
}

impl Plan {
    /// Build a new plan with the default checklist
    ///
    /// # Errors
    /// Propagates [`PlanDraft::validate`] failures.
    pub fn from_draft(id: PlanId, draft: PlanDraft) -> Result<Self, ModelError> {
        draft.validate()?;
        let destination = draft.destination.trim().to_string();
        let departure = match draft.departure.trim() {
            "" => DEFAULT_DEPARTURE.to_string(),
            other => other.to_string(),
        };
        let now = Utc::now();
        Ok(Self {
            plan_id: id,
            title: format!("{destination} trip"),
            departure,
            destination,
            start_date: draft.start_date,
            days: draft.days,
            companion_count: draft.companion_count,
            options: PlanOptions {
                purposes: draft.purposes,
                needs: draft.needs,
                ..PlanOptions::default()
            },
            created_at: now,
            updated_at: now,
            checklist: default_checklist(),
            schedule: Vec::new(),
        })
    }

    #[must_use]
    pub fn category(&self, id: &CategoryId) -> Option<&ChecklistCategory> {
        self.checklist.iter().find(|c| &c.checklist_id == id)
    }

    pub fn category_mut(&mut self, id: &CategoryId) -> Option<&mut ChecklistCategory> {
        self.checklist.iter_mut().find(|c| &c.checklist_id == id)
    }

    #[must_use]
    pub fn category_position(&self, id: &CategoryId) -> Option<usize> {
        self.checklist.iter().position(|c| &c.checklist_id == id)
    }

    /// Category that currently holds the item
    #[must_use]
    pub fn category_of(&self, item: &ItemId) -> Option<&ChecklistCategory> {
        self.checklist.iter().find(|c| c.item(item).is_some())
    }

    #[must_use]
    pub fn item(&self, id: &ItemId) -> Option<&ChecklistItem> {
        self.checklist.iter().find_map(|c| c.item(id))
    }

    #[must_use]
    pub fn item_count(&self) -> usize {
        self.checklist.iter().map(|c| c.items.len()).sum()
    }

    #[must_use]
    pub fn field(&self, field: Field) -> Option<String> {
        let opts = &self.options;
        match field {
            Field::PlanTitle => Some(self.title.clone()),
            Field::Description => Some(opts.description.clone()),
            Field::Visibility => Some(opts.visibility.to_string()),
            Field::Transport => Some(opts.transport.clone().unwrap_or_default()),
            Field::Accommodation => Some(opts.accommodation.clone().unwrap_or_default()),
            Field::PriceRange => Some(opts.price_range.clone().unwrap_or_default()),
            _ => None,
        }
    }

    /// Write an already-normalized value; empty optional fields become unset
    ///
    /// # Errors
    /// - [`ModelError::FieldNotApplicable`] for item and category fields
    /// - [`ModelError::InvalidValue`] for unparsable visibility
    pub fn set_field(&mut self, field: Field, value: String) -> Result<(), ModelError> {
        fn optional(value: String) -> Option<String> {
            (!value.is_empty()).then_some(value)
        }

        let opts = &mut self.options;
        match field {
            Field::PlanTitle => self.title = value,
            Field::Description => opts.description = value,
            Field::Visibility => opts.visibility = value.parse()?,
            Field::Transport => opts.transport = optional(value),
            Field::Accommodation => opts.accommodation = optional(value),
            Field::PriceRange => opts.price_range = optional(value),
            other => {
                return Err(ModelError::FieldNotApplicable {
                    field: other.as_str(),
                    entity: "plan".to_string(),
                })
            }
        }
        Ok(())
    }

    /// Bump `updated_at`
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
