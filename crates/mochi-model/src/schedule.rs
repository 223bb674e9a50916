//! Per-day itinerary

use crate::error::ModelError;
use serde::{Deserialize, Serialize};

/// One row of a day
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    #[serde(default)]
    pub time: String,
    pub activity: String,
    #[serde(default)]
    pub note: String,
}

impl ScheduleEntry {
    #[must_use]
    pub fn new(time: impl Into<String>, activity: impl Into<String>) -> Self {
        Self {
            time: time.into(),
            activity: activity.into(),
            note: String::new(),
        }
    }

    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleDay {
    pub day: u32,
    #[serde(default)]
    pub entries: Vec<ScheduleEntry>,
}

impl ScheduleDay {
    #[must_use]
    pub fn new(day: u32, entries: Vec<ScheduleEntry>) -> Self {
        Self { day, entries }
    }
}

/// Check a schedule before it is submitted
///
/// # Errors
/// [`ModelError::Empty`] with field `activity` when any entry has a blank
/// activity.
pub fn validate_schedule(days: &[ScheduleDay]) -> Result<(), ModelError> {
    let blank = days
        .iter()
        .flat_map(|d| d.entries.iter())
        .any(|e| e.activity.trim().is_empty());
    if blank {
        return Err(ModelError::Empty { field: "activity" });
    }
    Ok(())
}
