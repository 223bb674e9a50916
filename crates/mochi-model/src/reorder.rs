//! Drag ordering rule
//!
//! A move is expressed relative to another element, never as an index, so
//! every input modality (drag, keyboard, button) reduces to the same call.

use crate::error::ModelError;
use std::fmt::Display;

/// Where the dragged element ended up relative to the target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Dragged preceded target: now immediately after it
    After,
    /// Dragged followed target: now immediately before it
    Before,
}

/// Move `dragged` next to `target`
///
/// If the dragged element's current position precedes the target's, it is
/// inserted immediately after the target; otherwise immediately before it.
/// Every other element keeps its relative order.
///
/// # Errors
/// - [`ModelError::NotInSequence`] if either key is missing
/// - [`ModelError::SelfMove`] if both keys are equal
pub fn move_relative<T, K, F>(
    items: &mut Vec<T>,
    dragged: &K,
    target: &K,
    key: F,
) -> Result<Placement, ModelError>
where
    K: PartialEq + Display,
    F: Fn(&T) -> &K,
{
    let from = items
        .iter()
        .position(|item| key(item) == dragged)
        .ok_or_else(|| ModelError::NotInSequence(dragged.to_string()))?;
    let to = items
        .iter()
        .position(|item| key(item) == target)
        .ok_or_else(|| ModelError::NotInSequence(target.to_string()))?;

    if from == to {
        return Err(ModelError::SelfMove);
    }

    // Removing `dragged` shifts the target left by one when it came later, so
    // inserting at `to` lands after the target in that case and before it
    // otherwise.
    let element = items.remove(from);
    items.insert(to, element);

    Ok(if from < to {
        Placement::After
    } else {
        Placement::Before
    })
}
