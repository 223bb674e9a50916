//! Error types for model values

/// Errors raised while building or editing model values
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// A required text field was empty after trimming
    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    /// A value could not be parsed for the given field
    #[error("invalid value for {field}: '{value}'")]
    InvalidValue { field: &'static str, value: String },

    /// The field does not exist on the addressed entity
    #[error("field {field} does not apply to {entity}")]
    FieldNotApplicable { field: &'static str, entity: String },

    /// An id referenced by a move is not in the sequence
    #[error("{0} is not part of the sequence")]
    NotInSequence(String),

    /// Dragged and target are the same item
    #[error("cannot move an item relative to itself")]
    SelfMove,
}

impl ModelError {
    /// Name of the offending field, used by the sync layer's validation errors
    #[must_use]
    pub fn field(&self) -> &'static str {
        match self {
            Self::Empty { field }
            | Self::InvalidValue { field, .. }
            | Self::FieldNotApplicable { field, .. } => field,
            Self::NotInSequence(_) | Self::SelfMove => "target",
        }
    }
}
