//! Stable identifiers
//!
//! Ids are opaque strings so that authority-assigned ids (numeric on the
//! server side) and locally generated ones share one type. Two prefixes carry
//! meaning:
//!
//! - [`GUEST_PREFIX`]: client-only entity, never sent to the authority
//! - [`PROVISIONAL_PREFIX`]: created optimistically, waiting for an assigned id

use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

/// Sentinel prefix of guest (client-only) ids
pub const GUEST_PREFIX: &str = "guest_";

/// Prefix of ids created by a pending add
pub const PROVISIONAL_PREFIX: &str = "tmp_";

fn fresh(prefix: &str) -> String {
    format!("{prefix}{}", Ulid::new().to_string().to_lowercase())
}

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap an existing id
            #[inline]
            pub fn new(raw: impl Into<String>) -> Self {
                Self(raw.into())
            }

            /// Generate a fresh local id
            #[inline]
            #[must_use]
            pub fn generate() -> Self {
                Self(fresh($prefix))
            }

            /// Generate a guest id
            #[inline]
            #[must_use]
            pub fn guest() -> Self {
                Self(fresh(GUEST_PREFIX))
            }

            /// Generate a provisional id for a pending add
            #[inline]
            #[must_use]
            pub fn provisional() -> Self {
                Self(fresh(PROVISIONAL_PREFIX))
            }

            #[inline]
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Guest ids never reach the authority
            #[inline]
            #[must_use]
            pub fn is_guest(&self) -> bool {
                self.0.starts_with(GUEST_PREFIX)
            }

            /// Created by an add that has not been confirmed yet
            #[inline]
            #[must_use]
            pub fn is_provisional(&self) -> bool {
                self.0.starts_with(PROVISIONAL_PREFIX)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(raw: &str) -> Self {
                Self::new(raw)
            }
        }

        impl From<String> for $name {
            fn from(raw: String) -> Self {
                Self(raw)
            }
        }
    };
}

string_id!(
    /// Plan identifier
    PlanId,
    "p_"
);
string_id!(
    /// Checklist category identifier
    CategoryId,
    "cat_"
);
string_id!(
    /// Checklist item identifier
    ItemId,
    "i_"
);

/// Token identifying one request/response round-trip (ULID for sortability)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RequestToken(pub Ulid);

impl RequestToken {
    /// Generate new token
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for RequestToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reference to any addressable entity in the store
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum EntityRef {
    Plan(PlanId),
    Category(CategoryId),
    Item(ItemId),
}

impl EntityRef {
    /// Whether the referenced entity only exists client-side
    #[must_use]
    pub fn is_guest(&self) -> bool {
        match self {
            Self::Plan(id) => id.is_guest(),
            Self::Category(id) => id.is_guest(),
            Self::Item(id) => id.is_guest(),
        }
    }

    /// Whether the referenced entity is waiting for an assigned id
    #[must_use]
    pub fn is_provisional(&self) -> bool {
        match self {
            Self::Plan(id) => id.is_provisional(),
            Self::Category(id) => id.is_provisional(),
            Self::Item(id) => id.is_provisional(),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Plan(id) => id.as_str(),
            Self::Category(id) => id.as_str(),
            Self::Item(id) => id.as_str(),
        }
    }

    /// Short kind label for logs and errors
    #[must_use]
    pub fn kind_label(&self) -> &'static str {
        match self {
            Self::Plan(_) => "plan",
            Self::Category(_) => "category",
            Self::Item(_) => "item",
        }
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind_label(), self.as_str())
    }
}

impl From<PlanId> for EntityRef {
    fn from(id: PlanId) -> Self {
        Self::Plan(id)
    }
}

impl From<CategoryId> for EntityRef {
    fn from(id: CategoryId) -> Self {
        Self::Category(id)
    }
}

impl From<ItemId> for EntityRef {
    fn from(id: ItemId) -> Self {
        Self::Item(id)
    }
}
