//! Numeric data model shared by every part of the loader.
//!
//! A [`Triple`] is a fully resolved subject–action–object fact. The store keeps
//! each triple twice: once on the segment owning the object item (reachable by
//! subject) and once on the segment owning the subject item (reachable by
//! object).

use serde::{Deserialize, Serialize};

/// Numeric identifier of a subject or object category.
pub type TypeId = u64;
/// Numeric identifier of a relation kind.
pub type ActionId = u64;
/// Numeric identifier of a subject or object instance.
pub type ItemId = u64;

/// Largest valid type id.
pub const MAX_TYPE: TypeId = 0x7FFF;
/// Largest valid action id.
pub const MAX_ACTION: ActionId = 0x7F;

/// Whether `t` is a usable type id (`0` is the "no type" sentinel).
pub fn is_valid_type(t: TypeId) -> bool {
    t > 0 && t <= MAX_TYPE
}

/// Whether `a` is a usable action id.
pub fn is_valid_action(a: ActionId) -> bool {
    a > 0 && a <= MAX_ACTION
}

/// Which side of a triple a symbol or receiver belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Subject,
    Object,
}

impl Role {
    /// The `class` query value the store expects.
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Subject => "subject",
            Role::Object => "object",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inclusive bounds on item ids, reported by the store at connection time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRange {
    pub min: ItemId,
    pub max: ItemId,
}

impl ItemRange {
    pub const FULL: ItemRange = ItemRange {
        min: 0,
        max: 0xFFFF_FFFF,
    };

    pub fn contains(&self, item: ItemId) -> bool {
        item >= self.min && item <= self.max
    }
}

impl Default for ItemRange {
    fn default() -> Self {
        Self::FULL
    }
}

/// A resolved subject–action–object triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Triple {
    pub subject_type: TypeId,
    pub subject_item: ItemId,
    pub action: ActionId,
    pub object_type: TypeId,
    pub object_item: ItemId,
}

impl Triple {
    pub fn new(
        subject_type: TypeId,
        subject_item: ItemId,
        action: ActionId,
        object_type: TypeId,
        object_item: ItemId,
    ) -> Self {
        Self {
            subject_type,
            subject_item,
            action,
            object_type,
            object_item,
        }
    }
}

impl std::fmt::Display for Triple {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "subject({},{}) -{}-> object({},{})",
            self.subject_type, self.subject_item, self.action, self.object_type, self.object_item
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_bounds() {
        assert!(!is_valid_type(0));
        assert!(is_valid_type(1));
        assert!(is_valid_type(0x7FFF));
        assert!(!is_valid_type(0x8000));
    }

    #[test]
    fn action_bounds() {
        assert!(!is_valid_action(0));
        assert!(is_valid_action(0x7F));
        assert!(!is_valid_action(0x80));
    }

    #[test]
    fn item_range_is_inclusive() {
        let range = ItemRange { min: 10, max: 20 };
        assert!(!range.contains(9));
        assert!(range.contains(10));
        assert!(range.contains(20));
        assert!(!range.contains(21));
    }

    #[test]
    fn default_range_is_32_bit() {
        let range = ItemRange::default();
        assert!(range.contains(0));
        assert!(range.contains(0xFFFF_FFFF));
        assert!(!range.contains(0x1_0000_0000));
    }

    #[test]
    fn role_wire_names() {
        assert_eq!(Role::Subject.to_string(), "subject");
        assert_eq!(Role::Object.as_str(), "object");
    }
}
