//! Symbolic inputs accepted by [`Engine::apply`](crate::engine::Engine::apply).
//!
//! Callers name things however is convenient: a [`Symbol`] is either a label
//! the store will translate to an id, or an id that is used as-is.

use serde::{Deserialize, Serialize};

/// A name to resolve, or a number that needs no resolution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Symbol {
    Id(u64),
    Name(String),
}

impl Symbol {
    /// The numeric value if this symbol needs no lookup.
    pub fn as_id(&self) -> Option<u64> {
        match self {
            Symbol::Id(id) => Some(*id),
            Symbol::Name(_) => None,
        }
    }

    /// Empty names resolve to the `0` sentinel without a lookup.
    pub fn is_blank(&self) -> bool {
        matches!(self, Symbol::Name(name) if name.is_empty())
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Symbol::Id(id) => write!(f, "{id}"),
            Symbol::Name(name) => f.write_str(name),
        }
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Symbol::Name(s.to_string())
    }
}

impl From<String> for Symbol {
    fn from(s: String) -> Self {
        Symbol::Name(s)
    }
}

impl From<u64> for Symbol {
    fn from(id: u64) -> Self {
        Symbol::Id(id)
    }
}

impl From<u32> for Symbol {
    fn from(id: u32) -> Self {
        Symbol::Id(u64::from(id))
    }
}

/// A triple as the caller describes it. Absent fields make `apply` a no-op.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolicTriple {
    pub subject_type: Option<Symbol>,
    pub subject_item: Option<Symbol>,
    pub action: Option<Symbol>,
    pub object_type: Option<Symbol>,
    pub object_item: Option<Symbol>,
}

impl SymbolicTriple {
    /// Build a triple with every field present.
    pub fn new(
        subject_type: impl Into<Symbol>,
        subject_item: impl Into<Symbol>,
        action: impl Into<Symbol>,
        object_type: impl Into<Symbol>,
        object_item: impl Into<Symbol>,
    ) -> Self {
        Self {
            subject_type: Some(subject_type.into()),
            subject_item: Some(subject_item.into()),
            action: Some(action.into()),
            object_type: Some(object_type.into()),
            object_item: Some(object_item.into()),
        }
    }

    /// True when all five fields were supplied.
    pub fn is_complete(&self) -> bool {
        self.subject_type.is_some()
            && self.subject_item.is_some()
            && self.action.is_some()
            && self.object_type.is_some()
            && self.object_item.is_some()
    }
}
