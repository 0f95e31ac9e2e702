//! Buffered write operations and the bulk document they are flushed as.
//!
//! Operations stay structured until flush time; [`Batch::render`] produces the
//! `load_data` body, a bracketed list of `triple(...)` terms.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::triple::{ItemId, Triple, TypeId};

/// A subject/object pair without an action, as used by deletes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Link {
    pub subject_type: TypeId,
    pub subject_item: ItemId,
    pub object_type: TypeId,
    pub object_item: ItemId,
}

/// One mirrored half of a triple write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    /// Subject-keyed record, stored on the object item's segment.
    AddSubject(Triple),
    /// Object-keyed record, stored on the subject item's segment.
    AddObject(Triple),
    /// Removes a subject-keyed record.
    DeleteSubject(Link),
    /// Removes an object-keyed record.
    DeleteObject(Link),
}

impl Operation {
    /// Both halves of an addition.
    pub fn add_pair(triple: Triple) -> [Operation; 2] {
        [Operation::AddSubject(triple), Operation::AddObject(triple)]
    }

    /// Both halves of a deletion.
    pub fn delete_pair(link: Link) -> [Operation; 2] {
        [Operation::DeleteSubject(link), Operation::DeleteObject(link)]
    }

    /// The item whose segment stores this record.
    pub fn owner(&self) -> ItemId {
        match self {
            Operation::AddSubject(t) => t.object_item,
            Operation::AddObject(t) => t.subject_item,
            Operation::DeleteSubject(l) => l.object_item,
            Operation::DeleteObject(l) => l.subject_item,
        }
    }

    pub fn is_delete(&self) -> bool {
        matches!(self, Operation::DeleteSubject(_) | Operation::DeleteObject(_))
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::AddSubject(t) => write!(
                f,
                "triple(subject({},{}),{},object({},{}))",
                t.subject_type, t.subject_item, t.action, t.object_type, t.object_item
            ),
            Operation::AddObject(t) => write!(
                f,
                "triple(object({},{}), {}, subject({},{}))",
                t.object_type, t.object_item, t.action, t.subject_type, t.subject_item
            ),
            Operation::DeleteSubject(l) => write!(
                f,
                "triple(subject({},{}),object({},{}))",
                l.subject_type, l.subject_item, l.object_type, l.object_item
            ),
            Operation::DeleteObject(l) => write!(
                f,
                "triple(object({},{}), subject({},{}))",
                l.object_type, l.object_item, l.subject_type, l.subject_item
            ),
        }
    }
}

/// Pending operations for one segment, in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Batch {
    ops: Vec<Operation>,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            ops: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, op: Operation) {
        self.ops.push(op);
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn operations(&self) -> &[Operation] {
        &self.ops
    }

    pub fn clear(&mut self) {
        self.ops.clear();
    }

    /// Serialize to the `load_data` wire body.
    pub fn render(&self) -> String {
        // Terms are at most ~80 bytes with 64-bit ids.
        let mut out = String::with_capacity(2 + self.ops.len() * 48);
        out.push('[');
        for (i, op) in self.ops.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            // Writing into a String cannot fail.
            let _ = write!(out, "{op}");
        }
        out.push(']');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Triple {
        Triple::new(1, 10, 5, 2, 20)
    }

    fn link() -> Link {
        Link {
            subject_type: 1,
            subject_item: 10,
            object_type: 2,
            object_item: 20,
        }
    }

    #[test]
    fn add_terms() {
        let [s, o] = Operation::add_pair(sample());
        assert_eq!(s.to_string(), "triple(subject(1,10),5,object(2,20))");
        assert_eq!(o.to_string(), "triple(object(2,20), 5, subject(1,10))");
    }

    #[test]
    fn delete_terms_have_no_action() {
        let [s, o] = Operation::delete_pair(link());
        assert_eq!(s.to_string(), "triple(subject(1,10),object(2,20))");
        assert_eq!(o.to_string(), "triple(object(2,20), subject(1,10))");
        assert!(s.is_delete() && o.is_delete());
    }

    #[test]
    fn owners_are_opposite_sides() {
        let [s, o] = Operation::add_pair(sample());
        assert_eq!(s.owner(), 20);
        assert_eq!(o.owner(), 10);

        let [ds, dobj] = Operation::delete_pair(link());
        assert_eq!(ds.owner(), 20);
        assert_eq!(dobj.owner(), 10);
    }

    #[test]
    fn empty_batch_renders_empty_list() {
        assert_eq!(Batch::new().render(), "[]");
    }

    #[test]
    fn batch_renders_in_arrival_order() {
        let mut batch = Batch::new();
        let [s, o] = Operation::add_pair(sample());
        batch.push(s);
        batch.push(o);
        assert_eq!(
            batch.render(),
            "[triple(subject(1,10),5,object(2,20)),triple(object(2,20), 5, subject(1,10))]"
        );
        batch.clear();
        assert!(batch.is_empty());
    }
}
