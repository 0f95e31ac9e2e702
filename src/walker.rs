//! Convergent deletion against the store.
//!
//! The store cannot delete everything hanging off a subject in one call, so
//! the walker asks for matches, buffers delete pairs for them, flushes, and
//! asks again until a query comes back empty. Removing matches changes what
//! the next page holds, so this is a loop to a fixed point rather than
//! offset-based paging. Termination relies on the store actually shrinking the
//! match set after each round.

use crate::error::{DeleteError, LoaderResult};
use crate::op::{Link, Operation};
use crate::remote::{Endpoint, ReceiversQuery, ReceiversReply, StoreApi};
use crate::segment::SegmentSet;
use crate::triple::{ItemId, TypeId};

/// What a deletion run did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteSummary {
    /// Subjects whose triples were walked.
    pub subjects: u64,
    /// Delete pairs buffered (one per removed triple).
    pub pairs: u64,
    /// Receivers queries issued, including the final empty one.
    pub queries: u64,
}

impl DeleteSummary {
    fn absorb(&mut self, other: DeleteSummary) {
        self.subjects += other.subjects;
        self.pairs += other.pairs;
        self.queries += other.queries;
    }
}

/// Drives query/delete/re-query loops over one session's segments.
pub struct DeletionWalker<'a> {
    store: &'a dyn StoreApi,
    server: &'a Endpoint,
    segments: &'a SegmentSet,
}

impl<'a> DeletionWalker<'a> {
    pub fn new(store: &'a dyn StoreApi, server: &'a Endpoint, segments: &'a SegmentSet) -> Self {
        Self {
            store,
            server,
            segments,
        }
    }

    fn query(&self, query: ReceiversQuery, body: &str) -> LoaderResult<ReceiversReply> {
        let reply = self.store.receivers(self.server, query, body)?;
        if !reply.is_ok() {
            return Err(DeleteError::StoreUnavailable {
                status: reply.status,
            }
            .into());
        }
        Ok(reply)
    }

    /// Delete every triple of every subject selected by `expr`.
    pub fn delete_expression(&self, expr: &str) -> LoaderResult<DeleteSummary> {
        let mut summary = DeleteSummary::default();
        loop {
            let reply = self.query(ReceiversQuery::Subjects, expr)?;
            summary.queries += 1;

            let Some(first) = reply.receivers.first() else {
                break;
            };
            if first.class != "subject" {
                return Err(DeleteError::NotSubjects {
                    class: first.class.clone(),
                }
                .into());
            }

            tracing::debug!(expr, subjects = reply.receivers.len(), "deleting subject page");
            for subject in &reply.receivers {
                summary.absorb(self.delete_subject(subject.type_id, subject.item)?);
            }
        }
        tracing::info!(
            expr,
            subjects = summary.subjects,
            triples = summary.pairs,
            "expression deleted"
        );
        Ok(summary)
    }

    /// Delete every triple whose subject is `subject(type_id, item)`.
    pub fn delete_subject(&self, type_id: TypeId, item: ItemId) -> LoaderResult<DeleteSummary> {
        let term = format!("subject({type_id},{item})");
        let mut summary = DeleteSummary {
            subjects: 1,
            ..Default::default()
        };
        loop {
            let reply = self.query(ReceiversQuery::Objects, &term)?;
            summary.queries += 1;
            if reply.receivers.is_empty() {
                break;
            }

            for object in &reply.receivers {
                let link = Link {
                    subject_type: type_id,
                    subject_item: item,
                    object_type: object.type_id,
                    object_item: object.item,
                };
                self.segments
                    .record_pair(self.store, Operation::delete_pair(link))?;
                summary.pairs += 1;
            }
            self.segments.flush_all(self.store)?;
        }
        tracing::debug!(%term, triples = summary.pairs, "subject deleted");
        Ok(summary)
    }
}
