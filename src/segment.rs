//! Per-segment write buffers.
//!
//! A [`SegmentBuffer`] accumulates operations for one segment and ships them as
//! a single `load_data` document once `range` operations are pending, or when
//! flushed explicitly. A failed flush blocks and resends the identical batch at
//! a fixed interval until the segment accepts it; the batch is never dropped or
//! reordered. With a [`RetryPolicy::deadline`] the caller gets control back
//! instead, with the batch still pending.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::error::SegmentError;
use crate::op::{Batch, Operation};
use crate::remote::{Endpoint, StoreApi};
use crate::router::Router;

/// Default number of operations buffered before an automatic flush.
pub const DEFAULT_RANGE: usize = 10_000;

/// How a failed flush is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Pause between attempts.
    pub interval: Duration,
    /// Give up after this long. `None` retries forever.
    pub deadline: Option<Duration>,
}

impl RetryPolicy {
    /// Retry forever at `interval`.
    pub fn indefinite(interval: Duration) -> Self {
        Self {
            interval,
            deadline: None,
        }
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::indefinite(Duration::from_millis(500))
    }
}

/// Buffered writer for one segment.
///
/// `record` and `flush` serialize on the buffer's own lock; different
/// segments never contend.
#[derive(Debug)]
pub struct SegmentBuffer {
    endpoint: Endpoint,
    range: usize,
    retry: RetryPolicy,
    pending: Mutex<Batch>,
}

impl SegmentBuffer {
    pub fn new(endpoint: Endpoint, range: usize, retry: RetryPolicy) -> Self {
        let range = range.max(1);
        Self {
            endpoint,
            range,
            retry,
            pending: Mutex::new(Batch::with_capacity(range.min(DEFAULT_RANGE))),
        }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn range(&self) -> usize {
        self.range
    }

    // The batch is only mutated by whole pushes and clears, so a poisoned lock
    // still guards a consistent batch.
    fn lock(&self) -> MutexGuard<'_, Batch> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of operations waiting to be flushed.
    pub fn pending(&self) -> usize {
        self.lock().len()
    }

    /// Copy of the pending operations, oldest first.
    pub fn pending_operations(&self) -> Vec<Operation> {
        self.lock().operations().to_vec()
    }

    /// Buffer `op`, flushing if the buffer is now full.
    pub fn record(&self, store: &dyn StoreApi, op: Operation) -> Result<(), SegmentError> {
        let mut batch = self.lock();
        batch.push(op);
        if batch.len() >= self.range {
            self.flush_locked(store, &mut batch)?;
        }
        Ok(())
    }

    /// Buffer `op` without flushing. Returns whether the buffer is now full.
    pub fn push(&self, op: Operation) -> bool {
        let mut batch = self.lock();
        batch.push(op);
        batch.len() >= self.range
    }

    /// Flush if at least `range` operations are pending.
    pub fn flush_if_full(&self, store: &dyn StoreApi) -> Result<(), SegmentError> {
        let mut batch = self.lock();
        if batch.len() >= self.range {
            self.flush_locked(store, &mut batch)?;
        }
        Ok(())
    }

    /// Ship everything pending. Blocks until the segment accepts the batch.
    pub fn flush(&self, store: &dyn StoreApi) -> Result<(), SegmentError> {
        let mut batch = self.lock();
        self.flush_locked(store, &mut batch)
    }

    fn flush_locked(&self, store: &dyn StoreApi, batch: &mut Batch) -> Result<(), SegmentError> {
        if batch.is_empty() {
            return Ok(());
        }

        let body = batch.render();
        let started = Instant::now();
        let mut attempts: u32 = 0;

        loop {
            attempts += 1;
            match store.load_data(&self.endpoint, &body) {
                Ok(reply) if reply.is_ok() => break,
                Ok(reply) => tracing::warn!(
                    segment = %self.endpoint,
                    status = reply.status,
                    attempts,
                    "error flushing data to segment"
                ),
                Err(e) => tracing::warn!(
                    segment = %self.endpoint,
                    error = %e,
                    attempts,
                    "error flushing data to segment"
                ),
            }

            if let Some(deadline) = self.retry.deadline {
                if started.elapsed() + self.retry.interval > deadline {
                    return Err(SegmentError::DeadlineExceeded {
                        host: self.endpoint.host.clone(),
                        port: self.endpoint.port,
                        waited_ms: started.elapsed().as_millis(),
                        attempts,
                        pending: batch.len(),
                    });
                }
            }
            std::thread::sleep(self.retry.interval);
        }

        tracing::debug!(
            segment = %self.endpoint,
            operations = batch.len(),
            attempts,
            "flushed batch"
        );
        batch.clear();
        Ok(())
    }
}

/// The buffers of one session, addressed through its [`Router`].
#[derive(Debug)]
pub struct SegmentSet {
    buffers: Vec<SegmentBuffer>,
    router: Router,
}

impl SegmentSet {
    /// One buffer per endpoint, in segment order. `None` without endpoints.
    pub fn new(endpoints: Vec<Endpoint>, range: usize, retry: RetryPolicy) -> Option<Self> {
        let router = Router::new(endpoints.len())?;
        let buffers = endpoints
            .into_iter()
            .map(|ep| SegmentBuffer::new(ep, range, retry))
            .collect();
        Some(Self { buffers, router })
    }

    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    pub fn router(&self) -> Router {
        self.router
    }

    pub fn get(&self, segment: usize) -> Option<&SegmentBuffer> {
        self.buffers.get(segment)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SegmentBuffer> {
        self.buffers.iter()
    }

    /// Buffer `op` on the segment owning its record.
    pub fn record(&self, store: &dyn StoreApi, op: Operation) -> Result<(), SegmentError> {
        self.buffers[self.router.route(op.owner())].record(store, op)
    }

    /// Buffer both halves of a mirrored write, then flush any segment that
    /// filled up.
    ///
    /// Both halves are buffered before any flush runs, so a failed flush never
    /// leaves one half behind. On error the pair is still pending and goes out
    /// with the next flush; re-recording it would send it twice.
    pub fn record_pair(
        &self,
        store: &dyn StoreApi,
        pair: [Operation; 2],
    ) -> Result<(), SegmentError> {
        let targets = pair.map(|op| self.router.route(op.owner()));
        let mut full = [false; 2];
        for (i, op) in pair.into_iter().enumerate() {
            full[i] = self.buffers[targets[i]].push(op);
        }

        // One flush per segment, even when both halves share it.
        if targets[0] == targets[1] {
            full = [full[0] || full[1], false];
        }
        let mut first_error = None;
        for (segment, _) in targets.into_iter().zip(full).filter(|(_, f)| *f) {
            if let Err(e) = self.buffers[segment].flush_if_full(store) {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Flush every segment in order.
    pub fn flush_all(&self, store: &dyn StoreApi) -> Result<(), SegmentError> {
        for buffer in &self.buffers {
            buffer.flush(store)?;
        }
        Ok(())
    }

    /// Operations pending across all segments.
    pub fn pending(&self) -> usize {
        self.buffers.iter().map(SegmentBuffer::pending).sum()
    }
}
