//! GPU timing bookkeeping shared by both backends.
//!
//! Readbacks complete asynchronously, several frames after submission. The
//! types here make sure a frame never waits for one, that a result is only
//! accepted by the readback it belongs to, and that every accepted result
//! gets a fresh sequence number.

use std::collections::VecDeque;

use crate::domain::benchmark::GpuReading;
use crate::domain::errors::{BenchError, BenchResult};

/// Identifies one in-flight readback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadbackToken {
    generation: u64,
    id: u64,
}

/// At most one outstanding timestamp readback.
#[derive(Debug, Default)]
pub struct ReadbackSlot {
    generation: u64,
    next_id: u64,
    pending: Option<ReadbackToken>,
    sequence: u64,
    latest: Option<GpuReading>,
    disposed: bool,
}

impl ReadbackSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the slot for a new readback; `None` while one is outstanding.
    pub fn start(&mut self) -> Option<ReadbackToken> {
        if self.disposed || self.pending.is_some() {
            return None;
        }
        self.next_id += 1;
        let token = ReadbackToken { generation: self.generation, id: self.next_id };
        self.pending = Some(token);
        Some(token)
    }

    /// Settle the readback identified by `token`. `millis == None` means
    /// the readback failed; the slot is freed and the last reading kept.
    pub fn complete(&mut self, token: ReadbackToken, millis: Option<f64>) -> BenchResult<Option<GpuReading>> {
        if self.disposed || self.pending != Some(token) {
            return Err(BenchError::StaleAsyncResult);
        }
        self.pending = None;
        if let Some(millis) = millis.filter(|ms| ms.is_finite() && *ms >= 0.0) {
            self.sequence += 1;
            self.latest = Some(GpuReading { sequence: self.sequence, millis });
        }
        Ok(self.latest)
    }

    pub fn latest(&self) -> Option<GpuReading> {
        self.latest
    }

    /// Invalidate everything in flight. Idempotent.
    pub fn dispose(&mut self) {
        self.disposed = true;
        self.pending = None;
        self.generation += 1;
    }
}

/// Raw two-timestamp pair into milliseconds. Wrapped or reset counters
/// yield `None`.
pub fn timestamps_to_millis(begin: u64, end: u64, period_ns: f32) -> Option<f64> {
    if end <= begin || !(period_ns > 0.0) {
        return None;
    }
    Some((end - begin) as f64 * period_ns as f64 / 1_000_000.0)
}

/// Minimal timer-query surface (`EXT_disjoint_timer_query_webgl2`).
pub trait TimerQueryApi {
    type Query;
    fn create(&mut self) -> Option<Self::Query>;
    fn begin(&mut self, query: &Self::Query);
    fn end(&mut self);
    fn is_available(&mut self, query: &Self::Query) -> bool;
    /// Whether the GPU reported a disjoint event since the last check.
    fn is_disjoint(&mut self) -> bool;
    fn elapsed_ns(&mut self, query: &Self::Query) -> f64;
    fn delete(&mut self, query: Self::Query);
}

/// FIFO of elapsed-time queries, drained without blocking.
pub struct TimerQueryQueue<Q> {
    open: Option<Q>,
    pending: VecDeque<Q>,
    max_pending: usize,
    sequence: u64,
    latest: Option<GpuReading>,
}

impl<Q> TimerQueryQueue<Q> {
    pub fn new(max_pending: usize) -> Self {
        Self {
            open: None,
            pending: VecDeque::new(),
            max_pending: max_pending.max(1),
            sequence: 0,
            latest: None,
        }
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Open a query around this frame's draws unless the queue is full.
    pub fn begin_frame<A: TimerQueryApi<Query = Q>>(&mut self, api: &mut A) -> bool {
        if self.open.is_some() || self.pending.len() >= self.max_pending {
            return false;
        }
        let Some(query) = api.create() else {
            return false;
        };
        api.begin(&query);
        self.open = Some(query);
        true
    }

    pub fn end_frame<A: TimerQueryApi<Query = Q>>(&mut self, api: &mut A) {
        if let Some(query) = self.open.take() {
            api.end();
            self.pending.push_back(query);
        }
    }

    /// Collect every finished query in submission order. Results from a
    /// disjoint period are dropped.
    pub fn poll<A: TimerQueryApi<Query = Q>>(&mut self, api: &mut A) -> Option<GpuReading> {
        let disjoint = api.is_disjoint();
        while self.pending.front().is_some_and(|query| api.is_available(query)) {
            let Some(query) = self.pending.pop_front() else {
                break;
            };
            if !disjoint {
                let millis = api.elapsed_ns(&query) / 1_000_000.0;
                self.sequence += 1;
                self.latest = Some(GpuReading { sequence: self.sequence, millis });
            }
            api.delete(query);
        }
        self.latest
    }

    pub fn latest(&self) -> Option<GpuReading> {
        self.latest
    }

    /// Delete every query still owned by the queue.
    pub fn clear<A: TimerQueryApi<Query = Q>>(&mut self, api: &mut A) {
        if let Some(query) = self.open.take() {
            api.end();
            api.delete(query);
        }
        for query in self.pending.drain(..) {
            api.delete(query);
        }
    }
}
