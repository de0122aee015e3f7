//! Dispatch context: channels and shared state handed to every worker for one dispatch call.

use crossbeam_channel::{Receiver, Sender, unbounded};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use crate::types::{IndexedQuery, IndexedResult};

/// Item on the input channel: an indexed query, or the stop marker (one per worker).
pub enum Message<Q> {
    Query(IndexedQuery<Q>),
    Sentinel,
}

/// Progress callback: `(query, total queries submitted so far)`. Must not fail.
pub type ProgressFn<'a, Q> = dyn Fn(&Q, u64) + Sync + 'a;

/// Counter and termination flag shared by the dispatcher and all workers of one call.
#[derive(Debug, Default)]
pub struct SharedState {
    submitted: AtomicU64,
    kill_switch: AtomicBool,
    /// Serializes progress callbacks so totals are observed in call order.
    progress_lock: Mutex<()>,
}

impl SharedState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one more submitted query. Returns the new total.
    pub fn record_submission(&self) -> u64 {
        self.submitted.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub fn submitted(&self) -> u64 {
        self.submitted.load(Ordering::Acquire)
    }

    /// Ask every worker to stop at its next iteration boundary. Idempotent.
    pub fn terminate(&self) {
        self.kill_switch.store(true, Ordering::Release);
    }

    pub fn is_terminated(&self) -> bool {
        self.kill_switch.load(Ordering::Acquire)
    }

    /// Invoke `callback` with `query` and the current submitted total.
    pub fn report_progress<Q>(&self, query: &Q, callback: &ProgressFn<'_, Q>) {
        let _guard = self
            .progress_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        callback(query, self.submitted());
    }
}

/// Input and output channels for one dispatch call.
/// Workers get clones of `query_rx` and `result_tx`; the dispatcher keeps `query_tx` and `result_rx`.
pub struct DispatchChannels<Q, R> {
    pub query_tx: Sender<Message<Q>>,
    pub query_rx: Receiver<Message<Q>>,
    pub result_tx: Sender<IndexedResult<R>>,
    pub result_rx: Receiver<IndexedResult<R>>,
}

/// Both channels are unbounded: seeding never blocks, so the dispatcher can always place the
/// sentinels even after workers stopped early.
pub fn create_dispatch_channels<Q, R>() -> DispatchChannels<Q, R> {
    let (query_tx, query_rx) = unbounded::<Message<Q>>();
    let (result_tx, result_rx) = unbounded::<IndexedResult<R>>();
    DispatchChannels {
        query_tx,
        query_rx,
        result_tx,
        result_rx,
    }
}

/// What a worker borrows for the duration of a dispatch call.
pub struct WorkerContext<'a, C: ?Sized, Q, R> {
    pub corpus: &'a C,
    pub query_rx: Receiver<Message<Q>>,
    pub result_tx: Sender<IndexedResult<R>>,
    pub shared: &'a SharedState,
    pub progress: Option<&'a ProgressFn<'a, Q>>,
}

impl<'a, C: ?Sized, Q, R> WorkerContext<'a, C, Q, R> {
    pub fn new(
        corpus: &'a C,
        channels: &DispatchChannels<Q, R>,
        shared: &'a SharedState,
        progress: Option<&'a ProgressFn<'a, Q>>,
    ) -> Self {
        Self {
            corpus,
            query_rx: channels.query_rx.clone(),
            result_tx: channels.result_tx.clone(),
            shared,
            progress,
        }
    }
}
