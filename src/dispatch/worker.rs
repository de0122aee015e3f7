//! Worker loop: pull indexed queries, run the invoker, push indexed results.

use log::debug;

use crate::types::{IndexedQuery, IndexedResult};

use super::context::{Message, SharedState, WorkerContext};
use super::invoker::PipelineInvoker;

/// At most one recorded error per worker, returned from the worker when it stops.
pub type FailureSlot = Option<anyhow::Error>;

/// Sets the termination flag if the worker unwinds, so peers stop even on a panic.
struct TerminateOnPanic<'a>(&'a SharedState);

impl Drop for TerminateOnPanic<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.0.terminate();
        }
    }
}

/// Run one worker until it consumes a sentinel, observes termination, or fails.
///
/// The termination flag is checked only between queries: a query already dequeued is executed
/// to completion. On failure the error is returned (never retried) and all peers are told to
/// stop. Used both on spawned threads and inline on the dispatcher thread.
pub fn worker_loop<I>(
    id: usize,
    mut invoker: I,
    ctx: WorkerContext<'_, I::Corpus, I::Query, I::Output>,
) -> FailureSlot
where
    I: PipelineInvoker,
{
    let _guard = TerminateOnPanic(ctx.shared);
    let mut executed = 0_usize;
    loop {
        if ctx.shared.is_terminated() {
            debug!("worker {id}: termination observed after {executed} queries");
            return None;
        }
        let IndexedQuery { index, query } = match ctx.query_rx.recv() {
            Ok(Message::Query(q)) => q,
            Ok(Message::Sentinel) => {
                debug!("worker {id}: sentinel received after {executed} queries");
                return None;
            }
            // Every sender dropped: nothing more can arrive.
            Err(_) => return None,
        };
        match invoker.execute(&query, ctx.corpus) {
            Ok(result) => {
                let _ = ctx.result_tx.send(IndexedResult { index, result });
                if let Some(callback) = ctx.progress {
                    ctx.shared.report_progress(&query, callback);
                }
                invoker.reset();
                executed += 1;
            }
            Err(err) => {
                debug!("worker {id}: query {index} failed: {err:#}");
                ctx.shared.terminate();
                return Some(err);
            }
        }
    }
}
