use anyhow::{Context, Result};
use crossbeam_channel::{Receiver, Sender};
use log::debug;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::thread::{self, ScopedJoinHandle};

use crate::errors::DispatchError;
use crate::types::{IndexedQuery, IndexedResult};
use crate::utils::config::{PackagePaths, WorkerLimits};

use super::context::{
    DispatchChannels, Message, ProgressFn, SharedState, WorkerContext, create_dispatch_channels,
};
use super::error_handler::check_for_first_failure;
use super::invoker::PipelineInvoker;
use super::worker::{FailureSlot, worker_loop};

/// Results of one dispatch call, in query submission order.
pub struct OrderedResults<R> {
    inner: std::vec::IntoIter<R>,
}

impl<R> Iterator for OrderedResults<R> {
    type Item = R;

    fn next(&mut self) -> Option<R> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<R> ExactSizeIterator for OrderedResults<R> {}

/// Resolve requested parallelism: 0 means every available hardware thread.
pub fn resolve_workers(parallelism: usize) -> usize {
    match parallelism {
        0 => WorkerLimits::current().all_threads.max(1),
        n => n,
    }
}

/// Run every query through its own invoker call and return results in submission order.
///
/// `make_invoker(worker_id)` is called once per worker before any work starts; invokers are
/// never shared. With one resolved worker the loop runs inline on the calling thread.
/// Workers stop on the first failure; that error (first by worker start order) is returned
/// once every worker has stopped, and no results are returned with it. Queries still queued
/// at that point are dropped without being reported.
pub fn dispatch<I, F>(
    queries: impl IntoIterator<Item = I::Query>,
    corpus: &I::Corpus,
    parallelism: usize,
    progress: Option<&ProgressFn<'_, I::Query>>,
    mut make_invoker: F,
) -> Result<OrderedResults<I::Output>>
where
    I: PipelineInvoker + Send,
    I::Query: Send,
    I::Output: Send,
    F: FnMut(usize) -> Result<I>,
{
    let num_workers = resolve_workers(parallelism);
    let invokers = (0..num_workers)
        .map(&mut make_invoker)
        .collect::<Result<Vec<I>>>()?;
    let channels = create_dispatch_channels::<I::Query, I::Output>();
    let shared = SharedState::new();

    let (submitted, failures) = if num_workers == 1 {
        debug!("Dispatching on the calling thread");
        dispatch_inline(queries, corpus, progress, invokers, &channels, &shared)
    } else {
        debug!("Dispatching across {} worker threads", num_workers);
        dispatch_threaded(queries, corpus, progress, invokers, &channels, &shared)?
    };

    check_for_first_failure(failures)?;
    debug!("Dispatched {} queries", submitted);
    Ok(collect_ordered(&channels.result_rx, submitted))
}

/// Single worker: seed everything, then run the worker loop to completion on this thread.
/// A panic in the invoker is caught and reported like a panicked worker thread.
fn dispatch_inline<I>(
    queries: impl IntoIterator<Item = I::Query>,
    corpus: &I::Corpus,
    progress: Option<&ProgressFn<'_, I::Query>>,
    invokers: Vec<I>,
    channels: &DispatchChannels<I::Query, I::Output>,
    shared: &SharedState,
) -> (u64, Vec<FailureSlot>)
where
    I: PipelineInvoker,
{
    let submitted = seed_queries(queries, &channels.query_tx, shared);
    send_sentinels(&channels.query_tx, invokers.len());
    let failures = invokers
        .into_iter()
        .enumerate()
        .map(|(id, invoker)| {
            let ctx = WorkerContext::new(corpus, channels, shared, progress);
            // Same panic mapping as `join_workers` on the threaded path.
            catch_unwind(AssertUnwindSafe(|| worker_loop(id, invoker, ctx)))
                .unwrap_or_else(|_| Some(DispatchError::WorkerPanicked { id }.into()))
        })
        .collect();
    (submitted, failures)
}

/// Several workers on scoped threads: start them, seed, place sentinels, join all.
fn dispatch_threaded<I>(
    queries: impl IntoIterator<Item = I::Query>,
    corpus: &I::Corpus,
    progress: Option<&ProgressFn<'_, I::Query>>,
    invokers: Vec<I>,
    channels: &DispatchChannels<I::Query, I::Output>,
    shared: &SharedState,
) -> Result<(u64, Vec<FailureSlot>)>
where
    I: PipelineInvoker + Send,
    I::Query: Send,
    I::Output: Send,
{
    let pkg = PackagePaths::get().pkg_name();
    thread::scope(|s| -> Result<(u64, Vec<FailureSlot>)> {
        let mut handles: Vec<ScopedJoinHandle<'_, FailureSlot>> =
            Vec::with_capacity(invokers.len());
        for (id, invoker) in invokers.into_iter().enumerate() {
            let ctx = WorkerContext::new(corpus, channels, shared, progress);
            let spawned = thread::Builder::new()
                .name(format!("{pkg}-worker-{id}"))
                .spawn_scoped(s, move || worker_loop(id, invoker, ctx));
            match spawned {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    // Release the workers already running before reporting.
                    shared.terminate();
                    send_sentinels(&channels.query_tx, handles.len());
                    let _ = join_workers(handles);
                    return Err(e).context("spawn dispatch worker");
                }
            }
        }

        let submitted = seed_queries(queries, &channels.query_tx, shared);
        send_sentinels(&channels.query_tx, handles.len());
        Ok((submitted, join_workers(handles)))
    })
}

/// Enqueue queries with increasing indices from 0, counting each before it is sent.
/// Stops early once a worker has signaled termination. Returns how many were submitted.
fn seed_queries<T>(
    queries: impl IntoIterator<Item = T>,
    query_tx: &Sender<Message<T>>,
    shared: &SharedState,
) -> u64 {
    let mut index = 0_u64;
    for query in queries {
        if shared.is_terminated() {
            debug!("Termination signaled; stopped seeding after {} queries", index);
            break;
        }
        shared.record_submission();
        if query_tx
            .send(Message::Query(IndexedQuery { index, query }))
            .is_err()
        {
            break;
        }
        index += 1;
    }
    index
}

/// One sentinel per started worker.
fn send_sentinels<T>(query_tx: &Sender<Message<T>>, count: usize) {
    for _ in 0..count {
        let _ = query_tx.send(Message::Sentinel);
    }
}

/// Join every worker in start order. A panicked worker fills its slot with an error.
fn join_workers(handles: Vec<ScopedJoinHandle<'_, FailureSlot>>) -> Vec<FailureSlot> {
    handles
        .into_iter()
        .enumerate()
        .map(|(id, h)| {
            h.join()
                .unwrap_or_else(|_| Some(DispatchError::WorkerPanicked { id }.into()))
        })
        .collect()
}

/// Drain the output channel into a table indexed by submission position.
/// Only called after all workers stopped, so the drain never blocks.
fn collect_ordered<R>(result_rx: &Receiver<IndexedResult<R>>, submitted: u64) -> OrderedResults<R> {
    let mut slots: Vec<Option<R>> = std::iter::repeat_with(|| None)
        .take(submitted as usize)
        .collect();
    for IndexedResult { index, result } in result_rx.try_iter() {
        if let Some(slot) = slots.get_mut(index as usize) {
            debug_assert!(slot.is_none(), "query {index} produced two results");
            *slot = Some(result);
        }
    }
    OrderedResults {
        inner: slots.into_iter().flatten().collect::<Vec<_>>().into_iter(),
    }
}
