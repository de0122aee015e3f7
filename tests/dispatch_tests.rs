use anyhow::Result;
use profsearch::DispatchError;
use profsearch::dispatch::{PipelineInvoker, ProgressFn, dispatch};
use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread::{self, ThreadId};
use std::time::Duration;

const N: u64 = 40;

/// Adds the corpus offset to each query; earlier queries sleep longer so completion order
/// differs from submission order.
struct Offset {
    sleep: bool,
}

impl PipelineInvoker for Offset {
    type Corpus = [u64];
    type Query = u64;
    type Output = u64;

    fn execute(&mut self, query: &u64, corpus: &[u64]) -> Result<u64> {
        if self.sleep {
            thread::sleep(Duration::from_millis((N - query) % 7));
        }
        Ok(query * 10 + corpus[0])
    }

    fn reset(&mut self) {}
}

#[derive(Debug, thiserror::Error)]
#[error("query {0} exploded")]
struct Boom(u64);

/// Fails on one query; counts every execute call.
struct FailAt<'a> {
    fail_at: u64,
    executed: &'a AtomicUsize,
}

impl PipelineInvoker for FailAt<'_> {
    type Corpus = [u64];
    type Query = u64;
    type Output = u64;

    fn execute(&mut self, query: &u64, _corpus: &[u64]) -> Result<u64> {
        self.executed.fetch_add(1, Ordering::SeqCst);
        if *query == self.fail_at {
            return Err(Boom(*query).into());
        }
        thread::sleep(Duration::from_millis(1));
        Ok(*query)
    }

    fn reset(&mut self) {}
}

/// Records the thread of its first call and fails if it is ever used from another.
struct Pinned {
    owner: Option<ThreadId>,
}

impl PipelineInvoker for Pinned {
    type Corpus = [u64];
    type Query = u64;
    type Output = ThreadId;

    fn execute(&mut self, _query: &u64, _corpus: &[u64]) -> Result<ThreadId> {
        let me = thread::current().id();
        let owner = *self.owner.get_or_insert(me);
        anyhow::ensure!(owner == me, "invoker moved between threads");
        thread::sleep(Duration::from_millis(1));
        Ok(me)
    }

    fn reset(&mut self) {}
}

struct Panics;

impl PipelineInvoker for Panics {
    type Corpus = [u64];
    type Query = u64;
    type Output = u64;

    fn execute(&mut self, query: &u64, _corpus: &[u64]) -> Result<u64> {
        if *query == 3 {
            panic!("invoker blew up on {query}");
        }
        Ok(*query)
    }

    fn reset(&mut self) {}
}

fn run_offset(parallelism: usize, sleep: bool) -> Vec<u64> {
    dispatch(0..N, &[7_u64][..], parallelism, None, |_| Ok(Offset { sleep }))
        .unwrap()
        .collect()
}

// --- ordering and completeness ---

#[test]
fn test_results_in_submission_order_for_any_parallelism() {
    let expected: Vec<u64> = (0..N).map(|q| q * 10 + 7).collect();
    for parallelism in [1, 2, 4, 0] {
        assert_eq!(
            run_offset(parallelism, true),
            expected,
            "parallelism {parallelism}"
        );
    }
}

#[test]
fn test_single_and_multi_worker_agree() {
    assert_eq!(run_offset(1, false), run_offset(4, true));
}

#[test]
fn test_exact_size_result_iterator() {
    let results = dispatch(0..N, &[0_u64][..], 3, None, |_| Ok(Offset { sleep: false })).unwrap();
    assert_eq!(results.len(), N as usize);
}

#[test]
fn test_empty_input_yields_no_results_and_no_progress() {
    let calls = AtomicUsize::new(0);
    let cb = |_: &u64, _: u64| {
        calls.fetch_add(1, Ordering::SeqCst);
    };
    let progress: &ProgressFn<'_, u64> = &cb;
    for parallelism in [1, 4] {
        let results = dispatch(
            std::iter::empty::<u64>(),
            &[0_u64][..],
            parallelism,
            Some(progress),
            |_| Ok(Offset { sleep: false }),
        )
        .unwrap();
        assert_eq!(results.count(), 0);
    }
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

// --- failures ---

#[test]
fn test_first_failure_is_returned_unchanged() {
    for parallelism in [1, 2, 4] {
        let executed = AtomicUsize::new(0);
        let err = dispatch(0..N, &[0_u64][..], parallelism, None, |_| {
            Ok(FailAt {
                fail_at: 5,
                executed: &executed,
            })
        })
        .err()
        .expect("dispatch should fail");
        let boom = err.downcast_ref::<Boom>().expect("error keeps its type");
        assert_eq!(boom.0, 5);
    }
}

#[test]
fn test_failure_stops_remaining_work() {
    let executed = AtomicUsize::new(0);
    let total = 1000_u64;
    let result = dispatch(0..total, &[0_u64][..], 2, None, |_| {
        Ok(FailAt {
            fail_at: 0,
            executed: &executed,
        })
    });
    assert!(result.is_err());
    assert!(executed.load(Ordering::SeqCst) < total as usize);
}

#[test]
fn test_invoker_construction_failure_runs_nothing() {
    let executed = AtomicUsize::new(0);
    let err = dispatch(0..N, &[0_u64][..], 3, None, |id| {
        anyhow::ensure!(id != 2, "no invoker for worker {id}");
        Ok(FailAt {
            fail_at: u64::MAX,
            executed: &executed,
        })
    })
    .err()
    .expect("construction error");
    assert_eq!(err.to_string(), "no invoker for worker 2");
    assert_eq!(executed.load(Ordering::SeqCst), 0);
}

#[test]
fn test_worker_panic_becomes_dispatch_error() {
    for parallelism in [1, 2, 4] {
        let err = dispatch(0..N, &[0_u64][..], parallelism, None, |_| Ok(Panics))
            .err()
            .expect("panic should surface as an error");
        assert!(
            matches!(
                err.downcast_ref::<DispatchError>(),
                Some(DispatchError::WorkerPanicked { .. })
            ),
            "parallelism {parallelism}: {err}"
        );
    }
}

// --- invokers and progress ---

#[test]
fn test_each_worker_owns_its_invoker() {
    let made = AtomicUsize::new(0);
    let threads: Vec<ThreadId> = dispatch(0..N, &[0_u64][..], 4, None, |_| {
        made.fetch_add(1, Ordering::SeqCst);
        Ok(Pinned { owner: None })
    })
    .unwrap()
    .collect();
    assert_eq!(made.load(Ordering::SeqCst), 4);
    assert_eq!(threads.len(), N as usize);
    let distinct: HashSet<ThreadId> = threads.into_iter().collect();
    assert!(distinct.len() <= 4);
    assert!(!distinct.contains(&thread::current().id()));
}

#[test]
fn test_single_worker_runs_on_calling_thread() {
    let threads: Vec<ThreadId> = dispatch(0..5_u64, &[0_u64][..], 1, None, |_| {
        Ok(Pinned { owner: None })
    })
    .unwrap()
    .collect();
    assert!(threads.iter().all(|t| *t == thread::current().id()));
}

#[test]
fn test_progress_totals_never_decrease_and_end_at_total() {
    for parallelism in [1, 4] {
        let seen = Mutex::new(Vec::new());
        let cb = |query: &u64, total: u64| seen.lock().unwrap().push((*query, total));
        let progress: &ProgressFn<'_, u64> = &cb;
        let results = dispatch(0..N, &[0_u64][..], parallelism, Some(progress), |_| {
            Ok(Offset { sleep: true })
        })
        .unwrap();
        assert_eq!(results.len(), N as usize);

        let seen = seen.into_inner().unwrap();
        assert_eq!(seen.len(), N as usize);
        let totals: Vec<u64> = seen.iter().map(|(_, t)| *t).collect();
        assert!(totals.windows(2).all(|w| w[0] <= w[1]), "{totals:?}");
        assert!(totals.iter().all(|t| (1..=N).contains(t)));
        assert_eq!(*totals.last().unwrap(), N);
        let queries: HashSet<u64> = seen.iter().map(|(q, _)| *q).collect();
        assert_eq!(queries.len(), N as usize);
    }
}
