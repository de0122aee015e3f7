//! Ordered parallel dispatch: shared context, worker loop, orchestrator, failure collection.

pub mod context;
pub mod error_handler;
pub mod invoker;
pub mod orchestrator;
pub mod worker;

pub use context::{
    DispatchChannels, Message, ProgressFn, SharedState, WorkerContext, create_dispatch_channels,
};
pub use error_handler::check_for_first_failure;
pub use invoker::{PipelineInvoker, ProfileInvoker, SequenceInvoker};
pub use orchestrator::{OrderedResults, dispatch, resolve_workers};
pub use worker::{FailureSlot, worker_loop};
