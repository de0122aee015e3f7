//! Pipeline invokers: one scoring pipeline plus per-worker preparation state.

use anyhow::Result;

use crate::engine::alphabet::Alphabet;
use crate::engine::profile::{Builder, Profile};
use crate::engine::scoring::Pipeline;
use crate::engine::sequence::DigitalSequence;
use crate::types::{PipelineOptions, TopHits};

/// The operation a worker runs for each query. Each worker exclusively owns one invoker.
pub trait PipelineInvoker {
    /// Read-only data every query is scored against; shared by reference across workers.
    type Corpus: ?Sized + Sync;
    type Query;
    type Output;

    /// Score one query against the corpus. Errors are propagated to the dispatcher unchanged.
    fn execute(&mut self, query: &Self::Query, corpus: &Self::Corpus) -> Result<Self::Output>;

    /// Release per-query scratch state. Called after every successful `execute`.
    fn reset(&mut self);
}

/// Searches pre-built profiles against the corpus.
pub struct ProfileInvoker {
    pipeline: Pipeline,
}

impl ProfileInvoker {
    pub fn new(alphabet: Alphabet, options: &PipelineOptions) -> Self {
        Self {
            pipeline: Pipeline::new(alphabet, options.clone()),
        }
    }
}

impl PipelineInvoker for ProfileInvoker {
    type Corpus = [DigitalSequence];
    type Query = Profile;
    type Output = TopHits;

    fn execute(&mut self, query: &Profile, corpus: &[DigitalSequence]) -> Result<TopHits> {
        Ok(self.pipeline.search_profile(query, corpus)?)
    }

    fn reset(&mut self) {
        self.pipeline.clear();
    }
}

/// Builds a profile from each raw query sequence, then searches it.
/// Owns its builder: with several workers every invoker gets its own [`Builder::copy`].
pub struct SequenceInvoker {
    pipeline: Pipeline,
    builder: Builder,
}

impl SequenceInvoker {
    pub fn new(alphabet: Alphabet, options: &PipelineOptions, builder: Builder) -> Self {
        Self {
            pipeline: Pipeline::new(alphabet, options.clone()),
            builder,
        }
    }
}

impl PipelineInvoker for SequenceInvoker {
    type Corpus = [DigitalSequence];
    type Query = DigitalSequence;
    type Output = TopHits;

    fn execute(&mut self, query: &DigitalSequence, corpus: &[DigitalSequence]) -> Result<TopHits> {
        Ok(self.pipeline.search_seq(query, corpus, &mut self.builder)?)
    }

    fn reset(&mut self) {
        self.pipeline.clear();
    }
}
