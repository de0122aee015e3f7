//! Search operations built on the dispatcher: profile queries and raw sequence queries.

use anyhow::Result;
use log::debug;

use crate::dispatch::{OrderedResults, ProfileInvoker, ProgressFn, SequenceInvoker, dispatch};
use crate::engine::alphabet::Alphabet;
use crate::engine::profile::{Builder, Profile};
use crate::engine::sequence::DigitalSequence;
use crate::errors::InputError;
use crate::{SearchOpts, TopHits};

/// Search every profile in `queries` against `corpus`. Results come back in query order.
///
/// The pipeline alphabet is the corpus alphabet; with an empty corpus it falls back to amino.
pub fn search_by_profile<I>(
    queries: I,
    corpus: &[DigitalSequence],
    opts: &SearchOpts,
    progress: Option<&ProgressFn<'_, Profile>>,
) -> Result<OrderedResults<TopHits>>
where
    I: IntoIterator<Item = Profile>,
{
    let alphabet = corpus.first().map_or(Alphabet::Amino, |s| s.alphabet);
    debug!(
        "search-by-profile: {} targets, {} alphabet, jobs={}",
        corpus.len(),
        alphabet,
        opts.jobs
    );
    dispatch(queries, corpus, opts.jobs, progress, |_| {
        Ok(ProfileInvoker::new(alphabet, &opts.pipeline))
    })
}

/// Search every raw sequence in `queries` against `corpus`, building a profile per query.
///
/// Without a `builder`, one is created from the alphabet of the first corpus sequence (an
/// empty corpus is then an error). Every worker gets its own [`Builder::copy`].
pub fn search_by_sequence<I>(
    queries: I,
    corpus: &[DigitalSequence],
    opts: &SearchOpts,
    builder: Option<Builder>,
    progress: Option<&ProgressFn<'_, DigitalSequence>>,
) -> Result<OrderedResults<TopHits>>
where
    I: IntoIterator<Item = DigitalSequence>,
{
    let builder = match builder {
        Some(b) => b,
        None => Builder::new(corpus.first().ok_or(InputError::EmptyCorpus)?.alphabet),
    };
    let alphabet = builder.alphabet();
    debug!(
        "search-by-sequence: {} targets, {} alphabet, jobs={}",
        corpus.len(),
        alphabet,
        opts.jobs
    );
    dispatch(queries, corpus, opts.jobs, progress, |_| {
        Ok(SequenceInvoker::new(alphabet, &opts.pipeline, builder.copy()))
    })
}
