//! Public and internal types for the profsearch API and dispatcher.

use serde::{Deserialize, Serialize};

use crate::utils::config::{BuilderConsts, ScoringConsts};

/// A query tagged with its zero-based position in the submitted sequence.
#[derive(Clone, Debug)]
pub struct IndexedQuery<Q> {
    pub index: u64,
    pub query: Q,
}

/// A result tagged with the index of the query that produced it.
#[derive(Clone, Debug)]
pub struct IndexedResult<R> {
    pub index: u64,
    pub result: R,
}

/// One scored target from a search.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Hit {
    /// Name of the corpus sequence.
    pub name: String,
    /// Position of the target in the corpus.
    pub target_index: usize,
    /// Best ungapped local alignment score of the query over the target.
    pub score: f32,
    /// Set when `score` passes the pipeline's reporting threshold.
    pub reported: bool,
}

impl Hit {
    pub fn is_reported(&self) -> bool {
        self.reported
    }
}

/// Result set for one query: hits sorted by descending score.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TopHits {
    /// Name of the query profile or sequence.
    pub query_name: String,
    /// Number of corpus sequences that were scored.
    pub searched: usize,
    pub hits: Vec<Hit>,
}

impl TopHits {
    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Hit> {
        self.hits.iter()
    }

    /// Hits that passed the reporting threshold.
    pub fn reported(&self) -> impl Iterator<Item = &Hit> {
        self.hits.iter().filter(|h| h.is_reported())
    }
}

impl<'a> IntoIterator for &'a TopHits {
    type Item = &'a Hit;
    type IntoIter = std::slice::Iter<'a, Hit>;

    fn into_iter(self) -> Self::IntoIter {
        self.hits.iter()
    }
}

/// Options for one scoring pipeline instance. Every worker builds its own pipeline from these.
#[derive(Clone, Debug, PartialEq)]
pub struct PipelineOptions {
    /// Minimum score for a hit to be reported.
    pub report_threshold: f32,
    /// Keep at most this many hits per query (after sorting). None keeps all.
    pub max_hits: Option<usize>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            report_threshold: ScoringConsts::DEFAULT_REPORT_THRESHOLD,
            max_hits: None,
        }
    }
}

/// Lib-only options for [`search_by_profile`](crate::search_by_profile) and
/// [`search_by_sequence`](crate::search_by_sequence).
#[derive(Clone, Debug, Default)]
pub struct SearchOpts {
    /// Worker count. 0 autodetects from available hardware threads; 1 runs on the calling thread.
    pub jobs: usize,
    pub pipeline: PipelineOptions,
}

/// Full options (CLI). Use [`SearchOpts`] for lib.
#[derive(Clone, Debug)]
pub struct Opts {
    pub jobs: usize,
    pub pipeline: PipelineOptions,
    /// Score for the query residue when building a profile from a sequence.
    pub match_score: f32,
    /// Score for every other residue when building a profile from a sequence.
    pub mismatch_score: f32,
    /// Show progress bar and debug logging.
    pub verbose: bool,
}

impl Default for Opts {
    fn default() -> Self {
        Opts {
            jobs: 0,
            pipeline: PipelineOptions::default(),
            match_score: BuilderConsts::MATCH_SCORE,
            mismatch_score: BuilderConsts::MISMATCH_SCORE,
            verbose: false,
        }
    }
}

impl From<&Opts> for SearchOpts {
    fn from(o: &Opts) -> Self {
        SearchOpts {
            jobs: o.jobs,
            pipeline: o.pipeline.clone(),
        }
    }
}
