//! Scoring pipeline: scores one query profile against every corpus sequence.

use crate::engine::alphabet::Alphabet;
use crate::engine::profile::{Builder, Profile};
use crate::engine::sequence::DigitalSequence;
use crate::errors::ScoringError;
use crate::types::{Hit, PipelineOptions, TopHits};

/// One scoring pipeline. Accumulates hits for the current query; call [`Pipeline::clear`]
/// before reusing it for the next one.
#[derive(Debug)]
pub struct Pipeline {
    alphabet: Alphabet,
    options: PipelineOptions,
    hits: Vec<Hit>,
}

impl Pipeline {
    pub fn new(alphabet: Alphabet, options: PipelineOptions) -> Self {
        Self {
            alphabet,
            options,
            hits: Vec::new(),
        }
    }

    /// Score `profile` against every target. Hits are sorted by descending score, ties by
    /// target position, and truncated to `max_hits` when set.
    pub fn search_profile(
        &mut self,
        profile: &Profile,
        targets: &[DigitalSequence],
    ) -> Result<TopHits, ScoringError> {
        self.check_alphabet(&profile.name, profile.alphabet)?;
        profile.validate()?;
        for (target_index, target) in targets.iter().enumerate() {
            self.check_alphabet(&target.name, target.alphabet)?;
            let score = best_ungapped_score(profile, &target.data);
            self.hits.push(Hit {
                name: target.name.clone(),
                target_index,
                score,
                reported: score >= self.options.report_threshold,
            });
        }
        self.hits.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then(a.target_index.cmp(&b.target_index))
        });
        let mut hits = self.hits.clone();
        if let Some(max) = self.options.max_hits {
            hits.truncate(max);
        }
        Ok(TopHits {
            query_name: profile.name.clone(),
            searched: targets.len(),
            hits,
        })
    }

    /// Build a profile from `query` with `builder`, then search it.
    pub fn search_seq(
        &mut self,
        query: &DigitalSequence,
        targets: &[DigitalSequence],
        builder: &mut Builder,
    ) -> Result<TopHits, ScoringError> {
        self.check_alphabet(&query.name, query.alphabet)?;
        let profile = builder.build(query)?;
        self.search_profile(&profile, targets)
    }

    /// Drop the hits accumulated by the last search.
    pub fn clear(&mut self) {
        self.hits.clear();
    }

    fn check_alphabet(&self, name: &str, found: Alphabet) -> Result<(), ScoringError> {
        match found == self.alphabet {
            true => Ok(()),
            false => Err(ScoringError::AlphabetMismatch {
                name: name.to_string(),
                expected: self.alphabet,
                found,
            }),
        }
    }
}

/// Best ungapped local alignment score of `profile` over `target`: the maximum-sum run along
/// any diagonal of the position x residue matrix. Never negative.
pub fn best_ungapped_score(profile: &Profile, target: &[u8]) -> f32 {
    let m = profile.len() as isize;
    let l = target.len() as isize;
    let mut best = 0.0_f32;
    // Diagonal d pairs profile position i with target position i + d.
    for d in -(m - 1)..l {
        let start = (-d).max(0);
        let end = m.min(l - d);
        let mut running = 0.0_f32;
        for i in start..end {
            let s = profile.score(i as usize, target[(i + d) as usize]);
            running = (running + s).max(0.0);
            best = best.max(running);
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dna(name: &str, residues: &[u8]) -> DigitalSequence {
        DigitalSequence {
            name: name.to_string(),
            alphabet: Alphabet::Dna,
            data: Alphabet::Dna.digitize(name, residues).unwrap(),
        }
    }

    fn profile_for(residues: &[u8]) -> Profile {
        Builder::with_scores(Alphabet::Dna, 1.0, -1.0)
            .build(&dna("q", residues))
            .unwrap()
    }

    #[test]
    fn test_best_ungapped_exact_match() {
        let p = profile_for(b"ACGT");
        assert_eq!(best_ungapped_score(&p, &dna("t", b"TTACGTTT").data), 4.0);
    }

    #[test]
    fn test_best_ungapped_partial_overlap() {
        let p = profile_for(b"ACGT");
        // Only "GT" of the query overlaps the target start.
        assert_eq!(best_ungapped_score(&p, &dna("t", b"GTCC").data), 2.0);
    }

    #[test]
    fn test_best_ungapped_no_match_is_zero() {
        let p = profile_for(b"AAAA");
        assert_eq!(best_ungapped_score(&p, &dna("t", b"CCCC").data), 0.0);
        assert_eq!(best_ungapped_score(&p, &[]), 0.0);
    }

    #[test]
    fn test_search_profile_sorts_and_thresholds() {
        let targets = vec![dna("weak", b"ACCC"), dna("strong", b"ACGT"), dna("none", b"TTTT")];
        let mut pipeline = Pipeline::new(
            Alphabet::Dna,
            PipelineOptions {
                report_threshold: 2.0,
                max_hits: None,
            },
        );
        let hits = pipeline.search_profile(&profile_for(b"ACGT"), &targets).unwrap();
        assert_eq!(hits.searched, 3);
        let names: Vec<_> = hits.iter().map(|h| h.name.as_str()).collect();
        assert_eq!(names, vec!["strong", "weak", "none"]);
        let reported: Vec<_> = hits.reported().map(|h| h.name.as_str()).collect();
        assert_eq!(reported, vec!["strong", "weak"]);
    }

    #[test]
    fn test_max_hits_truncates() {
        let targets = vec![dna("a", b"ACGT"), dna("b", b"ACGT"), dna("c", b"ACGT")];
        let mut pipeline = Pipeline::new(
            Alphabet::Dna,
            PipelineOptions {
                report_threshold: 0.0,
                max_hits: Some(2),
            },
        );
        let hits = pipeline.search_profile(&profile_for(b"ACGT"), &targets).unwrap();
        let names: Vec<_> = hits.iter().map(|h| h.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_search_requires_clear_between_queries() {
        let targets = vec![dna("a", b"ACGT")];
        let mut pipeline = Pipeline::new(Alphabet::Dna, PipelineOptions::default());
        pipeline.search_profile(&profile_for(b"AC"), &targets).unwrap();
        pipeline.clear();
        let hits = pipeline.search_profile(&profile_for(b"GT"), &targets).unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_search_seq_alphabet_mismatch() {
        let mut pipeline = Pipeline::new(Alphabet::Amino, PipelineOptions::default());
        let mut builder = Builder::new(Alphabet::Amino);
        let err = pipeline
            .search_seq(&dna("q", b"ACGT"), &[], &mut builder)
            .unwrap_err();
        assert!(matches!(err, ScoringError::AlphabetMismatch { .. }));
    }
}
