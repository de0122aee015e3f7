//! Position-specific score profiles, the models file, and the sequence-to-profile builder.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use crate::engine::alphabet::Alphabet;
use crate::engine::sequence::DigitalSequence;
use crate::errors::ScoringError;
use crate::utils::config::BuilderConsts;

/// A query model: one row of per-residue scores for each model position.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accession: Option<String>,
    pub alphabet: Alphabet,
    /// `scores[position][residue]`, `alphabet.size()` columns per row.
    pub scores: Vec<Vec<f32>>,
}

impl Profile {
    /// Number of model positions.
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Check the profile is non-empty and every row has one score per residue.
    pub fn validate(&self) -> Result<(), ScoringError> {
        if self.is_empty() {
            return Err(ScoringError::EmptyQuery {
                name: self.name.clone(),
            });
        }
        let expected = self.alphabet.size();
        if let Some((row, r)) = self
            .scores
            .iter()
            .enumerate()
            .find(|(_, r)| r.len() != expected)
        {
            return Err(ScoringError::MalformedProfile {
                name: self.name.clone(),
                row,
                found: r.len(),
                expected,
            });
        }
        Ok(())
    }

    /// Score of `residue` at `position`. Degenerate residues score 0.
    #[inline]
    pub fn score(&self, position: usize, residue: u8) -> f32 {
        self.scores[position]
            .get(residue as usize)
            .copied()
            .unwrap_or(0.0)
    }
}

/// Parse a models file: JSON lines, one [`Profile`] per line. Blank lines are ignored.
pub fn parse_models<R: BufRead>(reader: R) -> Result<Vec<Profile>> {
    let mut models = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("read models line {}", i + 1))?;
        if line.trim().is_empty() {
            continue;
        }
        let model: Profile =
            serde_json::from_str(&line).with_context(|| format!("parse model at line {}", i + 1))?;
        models.push(model);
    }
    Ok(models)
}

/// Read all profiles of a models file.
pub fn read_models(path: &Path) -> Result<Vec<Profile>> {
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    parse_models(BufReader::new(file)).with_context(|| format!("parse {}", path.display()))
}

/// Write `model` as one JSON line.
pub fn write_model<W: Write>(writer: &mut W, model: &Profile) -> Result<()> {
    serde_json::to_writer(&mut *writer, model)?;
    writer.write_all(b"\n")?;
    Ok(())
}

/// Turns a raw query sequence into a scorable [`Profile`].
///
/// Holds mutable state (a cached row template and a build counter), so a builder must not be
/// shared between threads: give each worker its own [`Builder::copy`].
#[derive(Clone, Debug)]
pub struct Builder {
    alphabet: Alphabet,
    match_score: f32,
    mismatch_score: f32,
    template: Vec<f32>,
    built: u64,
}

impl Builder {
    pub fn new(alphabet: Alphabet) -> Self {
        Self::with_scores(
            alphabet,
            BuilderConsts::MATCH_SCORE,
            BuilderConsts::MISMATCH_SCORE,
        )
    }

    pub fn with_scores(alphabet: Alphabet, match_score: f32, mismatch_score: f32) -> Self {
        Self {
            alphabet,
            match_score,
            mismatch_score,
            template: vec![mismatch_score; alphabet.size()],
            built: 0,
        }
    }

    pub fn alphabet(&self) -> Alphabet {
        self.alphabet
    }

    /// Independent builder with the same parameters and a fresh build count.
    pub fn copy(&self) -> Builder {
        Builder {
            built: 0,
            ..self.clone()
        }
    }

    /// Profiles built by this instance.
    pub fn built(&self) -> u64 {
        self.built
    }

    /// Build a profile scoring `match_score` on the query residue and `mismatch_score`
    /// elsewhere. Degenerate query positions score 0 for every residue.
    pub fn build(&mut self, seq: &DigitalSequence) -> Result<Profile, ScoringError> {
        if seq.alphabet != self.alphabet {
            return Err(ScoringError::AlphabetMismatch {
                name: seq.name.clone(),
                expected: self.alphabet,
                found: seq.alphabet,
            });
        }
        if seq.is_empty() {
            return Err(ScoringError::EmptyQuery {
                name: seq.name.clone(),
            });
        }
        let k = self.alphabet.size();
        let scores = seq
            .data
            .iter()
            .map(|&code| {
                if (code as usize) < k {
                    let mut row = self.template.clone();
                    row[code as usize] = self.match_score;
                    row
                } else {
                    vec![0.0; k]
                }
            })
            .collect();
        self.built += 1;
        Ok(Profile {
            name: seq.name.clone(),
            accession: None,
            alphabet: self.alphabet,
            scores,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn dna(name: &str, residues: &[u8]) -> DigitalSequence {
        DigitalSequence {
            name: name.to_string(),
            alphabet: Alphabet::Dna,
            data: Alphabet::Dna.digitize(name, residues).unwrap(),
        }
    }

    #[test]
    fn test_build_scores_query_residue() {
        let mut builder = Builder::with_scores(Alphabet::Dna, 2.0, -1.0);
        let profile = builder.build(&dna("q", b"AN")).unwrap();
        assert_eq!(profile.len(), 2);
        assert_eq!(profile.scores[0], vec![2.0, -1.0, -1.0, -1.0]);
        assert_eq!(profile.scores[1], vec![0.0; 4]);
        assert_eq!(builder.built(), 1);
    }

    #[test]
    fn test_build_rejects_other_alphabet() {
        let mut builder = Builder::new(Alphabet::Amino);
        let err = builder.build(&dna("q", b"ACGT")).unwrap_err();
        assert!(matches!(err, ScoringError::AlphabetMismatch { .. }));
        assert_eq!(builder.built(), 0);
    }

    #[test]
    fn test_copy_is_independent() {
        let mut builder = Builder::new(Alphabet::Dna);
        builder.build(&dna("q", b"ACGT")).unwrap();
        let mut copy = builder.copy();
        assert_eq!(copy.built(), 0);
        copy.build(&dna("r", b"GG")).unwrap();
        copy.build(&dna("s", b"TT")).unwrap();
        assert_eq!(builder.built(), 1);
        assert_eq!(copy.built(), 2);
    }

    #[test]
    fn test_validate_malformed_row() {
        let profile = Profile {
            name: "p".to_string(),
            accession: None,
            alphabet: Alphabet::Dna,
            scores: vec![vec![1.0; 4], vec![1.0; 3]],
        };
        assert_eq!(
            profile.validate(),
            Err(ScoringError::MalformedProfile {
                name: "p".to_string(),
                row: 1,
                found: 3,
                expected: 4
            })
        );
    }

    #[test]
    fn test_models_json_lines() {
        let mut buf = Vec::new();
        let a = Profile {
            name: "a".to_string(),
            accession: Some("PF0001".to_string()),
            alphabet: Alphabet::Dna,
            scores: vec![vec![1.0, 0.0, 0.0, 0.0]],
        };
        write_model(&mut buf, &a).unwrap();
        buf.extend_from_slice(b"\n");
        buf.extend_from_slice(br#"{"name":"b","alphabet":"rna","scores":[[0,0,0,1]]}"#);
        let models = parse_models(Cursor::new(buf)).unwrap();
        assert_eq!(models.len(), 2);
        assert_eq!(models[0], a);
        assert_eq!(models[1].accession, None);
        assert_eq!(models[1].alphabet, Alphabet::Rna);
    }

    #[test]
    fn test_parse_models_reports_line() {
        let err = parse_models(Cursor::new("{\"name\":1}\n")).unwrap_err();
        assert!(format!("{err:#}").contains("line 1"));
    }
}
