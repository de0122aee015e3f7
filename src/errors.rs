//! Error types for profsearch operations.

use thiserror::Error;

use crate::engine::alphabet::Alphabet;

/// Failures of the dispatcher itself (not of the queries it runs).
#[derive(Error, Debug)]
pub enum DispatchError {
    /// A worker thread panicked while running a query.
    #[error("dispatch worker {id} panicked")]
    WorkerPanicked {
        /// Worker position in start order
        id: usize,
    },
}

/// Errors raised by the scoring pipeline for a single query.
#[derive(Error, Debug, PartialEq)]
pub enum ScoringError {
    /// Query or target uses a different alphabet than the pipeline
    #[error("alphabet mismatch for '{name}': expected {expected}, found {found}")]
    AlphabetMismatch {
        /// Name of the offending query or target
        name: String,
        /// Alphabet the pipeline was configured with
        expected: Alphabet,
        /// Alphabet of the offending record
        found: Alphabet,
    },

    /// Profile or sequence with no positions
    #[error("query '{name}' is empty")]
    EmptyQuery {
        /// Name of the empty query
        name: String,
    },

    /// Profile row does not have one score per residue
    #[error("profile '{name}' row {row} has {found} scores, expected {expected}")]
    MalformedProfile {
        /// Profile name
        name: String,
        /// Zero-based row index
        row: usize,
        /// Scores found in the row
        found: usize,
        /// Alphabet size
        expected: usize,
    },
}

/// Errors reading or preparing user input.
#[derive(Error, Debug)]
pub enum InputError {
    /// Alphabet of a sequence file could not be determined
    #[error("could not guess alphabet of input '{path}'")]
    UndetectableAlphabet {
        /// Path to the sequence file
        path: String,
    },

    /// Residue outside the alphabet
    #[error("invalid residue '{residue}' at position {position} of '{name}' for {alphabet} alphabet")]
    InvalidResidue {
        /// Sequence name
        name: String,
        /// Offending character
        residue: char,
        /// Zero-based position
        position: usize,
        /// Target alphabet
        alphabet: Alphabet,
    },

    /// FASTA content that cannot be parsed
    #[error("malformed FASTA at line {line}: {reason}")]
    MalformedFasta {
        /// One-based line number
        line: usize,
        /// Explanation of the problem
        reason: String,
    },

    /// A search-by-sequence call with an empty corpus and no builder
    #[error("cannot build a default builder from an empty corpus")]
    EmptyCorpus,

    /// Output of press already present
    #[error("file {path} already exists")]
    OutputExists {
        /// Path of the existing file
        path: String,
    },
}
