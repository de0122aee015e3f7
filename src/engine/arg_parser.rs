use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Ordered parallel profile and sequence search against a sequence corpus.
#[derive(Clone, Parser)]
#[command(name = "profsearch")]
#[command(about = "Search profiles or sequences against a FASTA corpus; press model files.")]
pub struct Cli {
    /// Worker threads. 0 (default) uses every available hardware thread; 1 runs without spawning.
    #[arg(long, short = 'j', global = true)]
    pub jobs: Option<usize>,

    /// Verbose output (debug logging and a progress bar).
    #[arg(long, short = 'v', global = true, num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub verbose: Option<bool>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Subcommand)]
pub enum Commands {
    /// Search every model of a models file (JSON lines) against a FASTA corpus.
    SearchByProfile {
        /// Models file, one profile per line.
        #[arg(value_name = "MODELS")]
        models: PathBuf,
        /// FASTA corpus to search.
        #[arg(value_name = "CORPUS")]
        corpus: PathBuf,
        #[command(flatten)]
        scoring: ScoringArgs,
    },

    /// Build a profile from every query sequence and search it against a FASTA corpus.
    SearchBySequence {
        /// FASTA file of query sequences.
        #[arg(value_name = "QUERIES")]
        queries: PathBuf,
        /// FASTA corpus to search.
        #[arg(value_name = "CORPUS")]
        corpus: PathBuf,
        #[command(flatten)]
        scoring: ScoringArgs,
        /// Profile score for the query residue.
        #[arg(long, allow_negative_numbers = true)]
        match_score: Option<f32>,
        /// Profile score for every other residue.
        #[arg(long, allow_negative_numbers = true)]
        mismatch_score: Option<f32>,
    },

    /// Write the model, optimized-profile, filter and index files for a models file.
    Press {
        /// Models file, one profile per line. Outputs are written next to it.
        #[arg(value_name = "MODELS")]
        models: PathBuf,
        /// Overwrite existing output files.
        #[arg(long, short = 'f')]
        force: bool,
    },
}

/// Reporting options shared by both searches.
#[derive(Clone, Debug, Args)]
pub struct ScoringArgs {
    /// Minimum score for a hit to be reported.
    #[arg(long, short = 'T', allow_negative_numbers = true)]
    pub threshold: Option<f32>,

    /// Keep at most this many hits per query.
    #[arg(long)]
    pub max_hits: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_search_by_profile_with_global_jobs() {
        let cli = Cli::try_parse_from([
            "profsearch",
            "search-by-profile",
            "models.jsonl",
            "db.fa",
            "--jobs",
            "4",
            "-T",
            "3.5",
        ])
        .unwrap();
        assert_eq!(cli.jobs, Some(4));
        match cli.command {
            Commands::SearchByProfile {
                models, scoring, ..
            } => {
                assert_eq!(models, PathBuf::from("models.jsonl"));
                assert_eq!(scoring.threshold, Some(3.5));
                assert_eq!(scoring.max_hits, None);
            }
            _ => panic!("wrong subcommand"),
        }
    }

    #[test]
    fn test_parse_search_by_sequence_negative_mismatch() {
        let cli = Cli::try_parse_from([
            "profsearch",
            "search-by-sequence",
            "q.fa",
            "db.fa",
            "--mismatch-score",
            "-2",
        ])
        .unwrap();
        assert_eq!(cli.jobs, None);
        match cli.command {
            Commands::SearchBySequence { mismatch_score, .. } => {
                assert_eq!(mismatch_score, Some(-2.0))
            }
            _ => panic!("wrong subcommand"),
        }
    }

    #[test]
    fn test_parse_press_force() {
        let cli = Cli::try_parse_from(["profsearch", "press", "m.jsonl", "--force"]).unwrap();
        match cli.command {
            Commands::Press { force, .. } => assert!(force),
            _ => panic!("wrong subcommand"),
        }
    }
}
