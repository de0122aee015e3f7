//! Engine module: sequences, profiles, scoring, and the CLI surface

pub mod alphabet;
pub mod arg_parser;
pub mod cli;
pub mod profile;
pub mod progress;
pub mod scoring;
pub mod sequence;

// Re-export commonly used items
pub use alphabet::Alphabet;
pub use arg_parser::{Cli, Commands, ScoringArgs};
pub use cli::handle_run;
pub use profile::{Builder, Profile, read_models};
pub use scoring::{Pipeline, best_ungapped_score};
pub use sequence::{DigitalSequence, TextSequence, load_corpus, read_fasta};
