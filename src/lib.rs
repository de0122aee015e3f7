//! Profsearch: ordered parallel profile and sequence search over a sequence corpus

pub mod dispatch;
pub mod engine;
pub mod errors;
pub mod press;
pub mod search;
pub mod types;
pub mod utils;

/// Re-export types for API
pub use types::*;

pub use engine::{Alphabet, Builder, DigitalSequence, Pipeline, Profile, TextSequence};
pub use errors::{DispatchError, InputError, ScoringError};
pub use press::{fetch_pressed_model, press};
pub use search::{search_by_profile, search_by_sequence};

/// Result alias used by public profsearch API
pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;
