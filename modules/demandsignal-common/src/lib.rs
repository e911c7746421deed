pub mod types;
pub mod config;
pub mod error;

pub use types::*;
pub use config::{EngineConfig, ExtractionParams, ScoringWeights, Vocabulary};
pub use error::{DemandSignalError, Result};
