//! Demand-signal engine: turns a deduplicated batch of posts into scored
//! demand candidates, groups near-duplicates into clusters, and summarizes
//! the run.
//!
//! Every stage is a pure function over borrowed input and returns a fresh
//! collection: posts -> candidates -> clusters -> meta summary / seeds.

pub mod extractor;
pub mod grouper;
pub mod seed;
pub mod signals;
pub mod summary;
pub mod text;

pub use extractor::{CandidateExtractor, ExtractionStats};
pub use grouper::cluster;
pub use seed::build_seed;
pub use signals::{SignalMatch, SignalMatcher};
pub use summary::build_meta_summary;
