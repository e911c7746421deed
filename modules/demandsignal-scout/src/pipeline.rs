use chrono::{DateTime, Utc};

use demandsignal_common::{
    DemandCandidate, DemandCluster, EngineConfig, ExtractionParams, MetaSummary, Post, Result,
    SeedDocument,
};
use demandsignal_engine::{
    build_meta_summary, build_seed, cluster, CandidateExtractor, ExtractionStats, SignalMatcher,
};

pub const SEED_SOURCE_NAME: &str = "social";
const SEED_SAMPLE_PERMALINKS: usize = 5;

/// Everything one engine pass produces from a post batch.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub candidates: Vec<DemandCandidate>,
    /// Per-gate rejection counts from extraction.
    pub stats: ExtractionStats,
    pub clusters: Vec<DemandCluster>,
    pub meta: MetaSummary,
    pub seed: SeedDocument,
}

/// Per-run settings the engine needs beyond the TOML config.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub queries: Vec<String>,
    pub params: ExtractionParams,
    pub similarity_threshold: f64,
    pub top_clusters: usize,
}

/// Posts -> candidates -> clusters -> meta summary and seeds. Active queries
/// join the demand vocabulary for this run only.
pub fn run_engine(
    posts: &[Post],
    config: &EngineConfig,
    settings: &RunSettings,
    now: DateTime<Utc>,
) -> Result<RunOutput> {
    let vocabulary = config
        .vocabulary
        .clone()
        .with_query_terms(settings.queries.iter().cloned());
    let matcher = SignalMatcher::new(&vocabulary)?;
    let extractor =
        CandidateExtractor::new(matcher, config.weights).with_excerpt_chars(config.excerpt_chars);

    let (candidates, stats) = extractor.extract_with_stats(posts, &settings.params, now)?;
    let clusters = cluster(&candidates, settings.similarity_threshold)?;

    let meta = build_meta_summary(posts, &candidates, &clusters, settings.top_clusters);
    let seed = build_seed(&clusters, SEED_SOURCE_NAME, SEED_SAMPLE_PERMALINKS);

    Ok(RunOutput {
        candidates,
        stats,
        clusters,
        meta,
        seed,
    })
}
