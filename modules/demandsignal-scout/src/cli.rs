use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Parser;

use demandsignal_common::ExtractionParams;

pub const DEFAULT_SOURCES: &str = "hackernews,stackoverflow";
pub const DEFAULT_SEARCH_QUERIES: &str =
    "need app,looking for tool,wish there was,how do i automate,any software for,struggling with";
pub const DEFAULT_USER_AGENT: &str = "demand-signal-collector/0.1";

/// Collect and summarize user demand from public discussion sources.
#[derive(Debug, Clone, Parser)]
#[command(name = "scout", version)]
pub struct Cli {
    /// Comma-separated sources: hackernews,stackoverflow
    #[arg(long, default_value = DEFAULT_SOURCES)]
    pub sources: String,

    /// Max posts fetched per query per source.
    #[arg(long, default_value_t = 40)]
    pub per_query_per_source: usize,

    /// StackExchange site to search.
    #[arg(long, default_value = "stackoverflow")]
    pub stackexchange_site: String,

    /// Only include posts newer than this many hours.
    #[arg(long, default_value_t = 168.0)]
    pub hours: f64,

    /// Minimum demand confidence score.
    #[arg(long, default_value_t = 2.0)]
    pub min_score: f64,

    /// Fuzzy grouping threshold in [0, 1].
    #[arg(long, default_value_t = 0.62)]
    pub similarity_threshold: f64,

    /// Base output directory; each run writes a timestamped subdirectory.
    #[arg(long, default_value = "data/social_requirements")]
    pub output_dir: PathBuf,

    #[arg(long, env = "SOCIAL_USER_AGENT", default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,

    /// Comma-separated search queries; each is also matched as a demand phrase.
    #[arg(long, default_value = DEFAULT_SEARCH_QUERIES)]
    pub search_queries: String,

    /// Keep self-promotional posts (excluded by default).
    #[arg(long)]
    pub include_self_promo: bool,

    /// TOML file with [vocabulary] / [weights] overrides.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Clusters listed in the meta summary.
    #[arg(long, default_value_t = 10)]
    pub top_clusters: usize,
}

/// A fetchable source named on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    HackerNews,
    StackExchange,
}

impl SourceKind {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "hackernews" | "hn" => Some(Self::HackerNews),
            "stackoverflow" | "stackexchange" => Some(Self::StackExchange),
            _ => None,
        }
    }
}

/// Split a comma-separated flag, trimming and dropping blanks.
pub fn parse_csv_terms(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl Cli {
    /// Resolve `--sources` in flag order. Unknown names are ignored as long as
    /// one supported source remains.
    pub fn source_kinds(&self) -> Result<Vec<SourceKind>> {
        let names = parse_csv_terms(&self.sources.to_lowercase());
        if names.is_empty() {
            bail!("At least one source is required");
        }
        let mut kinds = Vec::new();
        for name in &names {
            match SourceKind::parse(name) {
                Some(kind) if !kinds.contains(&kind) => kinds.push(kind),
                Some(_) => {}
                None => tracing::warn!(source = name.as_str(), "Ignoring unsupported source"),
            }
        }
        if kinds.is_empty() {
            bail!("Supported sources are: hackernews, stackoverflow");
        }
        Ok(kinds)
    }

    pub fn queries(&self) -> Result<Vec<String>> {
        let queries = parse_csv_terms(&self.search_queries);
        if queries.is_empty() {
            bail!("At least one search query is required");
        }
        Ok(queries)
    }

    pub fn extraction_params(&self) -> ExtractionParams {
        ExtractionParams {
            max_age_hours: self.hours,
            min_score: self.min_score,
            exclude_self_promo: !self.include_self_promo,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("scout").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults_match_collector() {
        let cli = parse(&[]);
        assert_eq!(cli.per_query_per_source, 40);
        assert_eq!(cli.hours, 168.0);
        assert_eq!(cli.min_score, 2.0);
        assert_eq!(cli.similarity_threshold, 0.62);
        assert_eq!(cli.top_clusters, 10);
        assert_eq!(cli.output_dir, PathBuf::from("data/social_requirements"));
        assert_eq!(cli.queries().unwrap().len(), 6);
        assert_eq!(
            cli.source_kinds().unwrap(),
            vec![SourceKind::HackerNews, SourceKind::StackExchange]
        );
        assert!(cli.extraction_params().exclude_self_promo);
    }

    #[test]
    fn include_self_promo_flips_exclusion() {
        let cli = parse(&["--include-self-promo", "--hours", "24"]);
        let params = cli.extraction_params();
        assert!(!params.exclude_self_promo);
        assert_eq!(params.max_age_hours, 24.0);
    }

    #[test]
    fn unknown_sources_are_ignored_when_one_is_supported() {
        let cli = parse(&["--sources", "reddit, HackerNews ,hackernews"]);
        assert_eq!(cli.source_kinds().unwrap(), vec![SourceKind::HackerNews]);
    }

    #[test]
    fn rejects_empty_or_unsupported_sources() {
        assert!(parse(&["--sources", " , "]).source_kinds().is_err());
        assert!(parse(&["--sources", "reddit"]).source_kinds().is_err());
    }

    #[test]
    fn csv_terms_trim_and_drop_blanks() {
        assert_eq!(parse_csv_terms(" a , ,b,"), vec!["a".to_string(), "b".to_string()]);
    }
}
