//! Run outputs: JSONL dumps, the cluster JSON, idea seeds and a Markdown report,
//! all written into one timestamped directory per run.

use std::fmt::Write as _;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use demandsignal_common::{DemandCluster, MetaSummary, Post};
use demandsignal_engine::ExtractionStats;

use crate::pipeline::RunOutput;

pub const RAW_POSTS_FILE: &str = "raw_posts.jsonl";
pub const CANDIDATES_FILE: &str = "demand_candidates.jsonl";
pub const CLUSTERS_FILE: &str = "demand_clusters.json";
pub const SEED_FILE: &str = "demandsolution_seed_ideas.json";
pub const REPORT_FILE: &str = "report.md";

/// Members listed per cluster in the Markdown report.
const REPORT_MEMBERS_PER_CLUSTER: usize = 8;

#[derive(Serialize)]
struct ClustersFile<'a> {
    meta: &'a MetaSummary,
    clusters: &'a [DemandCluster],
}

/// Create `<base>/<YYYYmmdd_HHMMSS>/`.
pub fn timestamped_output_dir(base: &Path, now: DateTime<Utc>) -> Result<PathBuf> {
    let dir = base.join(now.format("%Y%m%d_%H%M%S").to_string());
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("creating output directory {}", dir.display()))?;
    Ok(dir)
}

pub fn write_jsonl<T: Serialize>(path: &Path, items: &[T]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    for item in items {
        serde_json::to_writer(&mut writer, item)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// Write all five run files into `out_dir`.
pub fn write_outputs(
    out_dir: &Path,
    posts: &[Post],
    output: &RunOutput,
    generated_at: DateTime<Utc>,
) -> Result<()> {
    write_jsonl(&out_dir.join(RAW_POSTS_FILE), posts)?;
    write_jsonl(&out_dir.join(CANDIDATES_FILE), &output.candidates)?;
    write_json(
        &out_dir.join(CLUSTERS_FILE),
        &ClustersFile {
            meta: &output.meta,
            clusters: &output.clusters,
        },
    )?;
    write_json(&out_dir.join(SEED_FILE), &output.seed)?;

    let report = render_markdown(&output.meta, &output.stats, &output.clusters, generated_at);
    std::fs::write(out_dir.join(REPORT_FILE), report)
        .with_context(|| format!("writing {}", out_dir.join(REPORT_FILE).display()))?;

    info!(dir = %out_dir.display(), "Outputs written");
    Ok(())
}

/// Human-readable run report.
pub fn render_markdown(
    meta: &MetaSummary,
    stats: &ExtractionStats,
    clusters: &[DemandCluster],
    generated_at: DateTime<Utc>,
) -> String {
    let mut md = String::new();
    let _ = writeln!(md, "# Social Demand Report\n");
    let _ = writeln!(md, "Generated: {}\n", generated_at.format("%Y-%m-%d %H:%M:%S UTC"));

    let _ = writeln!(md, "## Summary\n");
    let _ = writeln!(md, "| Metric | Value |");
    let _ = writeln!(md, "|---|---|");
    let _ = writeln!(md, "| Total posts | {} |", meta.total_posts);
    let _ = writeln!(md, "| Demand candidates | {} |", meta.total_candidates);
    let _ = writeln!(md, "| Demand clusters | {} |", meta.total_clusters);
    let _ = writeln!(md, "| Candidate rate | {:.1}% |", meta.candidate_rate * 100.0);
    let _ = writeln!(md, "| Multi-post clusters | {} |", meta.multi_member_clusters);
    let _ = writeln!(md, "| Cross-source clusters | {} |\n", meta.cross_source_clusters);

    let _ = writeln!(md, "## Extraction Gates\n");
    let _ = writeln!(md, "| Gate | Posts |");
    let _ = writeln!(md, "|---|---|");
    let _ = writeln!(md, "| Seen | {} |", stats.posts_seen);
    let _ = writeln!(md, "| Older than window | {} |", stats.too_old);
    let _ = writeln!(md, "| Self-promotion | {} |", stats.self_promo);
    let _ = writeln!(md, "| No demand phrase | {} |", stats.no_phrase);
    let _ = writeln!(md, "| Below min score | {} |", stats.below_min_score);
    let _ = writeln!(md, "| Accepted | {} |\n", stats.accepted);

    if !meta.posts_by_source.is_empty() {
        let _ = writeln!(md, "## Sources\n");
        let _ = writeln!(md, "| Source | Posts | Candidates |");
        let _ = writeln!(md, "|---|---|---|");
        for (source, posts) in &meta.posts_by_source {
            let candidates = meta.candidates_by_source.get(source).copied().unwrap_or(0);
            let _ = writeln!(md, "| {source} | {posts} | {candidates} |");
        }
        md.push('\n');
    }

    if !meta.top_phrases.is_empty() {
        let _ = writeln!(md, "## Top Phrases\n");
        for p in &meta.top_phrases {
            let _ = writeln!(md, "- `{}`: {}", p.phrase, p.count);
        }
        md.push('\n');
    }

    let _ = writeln!(md, "## Demand Clusters\n");
    if clusters.is_empty() {
        let _ = writeln!(md, "No demand clusters this run.");
        return md;
    }

    for cluster in clusters {
        let heading = cluster
            .representative()
            .map(|m| m.title.as_str())
            .unwrap_or(cluster.representative_excerpt.as_str());
        let _ = writeln!(md, "### {}. {}\n", cluster.id, heading);
        let _ = writeln!(
            md,
            "- Posts: {} | Score: {:.2} | Sources: {}",
            cluster.size,
            cluster.aggregate_score,
            cluster.sources.iter().cloned().collect::<Vec<_>>().join(", ")
        );
        let _ = writeln!(md, "\n> {}\n", cluster.representative_excerpt);

        for member in cluster.members.iter().take(REPORT_MEMBERS_PER_CLUSTER) {
            let _ = writeln!(
                md,
                "- [{}]({}) ({}, {:.2})",
                member.title, member.permalink, member.source_tag, member.confidence_score
            );
        }
        if cluster.size > REPORT_MEMBERS_PER_CLUSTER {
            let _ = writeln!(md, "- ... and {} more", cluster.size - REPORT_MEMBERS_PER_CLUSTER);
        }
        md.push('\n');
    }

    md
}
