use anyhow::{bail, Context, Result};
use chrono::{TimeDelta, Utc};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use demandsignal_common::EngineConfig;
use demandsignal_scout::cli::Cli;
use demandsignal_scout::pipeline::{run_engine, RunSettings};
use demandsignal_scout::{collect, report};
use social_client::HttpFetcher;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("demandsignal=info".parse()?)
                .add_directive("social_client=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let kinds = cli.source_kinds()?;
    let queries = cli.queries()?;
    let params = cli.extraction_params();
    params.validate()?;
    if !(0.0..=1.0).contains(&cli.similarity_threshold) {
        bail!(
            "--similarity-threshold must be within [0, 1], got {}",
            cli.similarity_threshold
        );
    }

    let config = match &cli.config {
        Some(path) => EngineConfig::from_file(path)
            .with_context(|| format!("loading engine config {}", path.display()))?,
        None => EngineConfig::default(),
    };

    info!(
        sources = ?kinds,
        queries = queries.len(),
        per_query = cli.per_query_per_source,
        hours = cli.hours,
        "Demand scout starting..."
    );

    let now = Utc::now();
    let since = TimeDelta::try_seconds((cli.hours * 3600.0) as i64)
        .and_then(|window| now.checked_sub_signed(window));

    let http = HttpFetcher::new(&cli.user_agent).context("building HTTP client")?;
    let sources = collect::build_sources(&kinds, &http, &cli.stackexchange_site);
    let fetched =
        collect::collect_posts(&sources, &queries, cli.per_query_per_source, since).await;

    if fetched.posts.is_empty() {
        bail!(
            "No social posts were fetched from Hacker News/StackExchange. \
             Check network access and try reducing --per-query-per-source."
        );
    }

    let settings = RunSettings {
        queries,
        params,
        similarity_threshold: cli.similarity_threshold,
        top_clusters: cli.top_clusters,
    };
    let output = run_engine(&fetched.posts, &config, &settings, now)?;

    let out_dir = report::timestamped_output_dir(&cli.output_dir, now)?;
    report::write_outputs(&out_dir, &fetched.posts, &output, now)?;

    info!("Scout run complete. {}", output.meta);

    println!();
    println!("Saved outputs to: {}", out_dir.display());
    println!("Total posts: {}", output.meta.total_posts);
    println!("Demand candidates: {}", output.meta.total_candidates);
    println!("Demand clusters: {}", output.meta.total_clusters);
    if !fetched.failures.is_empty() {
        warn!(failures = fetched.failures.len(), "Some fetches failed");
        println!(
            "Warnings: {} fetch calls failed but pipeline continued.",
            fetched.failures.len()
        );
    }

    Ok(())
}
