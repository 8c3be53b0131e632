//! trialgraph — AACT clinical-trials export to property-graph tables.
//! Entry point for the pipeline binary.

mod config;

use std::path::PathBuf;

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::Parser;
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use trialgraph_ingestion::{ingest, FilterReport};
use trialgraph_kg::{plan_load, transform, write_load_plan, write_staged, TransformMetrics};

#[derive(Parser, Debug)]
#[command(name = "trialgraph")]
#[command(
    version,
    about = "Transform an extracted AACT export into deduplicated graph tables ready for idempotent loading"
)]
struct Args {
    /// Config file (defaults to TRIALGRAPH_CONFIG, then ./trialgraph.toml)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Directory with the extracted pipe-delimited tables
    #[arg(long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Where staged tables are written
    #[arg(long, value_name = "DIR")]
    staged_dir: Option<PathBuf>,

    /// Rows per load batch
    #[arg(long)]
    batch_size: Option<usize>,

    /// Skip writing load_plan.json
    #[arg(long)]
    no_load_plan: bool,
}

/// Written next to the staged tables; the only run output that carries timestamps.
#[derive(Debug, Serialize)]
struct RunManifest {
    version: &'static str,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
    data_dir: PathBuf,
    staged_dir: PathBuf,
    filter: FilterReport,
    metrics: TransformMetrics,
    load_batches: Option<usize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let mut config = config::Config::load(args.config.as_deref())?;
    if let Some(dir) = args.data_dir {
        config.source.data_dir = dir;
    }
    if let Some(dir) = args.staged_dir {
        config.output.staged_dir = dir;
    }
    if let Some(n) = args.batch_size {
        config.loader.batch_size = n;
    }
    if args.no_load_plan {
        config.output.write_load_plan = false;
    }

    // Initialise structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("trialgraph={},info", config.logging.level))),
        )
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "trialgraph starting");
    config.validate().context("invalid configuration")?;
    let criteria = config.eligibility()?;
    let started_at = Utc::now();

    let outcome = ingest(&config.source.data_dir, &criteria)
        .await
        .context("ingestion failed")?;
    if outcome.snapshot.is_empty() {
        warn!("No eligible studies; writing empty tables");
    }

    let dataset = transform(&outcome.snapshot, &config.transform).context("transformation failed")?;
    write_staged(&dataset, &config.output.staged_dir)
        .await
        .context("staging failed")?;

    let load_batches = if config.output.write_load_plan {
        let plan = plan_load(&dataset, config.loader.batch_size)?;
        write_load_plan(&plan, &config.output.staged_dir).await?;
        Some(plan.len())
    } else {
        None
    };

    let manifest = RunManifest {
        version: env!("CARGO_PKG_VERSION"),
        started_at,
        finished_at: Utc::now(),
        data_dir: config.source.data_dir.clone(),
        staged_dir: config.output.staged_dir.clone(),
        filter: outcome.report,
        metrics: dataset.metrics.clone(),
        load_batches,
    };
    let manifest_path = config.output.staged_dir.join("run.json");
    tokio::fs::write(&manifest_path, serde_json::to_string_pretty(&manifest)?).await?;

    let m = &dataset.metrics;
    info!(
        trials = m.trials,
        organizations = m.organizations,
        drugs = m.drugs,
        trial_org_edges = m.trial_org_edges,
        trial_drug_edges = m.trial_drug_edges,
        route_pct = m.route_coverage_pct,
        dosage_form_pct = m.dosage_form_coverage_pct,
        staged = %config.output.staged_dir.display(),
        "Run complete"
    );
    Ok(())
}
