//! Ingestion entry point: resolve the three tables in an extracted AACT
//! directory, load them concurrently, and apply the eligibility filter.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use tracing::{info, instrument};
use trialgraph_common::{RawSnapshot, Result, TrialGraphError};

use crate::filter::{filter_snapshot, EligibilityCriteria, FilterReport};
use crate::sources::aact::{self, TableSpec};

/// Filtered snapshot plus the counts gathered on the way.
#[derive(Debug, Clone)]
pub struct IngestOutcome {
    pub snapshot: RawSnapshot,
    pub report: FilterReport,
}

/// Load and filter the AACT export found in `data_dir`.
#[instrument(skip(criteria))]
pub async fn ingest(data_dir: &Path, criteria: &EligibilityCriteria) -> Result<IngestOutcome> {
    if !data_dir.is_dir() {
        return Err(TrialGraphError::Pipeline(format!(
            "No extracted AACT data found in {}. Download the pipe-delimited export \
             from https://aact.ctti-clinicaltrials.org/downloads and extract it there.",
            data_dir.display()
        )));
    }

    let tables = aact::discover_tables(data_dir)?;
    let studies_path = aact::resolve_table(data_dir, &tables, aact::STUDIES.name)?;
    let sponsors_path = aact::resolve_table(data_dir, &tables, aact::SPONSORS.name)?;
    let interventions_path = aact::resolve_table(data_dir, &tables, aact::INTERVENTIONS.name)?;

    let (studies, sponsors, interventions) = tokio::try_join!(
        load_blocking(studies_path, aact::STUDIES),
        load_blocking(sponsors_path, aact::SPONSORS),
        load_blocking(interventions_path, aact::INTERVENTIONS),
    )?;

    let raw = RawSnapshot { studies, sponsors, interventions };
    let (snapshot, report) = filter_snapshot(raw, criteria);

    info!(
        studies = snapshot.studies.len(),
        sponsors = snapshot.sponsors.len(),
        interventions = snapshot.interventions.len(),
        "Ingestion complete"
    );

    Ok(IngestOutcome { snapshot, report })
}

async fn load_blocking<T>(path: PathBuf, spec: TableSpec) -> Result<Vec<T>>
where
    T: DeserializeOwned + Send + 'static,
{
    tokio::task::spawn_blocking(move || aact::load_table::<T>(&path, &spec))
        .await
        .map_err(|e| TrialGraphError::Pipeline(format!("loader task for {} failed: {e}", spec.name)))?
}
