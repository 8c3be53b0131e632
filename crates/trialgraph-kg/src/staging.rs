//! On-disk staging of the graph tables.
//!
//! One JSON-Lines file per table plus `metrics.json`. Contents depend only
//! on the dataset, so identical inputs stage identical bytes.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;
use trialgraph_common::Result;

use crate::cypher::SCHEMA_STATEMENTS;
use crate::loader::{BatchKind, LoadBatch};
use crate::transform::GraphDataset;

pub const TRIALS_FILE: &str = "trials.jsonl";
pub const ORGANIZATIONS_FILE: &str = "organizations.jsonl";
pub const DRUGS_FILE: &str = "drugs.jsonl";
pub const TRIAL_ORG_EDGES_FILE: &str = "trial_org_edges.jsonl";
pub const TRIAL_DRUG_EDGES_FILE: &str = "trial_drug_edges.jsonl";
pub const METRICS_FILE: &str = "metrics.json";
pub const LOAD_PLAN_FILE: &str = "load_plan.json";

/// Paths written by [`write_staged`], in write order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StagedFiles {
    pub files: Vec<PathBuf>,
}

pub async fn write_staged(dataset: &GraphDataset, dir: &Path) -> Result<StagedFiles> {
    tokio::fs::create_dir_all(dir).await?;

    let mut staged = StagedFiles::default();
    staged.files.push(write_jsonl(dir, TRIALS_FILE, &dataset.trials).await?);
    staged.files.push(write_jsonl(dir, ORGANIZATIONS_FILE, &dataset.organizations).await?);
    staged.files.push(write_jsonl(dir, DRUGS_FILE, &dataset.drugs).await?);
    staged.files.push(write_jsonl(dir, TRIAL_ORG_EDGES_FILE, &dataset.trial_org_edges).await?);
    staged.files.push(write_jsonl(dir, TRIAL_DRUG_EDGES_FILE, &dataset.trial_drug_edges).await?);

    let metrics_path = dir.join(METRICS_FILE);
    tokio::fs::write(&metrics_path, serde_json::to_string_pretty(&dataset.metrics)?).await?;
    staged.files.push(metrics_path);

    info!(dir = %dir.display(), files = staged.files.len(), "Staged graph tables");
    Ok(staged)
}

async fn write_jsonl<T: Serialize>(dir: &Path, file: &str, rows: &[T]) -> Result<PathBuf> {
    let mut content = String::new();
    for row in rows {
        content.push_str(&serde_json::to_string(row)?);
        content.push('\n');
    }
    let path = dir.join(file);
    tokio::fs::write(&path, content).await?;
    Ok(path)
}

#[derive(Debug, Serialize)]
struct PlannedBatch<'a> {
    kind: BatchKind,
    rows: usize,
    statement: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    first_key: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct LoadPlanFile<'a> {
    schema: &'static [&'static str],
    batches: Vec<PlannedBatch<'a>>,
}

/// Describe a load plan as `load_plan.json`: schema statements, then each
/// batch's statement and row count. Row data stays in the staged tables.
pub async fn write_load_plan(plan: &[LoadBatch], dir: &Path) -> Result<PathBuf> {
    tokio::fs::create_dir_all(dir).await?;

    let file = LoadPlanFile {
        schema: SCHEMA_STATEMENTS,
        batches: plan
            .iter()
            .map(|batch| PlannedBatch {
                kind: batch.kind,
                rows: batch.rows.len(),
                statement: batch.statement(),
                first_key: batch.rows.first().and_then(|row| {
                    ["nct_id", "org_id", "drug_id"]
                        .iter()
                        .find_map(|k| row.get(*k).and_then(|v| v.as_str()))
                }),
            })
            .collect(),
    };
    let path = dir.join(LOAD_PLAN_FILE);
    tokio::fs::write(&path, serde_json::to_string_pretty(&file)?).await?;
    info!(path = %path.display(), batches = plan.len(), "Wrote load plan");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::plan_load;
    use trialgraph_common::{StableId, TrialDrugEdge};

    #[tokio::test]
    async fn test_empty_dataset_stages_empty_tables() {
        let dir = tempfile::tempdir().unwrap();
        let staged = write_staged(&GraphDataset::default(), dir.path()).await.unwrap();
        assert_eq!(staged.files.len(), 6);
        for path in &staged.files[..5] {
            assert_eq!(std::fs::read_to_string(path).unwrap(), "");
        }
        let metrics: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(dir.path().join(METRICS_FILE)).unwrap()).unwrap();
        assert_eq!(metrics["trials"], 0);
    }

    #[tokio::test]
    async fn test_one_row_per_line() {
        let dir = tempfile::tempdir().unwrap();
        let dataset = GraphDataset {
            trial_drug_edges: vec![
                TrialDrugEdge { nct_id: "NCT1".into(), drug_id: StableId::new("a") },
                TrialDrugEdge { nct_id: "NCT2".into(), drug_id: StableId::new("a") },
            ],
            ..Default::default()
        };
        write_staged(&dataset, dir.path()).await.unwrap();
        let text = std::fs::read_to_string(dir.path().join(TRIAL_DRUG_EDGES_FILE)).unwrap();
        assert_eq!(
            text,
            "{\"nct_id\":\"NCT1\",\"drug_id\":\"a\"}\n{\"nct_id\":\"NCT2\",\"drug_id\":\"a\"}\n"
        );
    }

    #[tokio::test]
    async fn test_load_plan_file() {
        let dir = tempfile::tempdir().unwrap();
        let dataset = GraphDataset {
            trial_drug_edges: vec![TrialDrugEdge { nct_id: "NCT1".into(), drug_id: StableId::new("a") }],
            ..Default::default()
        };
        let plan = plan_load(&dataset, 10).unwrap();
        let path = write_load_plan(&plan, dir.path()).await.unwrap();
        let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(json["schema"].as_array().unwrap().len(), SCHEMA_STATEMENTS.len());
        assert_eq!(json["batches"][0]["kind"], "tests_drug");
        assert_eq!(json["batches"][0]["rows"], 1);
        assert_eq!(json["batches"][0]["first_key"], "NCT1");
    }
}
