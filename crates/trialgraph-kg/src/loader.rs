//! Batch load planning and the graph sink seam.
//!
//! The database driver lives outside this crate. [`GraphSink`] is the
//! contract it implements: schema statements first, then batches of rows
//! that are merged by unique key.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};
use trialgraph_common::{Result, Role, TrialDrugEdge, TrialGraphError};

use crate::cypher;
use crate::transform::GraphDataset;

/// One statement family. Declaration order is load order: nodes before edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchKind {
    Trials,
    Organizations,
    Drugs,
    SponsoredBy,
    CollaboratesWith,
    TestsDrug,
}

impl BatchKind {
    pub fn statement(&self) -> &'static str {
        match self {
            BatchKind::Trials           => cypher::MERGE_TRIALS,
            BatchKind::Organizations    => cypher::MERGE_ORGANIZATIONS,
            BatchKind::Drugs            => cypher::MERGE_DRUGS,
            BatchKind::SponsoredBy      => cypher::MERGE_SPONSORED_BY,
            BatchKind::CollaboratesWith => cypher::MERGE_COLLABORATES_WITH,
            BatchKind::TestsDrug        => cypher::MERGE_TESTS_DRUG,
        }
    }

    /// Relationship type merged by this batch; `None` for node batches.
    pub fn relationship(&self) -> Option<&'static str> {
        match self {
            BatchKind::SponsoredBy      => Some(Role::Sponsor.relationship()),
            BatchKind::CollaboratesWith => Some(Role::Collaborator.relationship()),
            BatchKind::TestsDrug        => Some(TrialDrugEdge::RELATIONSHIP),
            _                           => None,
        }
    }
}

/// Rows for one `UNWIND $rows` execution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadBatch {
    pub kind: BatchKind,
    pub rows: Vec<Value>,
}

impl LoadBatch {
    pub fn statement(&self) -> &'static str {
        self.kind.statement()
    }
}

/// Split the dataset into batches of at most `batch_size` rows.
pub fn plan_load(dataset: &GraphDataset, batch_size: usize) -> Result<Vec<LoadBatch>> {
    if batch_size == 0 {
        return Err(TrialGraphError::Config("batch_size must be at least 1".into()));
    }

    let (sponsored, collaborating): (Vec<_>, Vec<_>) = dataset
        .trial_org_edges
        .iter()
        .partition(|edge| edge.role == Role::Sponsor);

    let mut plan = Vec::new();
    push_batches(&mut plan, BatchKind::Trials, &dataset.trials, batch_size)?;
    push_batches(&mut plan, BatchKind::Organizations, &dataset.organizations, batch_size)?;
    push_batches(&mut plan, BatchKind::Drugs, &dataset.drugs, batch_size)?;
    push_batches(&mut plan, BatchKind::SponsoredBy, &sponsored, batch_size)?;
    push_batches(&mut plan, BatchKind::CollaboratesWith, &collaborating, batch_size)?;
    push_batches(&mut plan, BatchKind::TestsDrug, &dataset.trial_drug_edges, batch_size)?;
    Ok(plan)
}

fn push_batches<T: Serialize>(
    plan: &mut Vec<LoadBatch>,
    kind: BatchKind,
    rows: &[T],
    batch_size: usize,
) -> Result<()> {
    for chunk in rows.chunks(batch_size) {
        let rows = chunk
            .iter()
            .map(serde_json::to_value)
            .collect::<serde_json::Result<Vec<_>>>()?;
        plan.push(LoadBatch { kind, rows });
    }
    Ok(())
}

/// Target store with merge-by-key semantics.
#[async_trait]
pub trait GraphSink: Send + Sync {
    /// Create constraints and indexes. Must be safe to repeat.
    async fn apply_schema(&self, statements: &[&str]) -> Result<()>;

    /// Merge one batch, returning how many rows matched or created something.
    async fn execute(&self, batch: &LoadBatch) -> Result<usize>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub batches: usize,
    pub rows_sent: usize,
    pub rows_merged: usize,
}

/// Apply the schema and every planned batch to `sink`, in order.
#[instrument(skip_all, fields(batch_size = batch_size))]
pub async fn load_dataset<S>(sink: &S, dataset: &GraphDataset, batch_size: usize) -> Result<LoadReport>
where
    S: GraphSink + ?Sized,
{
    sink.apply_schema(cypher::SCHEMA_STATEMENTS).await?;

    let plan = plan_load(dataset, batch_size)?;
    let mut report = LoadReport::default();
    for batch in &plan {
        let merged = sink.execute(batch).await?;
        debug!(kind = ?batch.kind, rows = batch.rows.len(), merged, "Batch applied");
        report.batches += 1;
        report.rows_sent += batch.rows.len();
        report.rows_merged += merged;
    }
    info!(batches = report.batches, rows = report.rows_sent, merged = report.rows_merged, "Load complete");
    Ok(report)
}

// ---------------------------------------------------------------------------
// In-memory sink
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Label {
    Trial,
    Organization,
    Drug,
}

#[derive(Debug, Default)]
struct GraphState {
    schema: BTreeSet<String>,
    nodes: BTreeMap<(Label, String), Value>,
    relationships: BTreeSet<(&'static str, String, String)>,
}

/// Node and relationship totals held by an [`InMemoryGraph`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraphCounts {
    pub trials: usize,
    pub organizations: usize,
    pub drugs: usize,
    pub sponsored_by: usize,
    pub collaborates_with: usize,
    pub tests_drug: usize,
}

/// A [`GraphSink`] that keeps the graph in process memory. It follows
/// the batch statements: nodes MERGE on their key and overwrite
/// properties, relationships MATCH both endpoints before MERGE.
#[derive(Debug, Default)]
pub struct InMemoryGraph {
    state: Mutex<GraphState>,
}

impl InMemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn counts(&self) -> GraphCounts {
        let state = self.state.lock().await;
        let nodes = |label| state.nodes.keys().filter(|(l, _)| *l == label).count();
        let rels = |rel| state.relationships.iter().filter(|(r, _, _)| *r == rel).count();
        GraphCounts {
            trials: nodes(Label::Trial),
            organizations: nodes(Label::Organization),
            drugs: nodes(Label::Drug),
            sponsored_by: rels(Role::Sponsor.relationship()),
            collaborates_with: rels(Role::Collaborator.relationship()),
            tests_drug: rels(TrialDrugEdge::RELATIONSHIP),
        }
    }

    pub async fn node(&self, label: &str, key: &str) -> Option<Value> {
        let label = match label {
            "Trial" => Label::Trial,
            "Organization" => Label::Organization,
            "Drug" => Label::Drug,
            _ => return None,
        };
        self.state.lock().await.nodes.get(&(label, key.to_string())).cloned()
    }

    pub async fn schema_len(&self) -> usize {
        self.state.lock().await.schema.len()
    }
}

fn key_of(row: &Value, field: &str, kind: BatchKind) -> Result<String> {
    row.get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| TrialGraphError::Pipeline(format!("{kind:?} row without '{field}'")))
}

#[async_trait]
impl GraphSink for InMemoryGraph {
    async fn apply_schema(&self, statements: &[&str]) -> Result<()> {
        let mut state = self.state.lock().await;
        state.schema.extend(statements.iter().map(|s| s.to_string()));
        Ok(())
    }

    async fn execute(&self, batch: &LoadBatch) -> Result<usize> {
        let mut state = self.state.lock().await;
        let mut merged = 0;

        let node_target = match batch.kind {
            BatchKind::Trials        => Some((Label::Trial, "nct_id")),
            BatchKind::Organizations => Some((Label::Organization, "org_id")),
            BatchKind::Drugs         => Some((Label::Drug, "drug_id")),
            _ => None,
        };
        if let Some((label, key_field)) = node_target {
            for row in &batch.rows {
                let key = key_of(row, key_field, batch.kind)?;
                state.nodes.insert((label, key), row.clone());
                merged += 1;
            }
            return Ok(merged);
        }

        let Some(rel) = batch.kind.relationship() else {
            return Ok(merged);
        };
        let (label, key_field) = match batch.kind {
            BatchKind::TestsDrug => (Label::Drug, "drug_id"),
            _                    => (Label::Organization, "org_id"),
        };
        for row in &batch.rows {
            let trial = key_of(row, "nct_id", batch.kind)?;
            let target = key_of(row, key_field, batch.kind)?;
            let endpoints_exist = state.nodes.contains_key(&(Label::Trial, trial.clone()))
                && state.nodes.contains_key(&(label, target.clone()));
            if endpoints_exist {
                state.relationships.insert((rel, trial, target));
                merged += 1;
            }
        }
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trialgraph_common::{StableId, TrialOrgEdge};

    fn edges_dataset() -> GraphDataset {
        GraphDataset {
            trial_org_edges: vec![
                TrialOrgEdge { nct_id: "NCT1".into(), org_id: StableId::new("a"), role: Role::Collaborator },
                TrialOrgEdge { nct_id: "NCT1".into(), org_id: StableId::new("b"), role: Role::Sponsor },
                TrialOrgEdge { nct_id: "NCT2".into(), org_id: StableId::new("a"), role: Role::Collaborator },
            ],
            trial_drug_edges: vec![TrialDrugEdge { nct_id: "NCT1".into(), drug_id: StableId::new("d") }],
            ..Default::default()
        }
    }

    #[test]
    fn test_plan_splits_by_role_and_size() {
        let plan = plan_load(&edges_dataset(), 1).unwrap();
        let kinds: Vec<_> = plan.iter().map(|b| b.kind).collect();
        assert_eq!(
            kinds,
            vec![BatchKind::SponsoredBy, BatchKind::CollaboratesWith, BatchKind::CollaboratesWith, BatchKind::TestsDrug]
        );
        assert_eq!(plan[0].rows[0]["org_id"], "b");
    }

    #[test]
    fn test_statements_use_relationship_names() {
        for kind in [BatchKind::SponsoredBy, BatchKind::CollaboratesWith, BatchKind::TestsDrug] {
            let rel = kind.relationship().unwrap();
            assert!(kind.statement().contains(&format!("[:{rel}]")), "{kind:?}");
        }
        assert_eq!(BatchKind::Trials.relationship(), None);
    }

    #[test]
    fn test_plan_rejects_zero_batch_size() {
        assert!(matches!(plan_load(&GraphDataset::default(), 0), Err(TrialGraphError::Config(_))));
    }

    #[test]
    fn test_empty_dataset_has_empty_plan() {
        assert!(plan_load(&GraphDataset::default(), 100).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_relationships_need_both_endpoints() {
        let graph = InMemoryGraph::new();
        let report = load_dataset(&graph, &edges_dataset(), 10).await.unwrap();
        assert_eq!(report.rows_sent, 4);
        assert_eq!(report.rows_merged, 0);
        assert_eq!(graph.counts().await, GraphCounts::default());
    }

    #[tokio::test]
    async fn test_node_row_missing_key_is_error() {
        let graph = InMemoryGraph::new();
        let batch = LoadBatch { kind: BatchKind::Trials, rows: vec![serde_json::json!({"title": "x"})] };
        assert!(matches!(graph.execute(&batch).await, Err(TrialGraphError::Pipeline(_))));
    }
}
