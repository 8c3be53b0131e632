//! Raw snapshot → graph dataset.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use trialgraph_common::{
    DrugNode, InterventionRecord, OrganizationNode, Phase, RawSnapshot, Result, StudyRecord,
    TrialDrugEdge, TrialGraphError, TrialNode, TrialOrgEdge, TrialStatus,
};

use crate::edges::{EdgeBuilder, EdgeReport};
use crate::entities::{EntityBuilder, InterventionFilter};
use crate::extraction::{ExtractionRules, RouteDosageExtractor};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransformOptions {
    #[serde(default)]
    pub extraction: ExtractionRules,
    #[serde(default)]
    pub interventions: InterventionFilter,
}

/// Row counts and extraction coverage for one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransformMetrics {
    pub trials: usize,
    pub organizations: usize,
    pub drugs: usize,
    pub trial_org_edges: usize,
    pub trial_drug_edges: usize,
    pub trials_with_route: usize,
    pub trials_with_dosage_form: usize,
    pub route_coverage_pct: f64,
    pub dosage_form_coverage_pct: f64,
    pub studies_missing_id: usize,
    pub duplicate_studies: usize,
    pub unknown_phases: usize,
    pub unrecognized_roles: usize,
    pub extra_sponsors_demoted: usize,
    pub unknown_trial_rows: usize,
}

/// The five output tables plus their metrics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphDataset {
    pub trials: Vec<TrialNode>,
    pub organizations: Vec<OrganizationNode>,
    pub drugs: Vec<DrugNode>,
    pub trial_org_edges: Vec<TrialOrgEdge>,
    pub trial_drug_edges: Vec<TrialDrugEdge>,
    pub metrics: TransformMetrics,
}

impl GraphDataset {
    pub fn is_empty(&self) -> bool {
        self.trials.is_empty()
    }
}

/// Build all graph tables from a filtered snapshot.
///
/// An empty snapshot yields empty tables. A status that is missing or
/// unknown fails the run with [`TrialGraphError::ContractViolation`];
/// an unknown phase is left absent and counted.
#[instrument(skip_all, fields(studies = snapshot.studies.len()))]
pub fn transform(snapshot: &RawSnapshot, options: &TransformOptions) -> Result<GraphDataset> {
    let extractor = RouteDosageExtractor::new(options.extraction.clone())?;

    let mut by_trial: HashMap<&str, Vec<&InterventionRecord>> = HashMap::new();
    for rec in &snapshot.interventions {
        if let Some(id) = rec.nct_id() {
            by_trial.entry(id).or_default().push(rec);
        }
    }

    let mut metrics = TransformMetrics::default();
    let mut trials = Vec::with_capacity(snapshot.studies.len());
    let mut trial_ids: HashSet<&str> = HashSet::new();

    for study in &snapshot.studies {
        let Some(nct_id) = study.nct_id() else {
            metrics.studies_missing_id += 1;
            continue;
        };
        if !trial_ids.insert(nct_id) {
            warn!(nct_id, "Duplicate study row, keeping the first");
            metrics.duplicate_studies += 1;
            continue;
        }
        let (route, dosage_form) = extractor.aggregate(
            by_trial.get(nct_id).into_iter().flatten().copied(),
        );
        trials.push(build_trial(nct_id, study, route, dosage_form, &mut metrics)?);
    }
    if metrics.studies_missing_id > 0 {
        warn!(rows = metrics.studies_missing_id, "Dropped study rows without a registry ID");
    }

    let known = |id: Option<&str>| id.is_some_and(|id| trial_ids.contains(id));
    let sponsors: Vec<_> = snapshot.sponsors.iter().filter(|s| known(s.nct_id())).cloned().collect();
    let interventions: Vec<_> = snapshot.interventions.iter().filter(|i| known(i.nct_id())).cloned().collect();

    let entities = EntityBuilder::new(options.interventions.clone());
    let organizations = entities.organizations(&sponsors);
    let drugs = entities.drugs(&interventions);

    let (edges, edge_report) = EdgeBuilder::new(options.interventions.clone())
        .build(&trial_ids, &snapshot.sponsors, &snapshot.interventions);

    fill_metrics(&mut metrics, &trials, &organizations, &drugs, &edges.trial_org, &edges.trial_drug, &edge_report);
    log_metrics(&metrics);

    Ok(GraphDataset {
        trials,
        organizations,
        drugs,
        trial_org_edges: edges.trial_org,
        trial_drug_edges: edges.trial_drug,
        metrics,
    })
}

fn build_trial(
    nct_id: &str,
    study: &StudyRecord,
    route: Option<String>,
    dosage_form: Option<String>,
    metrics: &mut TransformMetrics,
) -> Result<TrialNode> {
    let raw_status = study.overall_status.as_deref().unwrap_or_default();
    let status = TrialStatus::parse(raw_status).ok_or_else(|| TrialGraphError::ContractViolation {
        nct_id: nct_id.to_string(),
        field: "overall_status",
        value: raw_status.to_string(),
    })?;

    let phase = match present(study.phase.as_deref()) {
        None => None,
        Some(raw) => {
            let parsed = Phase::parse(raw);
            if parsed.is_none() {
                warn!(nct_id, phase = raw, "Unrecognized phase, leaving it absent");
                metrics.unknown_phases += 1;
            }
            parsed
        }
    };

    Ok(TrialNode {
        nct_id: nct_id.to_string(),
        title: study.brief_title.clone().unwrap_or_default(),
        phase,
        status,
        start_date: present(study.start_date.as_deref()).map(str::to_string),
        completion_date: present(study.completion_date.as_deref()).map(str::to_string),
        study_type: present(study.study_type.as_deref()).map(str::to_string),
        route,
        dosage_form,
    })
}

fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn fill_metrics(
    metrics: &mut TransformMetrics,
    trials: &[TrialNode],
    organizations: &[OrganizationNode],
    drugs: &[DrugNode],
    trial_org: &[TrialOrgEdge],
    trial_drug: &[TrialDrugEdge],
    edge_report: &EdgeReport,
) {
    metrics.trials = trials.len();
    metrics.organizations = organizations.len();
    metrics.drugs = drugs.len();
    metrics.trial_org_edges = trial_org.len();
    metrics.trial_drug_edges = trial_drug.len();
    metrics.trials_with_route = trials.iter().filter(|t| t.route.is_some()).count();
    metrics.trials_with_dosage_form = trials.iter().filter(|t| t.dosage_form.is_some()).count();
    metrics.route_coverage_pct = percent(metrics.trials_with_route, metrics.trials);
    metrics.dosage_form_coverage_pct = percent(metrics.trials_with_dosage_form, metrics.trials);
    metrics.unrecognized_roles = edge_report.unrecognized_roles;
    metrics.extra_sponsors_demoted = edge_report.extra_sponsors_demoted;
    metrics.unknown_trial_rows = edge_report.unknown_trial_rows;
}

/// Two-decimal percentage; zero when there are no trials.
fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    (part as f64 * 10_000.0 / whole as f64).round() / 100.0
}

fn log_metrics(m: &TransformMetrics) {
    info!(
        trials = m.trials,
        organizations = m.organizations,
        drugs = m.drugs,
        trial_org_edges = m.trial_org_edges,
        trial_drug_edges = m.trial_drug_edges,
        "Transformation complete"
    );
    info!(
        with_route = m.trials_with_route,
        route_pct = m.route_coverage_pct,
        with_dosage_form = m.trials_with_dosage_form,
        dosage_form_pct = m.dosage_form_coverage_pct,
        "Extraction coverage"
    );
}
