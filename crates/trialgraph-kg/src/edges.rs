//! Trial ↔ organization and trial ↔ drug edges.
//!
//! IDs come from the same row filters and normalization key as the node
//! tables, so every edge endpoint exists on the node side.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use tracing::{debug, warn};
use trialgraph_common::{InterventionRecord, Role, SponsorRecord, StableId, TrialDrugEdge, TrialOrgEdge};

use crate::entities::{drug_id, drug_keys, org_id, sponsor_keys, InterventionFilter};

/// Map the source role flag onto a [`Role`].
///
/// Anything other than `lead` becomes a collaborator.
pub fn classify_role(raw: Option<&str>) -> Role {
    match raw.map(|r| r.trim().to_ascii_lowercase()).as_deref() {
        Some("lead") => Role::Sponsor,
        _ => Role::Collaborator,
    }
}

fn is_known_role(raw: Option<&str>) -> bool {
    raw.map(|r| {
        let r = r.trim();
        r.eq_ignore_ascii_case("lead") || r.eq_ignore_ascii_case("collaborator")
    })
    .unwrap_or(false)
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EdgeTables {
    pub trial_org: Vec<TrialOrgEdge>,
    pub trial_drug: Vec<TrialDrugEdge>,
}

/// Rows that did not become edges, or became edges by fallback.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EdgeReport {
    pub unrecognized_roles: usize,
    pub extra_sponsors_demoted: usize,
    pub unknown_trial_rows: usize,
}

#[derive(Debug, Clone, Default)]
pub struct EdgeBuilder {
    filter: InterventionFilter,
}

impl EdgeBuilder {
    pub fn new(filter: InterventionFilter) -> Self {
        Self { filter }
    }

    /// Build both edge tables for the trials in `trial_ids`.
    pub fn build(
        &self,
        trial_ids: &HashSet<&str>,
        sponsors: &[SponsorRecord],
        interventions: &[InterventionRecord],
    ) -> (EdgeTables, EdgeReport) {
        let mut report = EdgeReport::default();
        let trial_org = self.org_edges(trial_ids, sponsors, &mut report);
        let trial_drug = self.drug_edges(trial_ids, interventions, &mut report);

        if report.unrecognized_roles > 0 {
            warn!(rows = report.unrecognized_roles, "Unrecognized sponsor roles classified as COLLABORATOR");
        }
        if report.extra_sponsors_demoted > 0 {
            warn!(rows = report.extra_sponsors_demoted, "Additional lead sponsors recorded as collaborators");
        }
        if report.unknown_trial_rows > 0 {
            warn!(rows = report.unknown_trial_rows, "Skipped association rows for unknown trials");
        }
        (EdgeTables { trial_org, trial_drug }, report)
    }

    fn org_edges(
        &self,
        trial_ids: &HashSet<&str>,
        sponsors: &[SponsorRecord],
        report: &mut EdgeReport,
    ) -> Vec<TrialOrgEdge> {
        let mut edges = Vec::new();
        let mut seen: HashSet<TrialOrgEdge> = HashSet::new();
        let mut lead_of: HashMap<&str, StableId> = HashMap::new();

        for key in sponsor_keys(sponsors) {
            if !trial_ids.contains(key.nct_id) {
                report.unknown_trial_rows += 1;
                continue;
            }
            let flag = key.record.lead_or_collaborator.as_deref();
            if !is_known_role(flag) {
                debug!(nct_id = key.nct_id, role = ?flag, "Unrecognized sponsor role");
                report.unrecognized_roles += 1;
            }
            let mut role = classify_role(flag);
            let org_id = org_id(key.raw_name);

            if role == Role::Sponsor {
                match lead_of.get(key.nct_id) {
                    Some(existing) if *existing != org_id => {
                        warn!(nct_id = key.nct_id, sponsor = key.raw_name, "Trial already has a lead sponsor, recording as collaborator");
                        report.extra_sponsors_demoted += 1;
                        role = Role::Collaborator;
                    }
                    Some(_) => {}
                    None => {
                        lead_of.insert(key.nct_id, org_id.clone());
                    }
                }
            }

            let edge = TrialOrgEdge { nct_id: key.nct_id.to_string(), org_id, role };
            if seen.insert(edge.clone()) {
                edges.push(edge);
            }
        }
        edges
    }

    fn drug_edges(
        &self,
        trial_ids: &HashSet<&str>,
        interventions: &[InterventionRecord],
        report: &mut EdgeReport,
    ) -> Vec<TrialDrugEdge> {
        let mut edges = Vec::new();
        let mut seen: HashSet<TrialDrugEdge> = HashSet::new();

        for key in drug_keys(&self.filter, interventions) {
            if !trial_ids.contains(key.nct_id) {
                report.unknown_trial_rows += 1;
                continue;
            }
            let edge = TrialDrugEdge { nct_id: key.nct_id.to_string(), drug_id: drug_id(key.raw_name) };
            if seen.insert(edge.clone()) {
                edges.push(edge);
            }
        }
        edges
    }
}
