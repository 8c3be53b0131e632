//! Eligibility filtering of the raw snapshot.
//!
//! A study is kept when it
//!   1. has at least one intervention row,
//!   2. has a phase in the configured phase list,
//!   3. has an overall status in the configured status list.
//! Sponsor and intervention rows are then restricted to the kept registry IDs.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use trialgraph_common::{Phase, RawSnapshot, TrialStatus};

/// Which studies make it into the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EligibilityCriteria {
    pub phases: Vec<Phase>,
    pub statuses: Vec<TrialStatus>,
    /// Target size of the filtered set; falling short is reported, not fatal.
    pub min_studies: usize,
}

impl Default for EligibilityCriteria {
    fn default() -> Self {
        Self {
            phases: vec![
                Phase::Phase1,
                Phase::Phase2,
                Phase::Phase3,
                Phase::Phase4,
                Phase::NotApplicable,
            ],
            statuses: vec![
                TrialStatus::Recruiting,
                TrialStatus::ActiveNotRecruiting,
                TrialStatus::Completed,
                TrialStatus::EnrollingByInvitation,
            ],
            min_studies: 500,
        }
    }
}

impl EligibilityCriteria {
    fn accepts_phase(&self, raw: Option<&str>) -> bool {
        raw.and_then(Phase::parse)
            .map(|p| self.phases.contains(&p))
            .unwrap_or(false)
    }

    fn accepts_status(&self, raw: Option<&str>) -> bool {
        raw.and_then(TrialStatus::parse)
            .map(|s| self.statuses.contains(&s))
            .unwrap_or(false)
    }
}

/// Counts gathered while filtering.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilterReport {
    pub studies_in: usize,
    pub studies_with_interventions: usize,
    pub studies_kept: usize,
    pub studies_missing_id: usize,
    pub sponsors_kept: usize,
    pub interventions_kept: usize,
    pub below_minimum: bool,
}

/// Apply the eligibility criteria to a raw snapshot.
pub fn filter_snapshot(snapshot: RawSnapshot, criteria: &EligibilityCriteria) -> (RawSnapshot, FilterReport) {
    let RawSnapshot { studies, sponsors, interventions } = snapshot;
    let mut report = FilterReport { studies_in: studies.len(), ..Default::default() };
    info!(studies = studies.len(), "Filtering studies");

    let with_interventions: HashSet<String> = interventions
        .iter()
        .filter_map(|i| i.nct_id().map(str::to_string))
        .collect();
    report.studies_with_interventions = with_interventions.len();
    info!(n = with_interventions.len(), "Found studies with interventions");

    let mut kept_studies = Vec::new();
    for study in studies {
        let Some(nct_id) = study.nct_id() else {
            report.studies_missing_id += 1;
            continue;
        };
        if with_interventions.contains(nct_id)
            && criteria.accepts_phase(study.phase.as_deref())
            && criteria.accepts_status(study.overall_status.as_deref())
        {
            kept_studies.push(study);
        }
    }
    if report.studies_missing_id > 0 {
        warn!(dropped = report.studies_missing_id, "Dropped study rows without a registry ID");
    }

    let kept_ids: HashSet<String> = kept_studies
        .iter()
        .filter_map(|s| s.nct_id().map(str::to_string))
        .collect();

    let sponsors: Vec<_> = sponsors
        .into_iter()
        .filter(|s| s.nct_id().is_some_and(|id| kept_ids.contains(id)))
        .collect();
    let interventions: Vec<_> = interventions
        .into_iter()
        .filter(|i| i.nct_id().is_some_and(|id| kept_ids.contains(id)))
        .collect();

    report.studies_kept = kept_studies.len();
    report.sponsors_kept = sponsors.len();
    report.interventions_kept = interventions.len();
    report.below_minimum = report.studies_kept < criteria.min_studies;

    if report.below_minimum {
        warn!(
            kept = report.studies_kept,
            target = criteria.min_studies,
            "Filtered set is below the configured minimum"
        );
    } else {
        info!(kept = report.studies_kept, target = criteria.min_studies, "Filtered set meets the configured minimum");
    }

    (RawSnapshot { studies: kept_studies, sponsors, interventions }, report)
}
