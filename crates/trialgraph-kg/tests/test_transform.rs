//! Graph construction over small in-memory snapshots.

use std::collections::HashSet;

use pretty_assertions::assert_eq;
use trialgraph_common::{InterventionRecord, RawSnapshot, Role, SponsorRecord, StudyRecord};
use trialgraph_kg::{transform, TransformOptions};

fn study(id: &str, phase: &str) -> StudyRecord {
    StudyRecord {
        nct_id: Some(id.into()),
        brief_title: Some(format!("Trial {id}")),
        phase: Some(phase.into()),
        overall_status: Some("RECRUITING".into()),
        start_date: None,
        completion_date: None,
        study_type: Some("INTERVENTIONAL".into()),
    }
}

fn sponsor(id: &str, name: &str, role: &str, class: &str) -> SponsorRecord {
    SponsorRecord {
        nct_id: Some(id.into()),
        name: Some(name.into()),
        agency_class: Some(class.into()),
        lead_or_collaborator: Some(role.into()),
    }
}

fn intervention(id: &str, name: &str, kind: &str) -> InterventionRecord {
    InterventionRecord {
        nct_id: Some(id.into()),
        intervention_name: Some(name.into()),
        intervention_type: Some(kind.into()),
    }
}

fn snapshot() -> RawSnapshot {
    RawSnapshot {
        studies: vec![study("NCT00000001", "PHASE2"), study("NCT00000002", "Phase 3"), study("NCT00000003", "NA")],
        sponsors: vec![
            sponsor("NCT00000001", "Pfizer Inc.", "lead", "INDUSTRY"),
            sponsor("NCT00000002", "  pfizer inc.  ", "lead", "INDUSTRY"),
            sponsor("NCT00000002", "National Cancer Institute", "collaborator", "NIH"),
            sponsor("NCT00000003", "Mayo Clinic", "lead", "OTHER"),
            sponsor("NCT00000003", "Some Foundation", "supporter", "OTHER"),
        ],
        interventions: vec![
            intervention("NCT00000001", "Aspirin", "DRUG"),
            intervention("NCT00000001", "Aspirin", "DRUG"),
            intervention("NCT00000002", "Drug X Oral Tablet", "Drug"),
            intervention("NCT00000002", "i.v. Drug Y", "Drug"),
            intervention("NCT00000003", "Walking program", "Behavioral"),
        ],
    }
}

#[test]
fn test_organization_dedup_across_trials() {
    let ds = transform(&snapshot(), &TransformOptions::default()).unwrap();
    let pfizer: Vec<_> = ds.organizations.iter().filter(|o| o.name_norm == "pfizer inc.").collect();
    assert_eq!(pfizer.len(), 1);
    assert_eq!(pfizer[0].name_raw, "Pfizer Inc.");
    assert_eq!(ds.organizations.len(), 4);
}

#[test]
fn test_duplicate_intervention_rows_yield_one_edge() {
    let ds = transform(&snapshot(), &TransformOptions::default()).unwrap();
    let aspirin = ds.drugs.iter().find(|d| d.name_norm == "aspirin").unwrap();
    let edges: Vec<_> = ds
        .trial_drug_edges
        .iter()
        .filter(|e| e.nct_id == "NCT00000001" && e.drug_id == aspirin.drug_id)
        .collect();
    assert_eq!(edges.len(), 1);
}

#[test]
fn test_behavioral_interventions_are_not_drugs() {
    let ds = transform(&snapshot(), &TransformOptions::default()).unwrap();
    assert!(ds.drugs.iter().all(|d| d.name_norm != "walking program"));
    assert!(ds.trial_drug_edges.iter().all(|e| e.nct_id != "NCT00000003"));
}

#[test]
fn test_unrecognized_role_is_collaborator() {
    let ds = transform(&snapshot(), &TransformOptions::default()).unwrap();
    let foundation = ds.organizations.iter().find(|o| o.name_norm == "some foundation").unwrap();
    let edge = ds.trial_org_edges.iter().find(|e| e.org_id == foundation.org_id).unwrap();
    assert_eq!(edge.role, Role::Collaborator);
    assert_eq!(ds.metrics.unrecognized_roles, 1);
}

#[test]
fn test_referential_integrity() {
    let ds = transform(&snapshot(), &TransformOptions::default()).unwrap();
    let trials: HashSet<_> = ds.trials.iter().map(|t| t.nct_id.as_str()).collect();
    let orgs: HashSet<_> = ds.organizations.iter().map(|o| &o.org_id).collect();
    let drugs: HashSet<_> = ds.drugs.iter().map(|d| &d.drug_id).collect();
    for edge in &ds.trial_org_edges {
        assert!(trials.contains(edge.nct_id.as_str()));
        assert!(orgs.contains(&edge.org_id), "dangling org {}", edge.org_id);
    }
    for edge in &ds.trial_drug_edges {
        assert!(trials.contains(edge.nct_id.as_str()));
        assert!(drugs.contains(&edge.drug_id), "dangling drug {}", edge.drug_id);
    }
}

#[test]
fn test_route_and_dosage_on_trials() {
    let ds = transform(&snapshot(), &TransformOptions::default()).unwrap();
    let t2 = ds.trials.iter().find(|t| t.nct_id == "NCT00000002").unwrap();
    assert_eq!(t2.route.as_deref(), Some("oral"));
    assert_eq!(t2.dosage_form.as_deref(), Some("tablet"));
    let t1 = ds.trials.iter().find(|t| t.nct_id == "NCT00000001").unwrap();
    assert_eq!((t1.route.as_deref(), t1.dosage_form.as_deref()), (None, None));

    assert_eq!(ds.metrics.trials_with_route, 1);
    assert_eq!(ds.metrics.route_coverage_pct, 33.33);
}

#[test]
fn test_one_sponsor_edge_per_trial() {
    let ds = transform(&snapshot(), &TransformOptions::default()).unwrap();
    for trial in &ds.trials {
        let sponsors = ds
            .trial_org_edges
            .iter()
            .filter(|e| e.nct_id == trial.nct_id && e.role == Role::Sponsor)
            .count();
        assert!(sponsors <= 1, "{} has {sponsors} sponsors", trial.nct_id);
    }
}

#[test]
fn test_empty_input_yields_empty_tables() {
    let ds = transform(&RawSnapshot::default(), &TransformOptions::default()).unwrap();
    assert!(ds.is_empty());
    assert!(ds.organizations.is_empty());
    assert!(ds.drugs.is_empty());
    assert!(ds.trial_org_edges.is_empty());
    assert!(ds.trial_drug_edges.is_empty());
    assert_eq!(ds.metrics.route_coverage_pct, 0.0);
}

#[test]
fn test_rows_for_filtered_out_trials_are_ignored() {
    let mut snap = snapshot();
    snap.sponsors.push(sponsor("NCT99999999", "Ghost Pharma", "lead", "INDUSTRY"));
    snap.interventions.push(intervention("NCT99999999", "Ghostamab", "Biological"));
    let ds = transform(&snap, &TransformOptions::default()).unwrap();
    assert!(ds.organizations.iter().all(|o| o.name_norm != "ghost pharma"));
    assert!(ds.drugs.iter().all(|d| d.name_norm != "ghostamab"));
    assert_eq!(ds.metrics.unknown_trial_rows, 2);
}

#[test]
fn test_every_organization_has_an_edge() {
    let mut snap = snapshot();
    snap.sponsors.push(sponsor("NCT00000001", "Other Pharma", "lead", "INDUSTRY"));
    let ds = transform(&snap, &TransformOptions::default()).unwrap();

    let referenced: HashSet<_> = ds.trial_org_edges.iter().map(|e| &e.org_id).collect();
    for org in &ds.organizations {
        assert!(referenced.contains(&org.org_id), "{} has no edge", org.name_norm);
    }
    let other = ds.organizations.iter().find(|o| o.name_norm == "other pharma").unwrap();
    let edge = ds.trial_org_edges.iter().find(|e| e.org_id == other.org_id).unwrap();
    assert_eq!(edge.role, Role::Collaborator);
    assert_eq!(ds.metrics.extra_sponsors_demoted, 1);
}

#[test]
fn test_unrecognized_phase_keeps_the_run() {
    let mut snap = snapshot();
    snap.studies[1].phase = Some("Phase 1b".into());
    let ds = transform(&snap, &TransformOptions::default()).unwrap();
    assert_eq!(ds.trials.len(), 3);
    let t2 = ds.trials.iter().find(|t| t.nct_id == "NCT00000002").unwrap();
    assert_eq!(t2.phase, None);
    assert_eq!(ds.metrics.unknown_phases, 1);
}
