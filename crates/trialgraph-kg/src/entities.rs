//! Organization and drug deduplication.
//!
//! Rows are grouped by normalized name. Each group becomes one node keyed
//! by a stable ID; the raw name is the first one seen in input order.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;
use trialgraph_common::{DrugNode, InterventionRecord, OrganizationNode, SponsorRecord, StableId};

use crate::normalize::normalize_str;
use crate::stable_id::{generate_id, EntityCategory};

/// Which intervention types count as drugs. Matching ignores ASCII case;
/// an empty list accepts every type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterventionFilter {
    pub drug_types: Vec<String>,
}

impl Default for InterventionFilter {
    fn default() -> Self {
        Self {
            drug_types: vec!["Drug".into(), "Biological".into(), "Biological/Vaccine".into()],
        }
    }
}

impl InterventionFilter {
    pub fn accept_all() -> Self {
        Self { drug_types: Vec::new() }
    }

    pub fn accepts(&self, intervention_type: Option<&str>) -> bool {
        if self.drug_types.is_empty() {
            return true;
        }
        match intervention_type.map(str::trim) {
            Some(t) => self.drug_types.iter().any(|d| d.trim().eq_ignore_ascii_case(t)),
            None => false,
        }
    }
}

/// A sponsor row reduced to what nodes and edges need.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SponsorKey<'a> {
    pub nct_id: &'a str,
    pub raw_name: &'a str,
    pub record: &'a SponsorRecord,
}

/// An intervention row that passed the drug filter.
#[derive(Debug, Clone, Copy)]
pub(crate) struct DrugKey<'a> {
    pub nct_id: &'a str,
    pub raw_name: &'a str,
}

/// Sponsor rows with a registry ID and a name, in input order.
pub(crate) fn sponsor_keys(sponsors: &[SponsorRecord]) -> impl Iterator<Item = SponsorKey<'_>> {
    sponsors.iter().filter_map(|record| {
        let key = record.nct_id().zip(record.name.as_deref());
        if key.is_none() {
            debug!(?record, "Skipping sponsor row without registry ID or name");
        }
        key.map(|(nct_id, raw_name)| SponsorKey { nct_id, raw_name, record })
    })
}

/// Drug-typed intervention rows with a registry ID and a name, in input order.
pub(crate) fn drug_keys<'a>(
    filter: &'a InterventionFilter,
    interventions: &'a [InterventionRecord],
) -> impl Iterator<Item = DrugKey<'a>> + 'a {
    interventions
        .iter()
        .filter(move |rec| filter.accepts(rec.intervention_type.as_deref()))
        .filter_map(|rec| {
            let key = rec.nct_id().zip(rec.intervention_name.as_deref());
            if key.is_none() {
                debug!(?rec, "Skipping intervention row without registry ID or name");
            }
            key.map(|(nct_id, raw_name)| DrugKey { nct_id, raw_name })
        })
}

pub(crate) fn org_id(raw_name: &str) -> StableId {
    generate_id(EntityCategory::Organization, &normalize_str(raw_name))
}

pub(crate) fn drug_id(raw_name: &str) -> StableId {
    generate_id(EntityCategory::Drug, &normalize_str(raw_name))
}

/// Builds the deduplicated node tables.
#[derive(Debug, Clone, Default)]
pub struct EntityBuilder {
    filter: InterventionFilter,
}

impl EntityBuilder {
    pub fn new(filter: InterventionFilter) -> Self {
        Self { filter }
    }

    pub fn organizations(&self, sponsors: &[SponsorRecord]) -> Vec<OrganizationNode> {
        let mut nodes: Vec<OrganizationNode> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for key in sponsor_keys(sponsors) {
            let name_norm = normalize_str(key.raw_name);
            let agency_class = key
                .record
                .agency_class
                .as_deref()
                .filter(|c| !c.trim().is_empty())
                .map(str::to_string);

            match index.get(&name_norm) {
                Some(&i) => {
                    let node = &mut nodes[i];
                    if node.agency_class.is_none() {
                        node.agency_class = agency_class;
                    }
                }
                None => {
                    index.insert(name_norm.clone(), nodes.len());
                    nodes.push(OrganizationNode {
                        org_id: org_id(key.raw_name),
                        name_norm,
                        name_raw: key.raw_name.to_string(),
                        agency_class,
                    });
                }
            }
        }
        debug!(organizations = nodes.len(), "Built organization nodes");
        nodes
    }

    pub fn drugs(&self, interventions: &[InterventionRecord]) -> Vec<DrugNode> {
        let mut nodes: Vec<DrugNode> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for key in drug_keys(&self.filter, interventions) {
            let name_norm = normalize_str(key.raw_name);
            if index.contains_key(&name_norm) {
                continue;
            }
            index.insert(name_norm.clone(), nodes.len());
            nodes.push(DrugNode {
                drug_id: drug_id(key.raw_name),
                name_norm,
                name_raw: key.raw_name.to_string(),
            });
        }
        debug!(drugs = nodes.len(), "Built drug nodes");
        nodes
    }
}
