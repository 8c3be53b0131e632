//! Raw AACT rows as they arrive from the pipe-delimited export.
//!
//! Every column is optional: empty delimited fields deserialize to `None`,
//! and it is up to the consumer to decide which absences are fatal.

use serde::{Deserialize, Serialize};

/// One row of `studies.txt`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StudyRecord {
    pub nct_id: Option<String>,
    pub brief_title: Option<String>,
    pub phase: Option<String>,
    pub overall_status: Option<String>,
    pub start_date: Option<String>,
    pub completion_date: Option<String>,
    pub study_type: Option<String>,
}

/// One row of `sponsors.txt`: a trial ↔ organization association.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SponsorRecord {
    pub nct_id: Option<String>,
    pub name: Option<String>,
    pub agency_class: Option<String>,
    /// `lead` or `collaborator` in well-formed exports.
    pub lead_or_collaborator: Option<String>,
}

/// One row of `interventions.txt`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InterventionRecord {
    pub nct_id: Option<String>,
    // Current exports call this column `name`.
    #[serde(alias = "name")]
    pub intervention_name: Option<String>,
    pub intervention_type: Option<String>,
}

impl StudyRecord {
    pub fn nct_id(&self) -> Option<&str> { non_blank(self.nct_id.as_deref()) }
}

impl SponsorRecord {
    pub fn nct_id(&self) -> Option<&str> { non_blank(self.nct_id.as_deref()) }
}

impl InterventionRecord {
    pub fn nct_id(&self) -> Option<&str> { non_blank(self.nct_id.as_deref()) }
}

/// The three filtered tables handed to the transformation layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSnapshot {
    pub studies: Vec<StudyRecord>,
    pub sponsors: Vec<SponsorRecord>,
    pub interventions: Vec<InterventionRecord>,
}

impl RawSnapshot {
    pub fn is_empty(&self) -> bool {
        self.studies.is_empty()
    }
}

/// Registry IDs are keys: surrounding whitespace is stripped and a blank key counts as absent.
fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
