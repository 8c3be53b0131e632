//! Output row types mirroring the property-graph schema.
//! These are the tables handed to the loading stage.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    #[serde(rename = "Early Phase 1")]
    EarlyPhase1,
    #[serde(rename = "Phase 1")]
    Phase1,
    #[serde(rename = "Phase 1/Phase 2")]
    Phase1Phase2,
    #[serde(rename = "Phase 2")]
    Phase2,
    #[serde(rename = "Phase 2/Phase 3")]
    Phase2Phase3,
    #[serde(rename = "Phase 3")]
    Phase3,
    #[serde(rename = "Phase 4")]
    Phase4,
    #[serde(rename = "Not Applicable")]
    NotApplicable,
}

impl Phase {
    /// Parse either the legacy (`Phase 1/Phase 2`) or current (`PHASE1/PHASE2`) spelling.
    pub fn parse(raw: &str) -> Option<Self> {
        let key: String = raw
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_')
            .collect::<String>()
            .to_ascii_uppercase();
        match key.as_str() {
            "EARLYPHASE1"              => Some(Phase::EarlyPhase1),
            "PHASE1"                   => Some(Phase::Phase1),
            "PHASE1/PHASE2"            => Some(Phase::Phase1Phase2),
            "PHASE2"                   => Some(Phase::Phase2),
            "PHASE2/PHASE3"            => Some(Phase::Phase2Phase3),
            "PHASE3"                   => Some(Phase::Phase3),
            "PHASE4"                   => Some(Phase::Phase4),
            "NA" | "N/A" | "NOTAPPLICABLE" => Some(Phase::NotApplicable),
            _                          => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::EarlyPhase1   => "Early Phase 1",
            Phase::Phase1        => "Phase 1",
            Phase::Phase1Phase2  => "Phase 1/Phase 2",
            Phase::Phase2        => "Phase 2",
            Phase::Phase2Phase3  => "Phase 2/Phase 3",
            Phase::Phase3        => "Phase 3",
            Phase::Phase4        => "Phase 4",
            Phase::NotApplicable => "Not Applicable",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Overall status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrialStatus {
    NotYetRecruiting,
    Recruiting,
    EnrollingByInvitation,
    ActiveNotRecruiting,
    Suspended,
    Terminated,
    Completed,
    Withdrawn,
    Unknown,
    Withheld,
    Available,
    NoLongerAvailable,
    TemporarilyNotAvailable,
    ApprovedForMarketing,
}

impl TrialStatus {
    /// Parse `ACTIVE_NOT_RECRUITING` as well as `Active, not recruiting`.
    pub fn parse(raw: &str) -> Option<Self> {
        let key = raw
            .trim()
            .to_ascii_uppercase()
            .replace(", ", "_")
            .replace([' ', '-', ','], "_");
        match key.as_str() {
            "NOT_YET_RECRUITING"         => Some(TrialStatus::NotYetRecruiting),
            "RECRUITING"                 => Some(TrialStatus::Recruiting),
            "ENROLLING_BY_INVITATION"    => Some(TrialStatus::EnrollingByInvitation),
            "ACTIVE_NOT_RECRUITING"      => Some(TrialStatus::ActiveNotRecruiting),
            "SUSPENDED"                  => Some(TrialStatus::Suspended),
            "TERMINATED"                 => Some(TrialStatus::Terminated),
            "COMPLETED"                  => Some(TrialStatus::Completed),
            "WITHDRAWN"                  => Some(TrialStatus::Withdrawn),
            "UNKNOWN" | "UNKNOWN_STATUS" => Some(TrialStatus::Unknown),
            "WITHHELD"                   => Some(TrialStatus::Withheld),
            "AVAILABLE"                  => Some(TrialStatus::Available),
            "NO_LONGER_AVAILABLE"        => Some(TrialStatus::NoLongerAvailable),
            "TEMPORARILY_NOT_AVAILABLE"  => Some(TrialStatus::TemporarilyNotAvailable),
            "APPROVED_FOR_MARKETING"     => Some(TrialStatus::ApprovedForMarketing),
            _                            => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TrialStatus::NotYetRecruiting        => "NOT_YET_RECRUITING",
            TrialStatus::Recruiting              => "RECRUITING",
            TrialStatus::EnrollingByInvitation   => "ENROLLING_BY_INVITATION",
            TrialStatus::ActiveNotRecruiting     => "ACTIVE_NOT_RECRUITING",
            TrialStatus::Suspended               => "SUSPENDED",
            TrialStatus::Terminated              => "TERMINATED",
            TrialStatus::Completed               => "COMPLETED",
            TrialStatus::Withdrawn               => "WITHDRAWN",
            TrialStatus::Unknown                 => "UNKNOWN",
            TrialStatus::Withheld                => "WITHHELD",
            TrialStatus::Available               => "AVAILABLE",
            TrialStatus::NoLongerAvailable       => "NO_LONGER_AVAILABLE",
            TrialStatus::TemporarilyNotAvailable => "TEMPORARILY_NOT_AVAILABLE",
            TrialStatus::ApprovedForMarketing    => "APPROVED_FOR_MARKETING",
        }
    }
}

impl fmt::Display for TrialStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Trial ↔ organization role
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Sponsor,
    Collaborator,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Sponsor      => "SPONSOR",
            Role::Collaborator => "COLLABORATOR",
        }
    }

    /// Relationship type used in the graph.
    pub fn relationship(&self) -> &'static str {
        match self {
            Role::Sponsor      => "SPONSORED_BY",
            Role::Collaborator => "COLLABORATES_WITH",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Derived identity
// ---------------------------------------------------------------------------

/// Hash-derived identifier for entities without a natural key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StableId(String);

impl StableId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Nodes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialNode {
    pub nct_id: String,
    pub title: String,
    pub phase: Option<Phase>,
    pub status: TrialStatus,
    pub start_date: Option<String>,
    pub completion_date: Option<String>,
    pub study_type: Option<String>,
    pub route: Option<String>,
    pub dosage_form: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrganizationNode {
    pub org_id: StableId,
    pub name_norm: String,
    pub name_raw: String,
    pub agency_class: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrugNode {
    pub drug_id: StableId,
    pub name_norm: String,
    pub name_raw: String,
}

// ---------------------------------------------------------------------------
// Edges
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrialOrgEdge {
    pub nct_id: String,
    pub org_id: StableId,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrialDrugEdge {
    pub nct_id: String,
    pub drug_id: StableId,
}

impl TrialDrugEdge {
    /// Relationship type used in the graph.
    pub const RELATIONSHIP: &'static str = "TESTS_DRUG";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_accepts_both_spellings() {
        assert_eq!(Phase::parse("Phase 1"), Some(Phase::Phase1));
        assert_eq!(Phase::parse("PHASE1"), Some(Phase::Phase1));
        assert_eq!(Phase::parse("Phase 1/Phase 2"), Some(Phase::Phase1Phase2));
        assert_eq!(Phase::parse("PHASE2/PHASE3"), Some(Phase::Phase2Phase3));
        assert_eq!(Phase::parse("EARLY_PHASE1"), Some(Phase::EarlyPhase1));
        assert_eq!(Phase::parse("Not Applicable"), Some(Phase::NotApplicable));
        assert_eq!(Phase::parse("NA"), Some(Phase::NotApplicable));
        assert_eq!(Phase::parse("Phase 5"), None);
        assert_eq!(Phase::parse(""), None);
    }

    #[test]
    fn test_phase_label_round_trips() {
        for phase in [Phase::EarlyPhase1, Phase::Phase1Phase2, Phase::Phase4, Phase::NotApplicable] {
            assert_eq!(Phase::parse(phase.as_str()), Some(phase));
        }
    }

    #[test]
    fn test_status_accepts_legacy_spelling() {
        assert_eq!(TrialStatus::parse("Active, not recruiting"), Some(TrialStatus::ActiveNotRecruiting));
        assert_eq!(TrialStatus::parse("ACTIVE_NOT_RECRUITING"), Some(TrialStatus::ActiveNotRecruiting));
        assert_eq!(TrialStatus::parse("Enrolling by invitation"), Some(TrialStatus::EnrollingByInvitation));
        assert_eq!(TrialStatus::parse("completed"), Some(TrialStatus::Completed));
        assert_eq!(TrialStatus::parse("Unknown status"), Some(TrialStatus::Unknown));
        assert_eq!(TrialStatus::parse("MAYBE"), None);
    }

    #[test]
    fn test_role_serializes_uppercase() {
        let json = serde_json::to_string(&Role::Collaborator).unwrap();
        assert_eq!(json, "\"COLLABORATOR\"");
        assert_eq!(Role::Sponsor.relationship(), "SPONSORED_BY");
    }

    #[test]
    fn test_stable_id_is_transparent() {
        let edge = TrialDrugEdge { nct_id: "NCT1".into(), drug_id: StableId::new("abc") };
        let json = serde_json::to_string(&edge).unwrap();
        assert_eq!(json, r#"{"nct_id":"NCT1","drug_id":"abc"}"#);
    }
}
