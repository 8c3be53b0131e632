//! trialgraph-common — Shared types, errors, and enumerations used across all trialgraph crates.

pub mod error;
pub mod entities;
pub mod records;

// Re-export commonly used types
pub use error::{Result, TrialGraphError};
pub use entities::{
    DrugNode, OrganizationNode, Phase, Role, StableId, TrialDrugEdge, TrialNode,
    TrialOrgEdge, TrialStatus,
};
pub use records::{InterventionRecord, RawSnapshot, SponsorRecord, StudyRecord};
