//! trialgraph-ingestion — AACT snapshot ingestion.
//! - Table discovery in an extracted pipe-delimited export
//! - Typed row loading with required-column checks
//! - Eligibility filtering (interventions present, phase, status, minimum size)

pub mod sources;
pub mod filter;
pub mod pipeline;

pub use filter::{filter_snapshot, EligibilityCriteria, FilterReport};
pub use pipeline::{ingest, IngestOutcome};
