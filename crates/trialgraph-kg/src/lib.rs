//! trialgraph-kg — turns the filtered AACT snapshot into graph tables.
//!
//! Pipeline: extract route/dosage per trial, build deduplicated
//! organization and drug nodes, build edges against the same keys, then
//! stage the tables and plan idempotent batch loads.

pub mod stable_id;
pub mod normalize;
pub mod extraction;
pub mod entities;
pub mod edges;
pub mod transform;
pub mod cypher;
pub mod loader;
pub mod staging;

pub use stable_id::{generate_id, EntityCategory};
pub use normalize::{normalize, normalize_str};
pub use extraction::{ExtractionRules, KeywordRule, RouteDosageExtractor};
pub use entities::{EntityBuilder, InterventionFilter};
pub use edges::{classify_role, EdgeBuilder, EdgeReport, EdgeTables};
pub use transform::{transform, GraphDataset, TransformMetrics, TransformOptions};
pub use loader::{load_dataset, plan_load, BatchKind, GraphCounts, GraphSink, InMemoryGraph, LoadBatch, LoadReport};
pub use staging::{write_load_plan, write_staged, StagedFiles};
