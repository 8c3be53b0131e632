//! Tabular source readers.

pub mod aact;

pub use aact::{discover_tables, load_table, resolve_table, TableSpec, INTERVENTIONS, SPONSORS, STUDIES};
