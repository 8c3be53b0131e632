//! Cypher for schema setup and idempotent batch upserts.
//!
//! Every batch statement takes `$rows` and merges on the unique key, so
//! replaying a batch leaves the graph unchanged.

/// Uniqueness constraints on the three node keys, plus lookup indexes.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    "CREATE CONSTRAINT trial_nct_id IF NOT EXISTS FOR (t:Trial) REQUIRE t.nct_id IS UNIQUE",
    "CREATE CONSTRAINT organization_org_id IF NOT EXISTS FOR (o:Organization) REQUIRE o.org_id IS UNIQUE",
    "CREATE CONSTRAINT drug_drug_id IF NOT EXISTS FOR (d:Drug) REQUIRE d.drug_id IS UNIQUE",
    "CREATE INDEX trial_status IF NOT EXISTS FOR (t:Trial) ON (t.status)",
    "CREATE INDEX trial_phase IF NOT EXISTS FOR (t:Trial) ON (t.phase)",
    "CREATE INDEX organization_name_norm IF NOT EXISTS FOR (o:Organization) ON (o.name_norm)",
    "CREATE INDEX drug_name_norm IF NOT EXISTS FOR (d:Drug) ON (d.name_norm)",
];

pub const MERGE_TRIALS: &str = r#"UNWIND $rows AS row
MERGE (t:Trial {nct_id: row.nct_id})
SET t.title = row.title,
    t.phase = row.phase,
    t.status = row.status,
    t.start_date = row.start_date,
    t.completion_date = row.completion_date,
    t.study_type = row.study_type,
    t.route = row.route,
    t.dosage_form = row.dosage_form"#;

pub const MERGE_ORGANIZATIONS: &str = r#"UNWIND $rows AS row
MERGE (o:Organization {org_id: row.org_id})
SET o.name_norm = row.name_norm,
    o.name_raw = row.name_raw,
    o.agency_class = row.agency_class"#;

pub const MERGE_DRUGS: &str = r#"UNWIND $rows AS row
MERGE (d:Drug {drug_id: row.drug_id})
SET d.name_norm = row.name_norm,
    d.name_raw = row.name_raw"#;

pub const MERGE_SPONSORED_BY: &str = r#"UNWIND $rows AS row
MATCH (t:Trial {nct_id: row.nct_id})
MATCH (o:Organization {org_id: row.org_id})
MERGE (t)-[:SPONSORED_BY]->(o)"#;

pub const MERGE_COLLABORATES_WITH: &str = r#"UNWIND $rows AS row
MATCH (t:Trial {nct_id: row.nct_id})
MATCH (o:Organization {org_id: row.org_id})
MERGE (t)-[:COLLABORATES_WITH]->(o)"#;

pub const MERGE_TESTS_DRUG: &str = r#"UNWIND $rows AS row
MATCH (t:Trial {nct_id: row.nct_id})
MATCH (d:Drug {drug_id: row.drug_id})
MERGE (t)-[:TESTS_DRUG]->(d)"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_statements_merge_on_keys() {
        for stmt in [MERGE_TRIALS, MERGE_ORGANIZATIONS, MERGE_DRUGS] {
            assert!(stmt.starts_with("UNWIND $rows AS row"));
            assert!(stmt.contains("MERGE ("));
        }
        for stmt in [MERGE_SPONSORED_BY, MERGE_COLLABORATES_WITH, MERGE_TESTS_DRUG] {
            assert!(stmt.contains("MERGE (t)-[:"));
        }
    }

    #[test]
    fn test_schema_is_rerunnable() {
        assert!(SCHEMA_STATEMENTS.iter().all(|s| s.contains("IF NOT EXISTS")));
    }
}
