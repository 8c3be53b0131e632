//! Hash-derived identity for organizations and drugs.

use sha2::{Digest, Sha256};
use trialgraph_common::StableId;

/// Width of a generated identifier in hex characters (128 bits).
pub const ID_LEN: usize = 32;

/// Namespace tag mixed into the hash so an organization and a drug with
/// the same normalized name never share an ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityCategory {
    Organization,
    Drug,
}

impl EntityCategory {
    pub fn tag(&self) -> &'static str {
        match self {
            EntityCategory::Organization => "org",
            EntityCategory::Drug         => "drug",
        }
    }
}

/// SHA-256 over `"{tag}:{key}"`, truncated to [`ID_LEN`] lower-hex chars.
pub fn generate_id(category: EntityCategory, key: &str) -> StableId {
    let mut hasher = Sha256::new();
    hasher.update(category.tag().as_bytes());
    hasher.update(b":");
    hasher.update(key.as_bytes());
    let mut hex = format!("{:x}", hasher.finalize());
    hex.truncate(ID_LEN);
    StableId::new(hex)
}
