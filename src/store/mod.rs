//! Entity store: persistence of concepts and relationships.
//!
//! Concepts are looked up by `name` as the functional key; the reconciler
//! relies on `get_concept_by_name` as the sole de-duplication mechanism.
//! Relationship creation verifies both endpoints exist, so a malformed direct
//! API call cannot leave a dangling edge.

mod concepts;
mod relationships;

pub use concepts::{
    create_concept, delete_concept, get_concept_by_id, get_concept_by_name, list_concepts,
};
pub use relationships::{
    create_relationship, exists_between, list_relationships, relationships_for_concept,
};

use serde::{Deserialize, Serialize};

/// A named entity in the graph (node).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Concept {
    pub id: i64,
    pub name: String,
    /// Free-form category tag ("concept", "algorithm", ...). Stored as NULL
    /// when absent; defaulted to "concept" at the presentation layer only.
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub description: Option<String>,
}

/// A directed, labeled connection between two concepts (edge).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub id: i64,
    pub src_id: i64,
    pub relation: String,
    pub dst_id: i64,
    pub evidence: Option<String>,
}

/// An edge with denormalized endpoint names, computed by a join at read time.
/// Never stored redundantly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipView {
    pub id: i64,
    pub src_id: i64,
    pub relation: String,
    pub dst_id: i64,
    pub evidence: Option<String>,
    pub src_name: String,
    pub dst_name: String,
}

#[cfg(test)]
pub(crate) mod test_util {
    use crate::db::{migrate, Db};
    use tempfile::TempDir;

    pub async fn setup_test_db() -> (Db, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let db = Db::new(&db_path);
        db.with_connection(migrate::run_migrations).await.unwrap();
        (db, temp_dir)
    }
}
