//! Graph assembler: composes the store's list operations into one snapshot.

use serde::{Deserialize, Serialize};

use crate::db::Db;
use crate::error::Result;
use crate::store::{self, Concept, RelationshipView};

/// The full graph as stored. Presentation shaping (stringified ids, type
/// defaulting, viz field names) belongs to the API layer, not here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub concepts: Vec<Concept>,
    pub relationships: Vec<RelationshipView>,
}

pub async fn get_full_graph(db: &Db) -> Result<GraphSnapshot> {
    let concepts = store::list_concepts(db).await?;
    let relationships = store::list_relationships(db).await?;
    Ok(GraphSnapshot {
        concepts,
        relationships,
    })
}
