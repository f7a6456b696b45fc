//! Wire types for the HTTP API.
//!
//! The viz shapes match the force-graph front-end format: string ids,
//! `type` defaulted to "concept", edges renamed to `source`/`target` links.
//! Storage field names never leak into this layer's output.

use serde::{Deserialize, Serialize};

use crate::graph::GraphSnapshot;
use crate::store::{Concept, RelationshipView};

/// Node in the force-graph wire format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VizNode {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Edge in the force-graph wire format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VizLink {
    pub source: String,
    pub target: String,
    pub relation: String,
    pub evidence: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VizGraph {
    pub nodes: Vec<VizNode>,
    pub links: Vec<VizLink>,
}

impl From<Concept> for VizNode {
    fn from(concept: Concept) -> Self {
        Self {
            id: concept.id.to_string(),
            name: concept.name,
            kind: concept.kind.unwrap_or_else(|| "concept".to_string()),
            description: concept.description,
        }
    }
}

impl From<RelationshipView> for VizLink {
    fn from(edge: RelationshipView) -> Self {
        Self {
            source: edge.src_id.to_string(),
            target: edge.dst_id.to_string(),
            relation: edge.relation,
            evidence: edge.evidence.unwrap_or_default(),
        }
    }
}

impl From<GraphSnapshot> for VizGraph {
    fn from(snapshot: GraphSnapshot) -> Self {
        Self {
            nodes: snapshot.concepts.into_iter().map(VizNode::from).collect(),
            links: snapshot
                .relationships
                .into_iter()
                .map(VizLink::from)
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateNodeRequest {
    pub name: String,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateEdgeRequest {
    pub src_id: i64,
    pub relation: String,
    pub dst_id: i64,
    #[serde(default)]
    pub evidence: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ExpandRequest {
    pub topic: String,
}
