//! Ingestion reconciler: merges a generated candidate structure into the
//! persisted graph.
//!
//! Merge rules, evaluated in order:
//! 1. Resolve or create the topic concept by name; existing concepts are
//!    never modified (their descriptions are never overwritten).
//! 2. Keep only candidate edges whose declared source is the topic itself;
//!    the reconciler grows edges outward from the topic node, never
//!    arbitrary subgraphs.
//! 3. Resolve each target by exact name. Targets without an existing match
//!    are dropped; no concepts are ever created for targets.
//! 4. Skip pairs already connected in either direction, then persist the
//!    rest one edge at a time.
//!
//! The step-4 loop is deliberately not transactional: edges created before a
//! mid-batch failure stay committed, and the outcome reports a warning
//! instead of failing, so the generated payload is never lost to the caller.

use serde::{Deserialize, Serialize};

use crate::db::Db;
use crate::error::Result;
use crate::store;

/// A proposed topic subgraph from the text-generation collaborator,
/// not yet persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateGraph {
    pub topic: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub edges: Vec<CandidateEdge>,
    #[serde(default)]
    pub concepts: Vec<CandidateConcept>,
}

/// A proposed edge, endpoints named by concept name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateEdge {
    pub source: String,
    pub relation: String,
    pub target: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// A proposed concept. Returned to the caller verbatim; the reconciler never
/// persists candidate concepts other than the topic itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateConcept {
    pub name: String,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// What was proposed versus what was persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileOutcome {
    pub topic_name: String,
    pub description: Option<String>,
    pub saved_concepts: usize,
    pub saved_relationships: usize,
    pub candidate_edges: Vec<CandidateEdge>,
    pub candidate_concepts: Vec<CandidateConcept>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

pub async fn reconcile(db: &Db, candidate: CandidateGraph) -> Result<ReconcileOutcome> {
    if candidate.topic.trim().is_empty() {
        return Err(crate::error::KgraphError::Validation(
            "candidate topic must not be empty".to_string(),
        ));
    }

    let mut outcome = ReconcileOutcome {
        topic_name: candidate.topic.clone(),
        description: candidate.description.clone(),
        saved_concepts: 0,
        saved_relationships: 0,
        candidate_edges: candidate.edges.clone(),
        candidate_concepts: candidate.concepts.clone(),
        warning: None,
    };

    // Resolve or create the topic concept. A storage failure here still
    // returns the candidate payload to the caller, just with nothing saved.
    let topic = match resolve_or_create_topic(db, &candidate).await {
        Ok((topic, created)) => {
            if created {
                outcome.saved_concepts = 1;
            }
            topic
        }
        Err(e) => {
            outcome.warning = Some(format!("failed to persist topic concept: {}", e));
            return Ok(outcome);
        }
    };

    // Only edges declared outward from the topic survive
    let outward: Vec<&CandidateEdge> = candidate
        .edges
        .iter()
        .filter(|e| e.source == candidate.topic)
        .collect();
    let ignored = candidate.edges.len() - outward.len();
    if ignored > 0 {
        log::debug!(
            "Ignoring {} candidate edge(s) whose source is not '{}'",
            ignored,
            candidate.topic
        );
    }

    for edge in outward {
        match persist_edge(db, &topic, edge).await {
            Ok(true) => outcome.saved_relationships += 1,
            Ok(false) => {}
            Err(e) => {
                // Best-effort batch: keep what was committed, report the rest
                outcome.warning = Some(format!(
                    "persisted {} relationship(s) before a storage failure: {}",
                    outcome.saved_relationships, e
                ));
                break;
            }
        }
    }

    Ok(outcome)
}

async fn resolve_or_create_topic(
    db: &Db,
    candidate: &CandidateGraph,
) -> Result<(store::Concept, bool)> {
    if let Some(existing) = store::get_concept_by_name(db, &candidate.topic).await? {
        log::debug!("Topic '{}' already exists (id {})", existing.name, existing.id);
        return Ok((existing, false));
    }
    let created = store::create_concept(
        db,
        &candidate.topic,
        None,
        candidate.description.as_deref(),
    )
    .await?;
    Ok((created, true))
}

/// Persist one outward candidate edge. Returns whether an edge was created.
async fn persist_edge(
    db: &Db,
    topic: &store::Concept,
    edge: &CandidateEdge,
) -> Result<bool> {
    // Targets must already exist; never create concepts for them
    let target = match store::get_concept_by_name(db, &edge.target).await? {
        Some(c) => c,
        None => {
            log::debug!("Skipping edge to unknown concept '{}'", edge.target);
            return Ok(false);
        }
    };

    // Unordered-pair duplicate suppression
    if store::exists_between(db, topic.id, target.id).await? {
        log::debug!(
            "'{}' and '{}' already connected, skipping",
            topic.name,
            target.name
        );
        return Ok(false);
    }

    store::create_relationship(
        db,
        topic.id,
        &edge.relation,
        target.id,
        edge.description.as_deref(),
    )
    .await?;
    Ok(true)
}
