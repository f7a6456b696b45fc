use rusqlite::{params, OptionalExtension};

use crate::db::Db;
use crate::error::{KgraphError, Result};
use crate::store::Concept;

fn concept_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Concept> {
    Ok(Concept {
        id: row.get(0)?,
        name: row.get(1)?,
        kind: row.get(2)?,
        description: row.get(3)?,
    })
}

/// Insert a new concept and return it with its assigned id.
///
/// No uniqueness check is performed here: callers resolve by name first
/// (see the reconciler), which keeps concept names unique in practice.
pub async fn create_concept(
    db: &Db,
    name: &str,
    kind: Option<&str>,
    description: Option<&str>,
) -> Result<Concept> {
    if name.trim().is_empty() {
        return Err(KgraphError::Validation(
            "concept name must not be empty".to_string(),
        ));
    }

    let name = name.to_string();
    let kind = kind.map(|s| s.to_string());
    let description = description.map(|s| s.to_string());
    db.with_connection(move |conn| {
        conn.execute(
            "INSERT INTO concepts (name, type, description) VALUES (?1, ?2, ?3)",
            params![name, kind, description],
        )?;
        Ok(Concept {
            id: conn.last_insert_rowid(),
            name,
            kind,
            description,
        })
    })
    .await
}

pub async fn get_concept_by_id(db: &Db, id: i64) -> Result<Option<Concept>> {
    db.with_connection(move |conn| {
        let concept = conn
            .query_row(
                "SELECT id, name, type, description FROM concepts WHERE id = ?1",
                params![id],
                concept_from_row,
            )
            .optional()?;
        Ok(concept)
    })
    .await
}

/// Exact-match lookup by name, the functional key.
pub async fn get_concept_by_name(db: &Db, name: &str) -> Result<Option<Concept>> {
    let name = name.to_string();
    db.with_connection(move |conn| {
        let concept = conn
            .query_row(
                "SELECT id, name, type, description FROM concepts WHERE name = ?1",
                params![name],
                concept_from_row,
            )
            .optional()?;
        Ok(concept)
    })
    .await
}

/// Full scan. Row order is not semantically meaningful.
pub async fn list_concepts(db: &Db) -> Result<Vec<Concept>> {
    db.with_connection(|conn| {
        let mut stmt = conn.prepare("SELECT id, name, type, description FROM concepts")?;
        let concepts = stmt
            .query_map([], concept_from_row)?
            .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;
        Ok(concepts)
    })
    .await
}

/// Delete a concept together with every relationship referencing it as
/// either endpoint, in one transaction. Returns whether the concept existed.
pub async fn delete_concept(db: &Db, id: i64) -> Result<bool> {
    db.with_connection(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
            "DELETE FROM relationships WHERE src_id = ?1 OR dst_id = ?1",
            params![id],
        )?;
        let deleted = tx.execute("DELETE FROM concepts WHERE id = ?1", params![id])?;
        tx.commit()?;
        Ok(deleted > 0)
    })
    .await
}
