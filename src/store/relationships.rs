use rusqlite::{params, Connection};

use crate::db::Db;
use crate::error::{KgraphError, Result};
use crate::store::{Relationship, RelationshipView};

fn view_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RelationshipView> {
    Ok(RelationshipView {
        id: row.get(0)?,
        src_id: row.get(1)?,
        relation: row.get(2)?,
        dst_id: row.get(3)?,
        evidence: row.get(4)?,
        src_name: row.get(5)?,
        dst_name: row.get(6)?,
    })
}

fn concept_exists(conn: &Connection, id: i64) -> Result<bool> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM concepts WHERE id = ?1)",
        params![id],
        |row| row.get(0),
    )?;
    Ok(exists)
}

/// Insert a new edge and return it with its assigned id.
///
/// Both endpoints must resolve to existing concepts; an unresolved endpoint
/// is a validation failure, not a storage failure.
pub async fn create_relationship(
    db: &Db,
    src_id: i64,
    relation: &str,
    dst_id: i64,
    evidence: Option<&str>,
) -> Result<Relationship> {
    if relation.trim().is_empty() {
        return Err(KgraphError::Validation(
            "relation label must not be empty".to_string(),
        ));
    }

    let relation = relation.to_string();
    let evidence = evidence.map(|s| s.to_string());
    db.with_connection(move |conn| {
        for (field, id) in [("src_id", src_id), ("dst_id", dst_id)] {
            if !concept_exists(conn, id)? {
                return Err(KgraphError::Validation(format!(
                    "{} {} does not reference an existing concept",
                    field, id
                )));
            }
        }

        conn.execute(
            "INSERT INTO relationships (src_id, relation, dst_id, evidence) \
             VALUES (?1, ?2, ?3, ?4)",
            params![src_id, relation, dst_id, evidence],
        )?;
        Ok(Relationship {
            id: conn.last_insert_rowid(),
            src_id,
            relation,
            dst_id,
            evidence,
        })
    })
    .await
}

/// Every relationship where the concept is either endpoint, with endpoint
/// names joined in for display.
pub async fn relationships_for_concept(db: &Db, id: i64) -> Result<Vec<RelationshipView>> {
    db.with_connection(move |conn| {
        let mut stmt = conn.prepare(
            "SELECT e.id, e.src_id, e.relation, e.dst_id, e.evidence, \
                    src.name, dst.name \
             FROM relationships e \
             JOIN concepts src ON e.src_id = src.id \
             JOIN concepts dst ON e.dst_id = dst.id \
             WHERE e.src_id = ?1 OR e.dst_id = ?1",
        )?;
        let views = stmt
            .query_map(params![id], view_from_row)?
            .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;
        Ok(views)
    })
    .await
}

pub async fn list_relationships(db: &Db) -> Result<Vec<RelationshipView>> {
    db.with_connection(|conn| {
        let mut stmt = conn.prepare(
            "SELECT e.id, e.src_id, e.relation, e.dst_id, e.evidence, \
                    src.name, dst.name \
             FROM relationships e \
             JOIN concepts src ON e.src_id = src.id \
             JOIN concepts dst ON e.dst_id = dst.id",
        )?;
        let views = stmt
            .query_map([], view_from_row)?
            .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;
        Ok(views)
    })
    .await
}

/// Whether any edge connects the two concepts, in either direction.
/// Duplicate suppression treats the pair as unordered.
pub async fn exists_between(db: &Db, a: i64, b: i64) -> Result<bool> {
    db.with_connection(move |conn| {
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM relationships \
             WHERE (src_id = ?1 AND dst_id = ?2) OR (src_id = ?2 AND dst_id = ?1))",
            params![a, b],
            |row| row.get(0),
        )?;
        Ok(exists)
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::create_concept;
    use crate::store::test_util::setup_test_db;

    #[tokio::test]
    async fn test_create_relationship_visible_from_both_endpoints() {
        let (db, _temp) = setup_test_db().await;

        let a = create_concept(&db, "A", None, None).await.unwrap();
        let b = create_concept(&db, "B", None, None).await.unwrap();
        let edge = create_relationship(&db, a.id, "uses", b.id, Some("A relies on B"))
            .await
            .unwrap();

        let from_a = relationships_for_concept(&db, a.id).await.unwrap();
        let from_b = relationships_for_concept(&db, b.id).await.unwrap();
        assert!(from_a.iter().any(|e| e.id == edge.id));
        assert!(from_b.iter().any(|e| e.id == edge.id));

        assert_eq!(from_a[0].src_name, "A");
        assert_eq!(from_a[0].dst_name, "B");
        assert_eq!(from_a[0].evidence.as_deref(), Some("A relies on B"));
    }

    #[tokio::test]
    async fn test_create_relationship_dangling_endpoint_rejected() {
        let (db, _temp) = setup_test_db().await;

        let a = create_concept(&db, "A", None, None).await.unwrap();

        let err = create_relationship(&db, a.id, "uses", 999, None)
            .await
            .unwrap_err();
        assert!(matches!(err, KgraphError::Validation(_)));
        assert!(err.to_string().contains("dst_id"));

        let err = create_relationship(&db, 999, "uses", a.id, None)
            .await
            .unwrap_err();
        assert!(matches!(err, KgraphError::Validation(_)));
        assert!(err.to_string().contains("src_id"));

        // Nothing was persisted
        assert!(list_relationships(&db).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_relationship_empty_label_rejected() {
        let (db, _temp) = setup_test_db().await;

        let a = create_concept(&db, "A", None, None).await.unwrap();
        let b = create_concept(&db, "B", None, None).await.unwrap();

        let err = create_relationship(&db, a.id, "  ", b.id, None)
            .await
            .unwrap_err();
        assert!(matches!(err, KgraphError::Validation(_)));
    }

    #[tokio::test]
    async fn test_exists_between_is_unordered() {
        let (db, _temp) = setup_test_db().await;

        let x = create_concept(&db, "X", None, None).await.unwrap();
        let y = create_concept(&db, "Y", None, None).await.unwrap();
        let z = create_concept(&db, "Z", None, None).await.unwrap();

        // Edge stored as Y -> X; the pair (X, Y) still counts as connected
        create_relationship(&db, y.id, "uses", x.id, None)
            .await
            .unwrap();

        assert!(exists_between(&db, x.id, y.id).await.unwrap());
        assert!(exists_between(&db, y.id, x.id).await.unwrap());
        assert!(!exists_between(&db, x.id, z.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_list_relationships_denormalized() {
        let (db, _temp) = setup_test_db().await;

        let a = create_concept(&db, "Deep Learning", None, None).await.unwrap();
        let b = create_concept(&db, "Transformer", None, None).await.unwrap();
        create_relationship(&db, a.id, "includes", b.id, None)
            .await
            .unwrap();

        let all = list_relationships(&db).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].src_name, "Deep Learning");
        assert_eq!(all[0].dst_name, "Transformer");
        assert_eq!(all[0].relation, "includes");
    }
}
