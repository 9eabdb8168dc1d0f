use chrono::Utc;
use sqlx::SqliteConnection;

use super::{ARCHIVED_STATUS, DatabaseError, Result};
use crate::models::{Source, SourceFields, SourceSummary};

/// All sources by name, each with the number of infos that are not archived.
pub async fn list_with_counts(conn: &mut SqliteConnection) -> Result<Vec<SourceSummary>> {
    sqlx::query_as::<_, SourceSummary>(
        r#"
        SELECT s.id,
               s.name,
               COUNT(CASE WHEN i.status <> ? THEN 1 END) AS curatifs
        FROM source AS s
        LEFT JOIN info AS i ON i.source_id = s.id
        GROUP BY s.id, s.name
        ORDER BY s.name ASC
        "#,
    )
    .bind(ARCHIVED_STATUS)
    .fetch_all(&mut *conn)
    .await
    .map_err(DatabaseError::Query)
}

pub async fn get(conn: &mut SqliteConnection, id: i64) -> Result<Source> {
    sqlx::query_as::<_, Source>(
        r#"
        SELECT id, name, created
        FROM source
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| match e {
        sqlx::Error::RowNotFound => DatabaseError::NotFound(format!("Source {} not found", id)),
        e => DatabaseError::Query(e),
    })
}

pub async fn insert(conn: &mut SqliteConnection, fields: &SourceFields) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO source (name, created)
        VALUES (?, ?)
        "#,
    )
    .bind(&fields.name)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Rename a source. Matching no row is not an error.
pub async fn update(conn: &mut SqliteConnection, id: i64, fields: &SourceFields) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE source
        SET name = ?
        WHERE id = ?
        "#,
    )
    .bind(&fields.name)
    .bind(id)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Delete a source and, through the foreign key, its infos.
/// Deleting an id that does not exist is a no-op.
pub async fn delete(conn: &mut SqliteConnection, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM source WHERE id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{infos, testing::memory_db};
    use crate::models::InfoFields;

    fn named(name: &str) -> SourceFields {
        SourceFields { name: name.into() }
    }

    fn info(priority: i64, status: &str) -> InfoFields {
        InfoFields {
            agent: "agent".into(),
            material: format!("material-{}", priority),
            detail: "detail".into(),
            priority,
            estimate: None,
            status: status.into(),
        }
    }

    #[tokio::test]
    async fn test_insert_then_get() {
        let db = memory_db().await;
        let mut conn = db.connection().await.unwrap();

        let id = insert(&mut conn, &named("Acme")).await.unwrap();
        let source = get(&mut conn, id).await.unwrap();

        assert_eq!(source.id, id);
        assert_eq!(source.name, "Acme");
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let db = memory_db().await;
        let mut conn = db.connection().await.unwrap();

        let err = get(&mut conn, 999).await.unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_renames_and_ignores_missing() {
        let db = memory_db().await;
        let mut conn = db.connection().await.unwrap();

        let id = insert(&mut conn, &named("Old")).await.unwrap();
        update(&mut conn, id, &named("New")).await.unwrap();
        assert_eq!(get(&mut conn, id).await.unwrap().name, "New");

        update(&mut conn, id + 100, &named("Ghost")).await.unwrap();
    }

    #[tokio::test]
    async fn test_list_is_alphabetical_and_skips_archived() {
        let db = memory_db().await;
        let mut conn = db.connection().await.unwrap();

        let zeta = insert(&mut conn, &named("Zeta")).await.unwrap();
        let acme = insert(&mut conn, &named("Acme")).await.unwrap();
        infos::insert(&mut conn, acme, &info(1, "open")).await.unwrap();
        infos::insert(&mut conn, acme, &info(2, "archived")).await.unwrap();
        infos::insert(&mut conn, acme, &info(3, "waiting")).await.unwrap();
        infos::insert(&mut conn, zeta, &info(1, "archived")).await.unwrap();

        let listed = list_with_counts(&mut conn).await.unwrap();
        let pairs: Vec<(&str, i64)> = listed.iter().map(|s| (s.name.as_str(), s.curatifs)).collect();

        assert_eq!(pairs, vec![("Acme", 2), ("Zeta", 0)]);
    }

    #[tokio::test]
    async fn test_delete_cascades_and_is_idempotent() {
        let db = memory_db().await;
        let mut conn = db.connection().await.unwrap();

        let id = insert(&mut conn, &named("Acme")).await.unwrap();
        let info_id = infos::insert(&mut conn, id, &info(1, "open")).await.unwrap();

        delete(&mut conn, id).await.unwrap();
        assert!(matches!(get(&mut conn, id).await, Err(DatabaseError::NotFound(_))));
        assert!(matches!(
            infos::get(&mut conn, info_id).await,
            Err(DatabaseError::NotFound(_))
        ));

        delete(&mut conn, id).await.unwrap();
    }
}
