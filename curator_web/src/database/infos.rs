use chrono::Utc;
use sqlx::SqliteConnection;

use super::{DatabaseError, Result};
use crate::models::{Info, InfoFields, InfoSummary};

pub async fn insert(conn: &mut SqliteConnection, source_id: i64, fields: &InfoFields) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO info
            (source_id, agent, material, details, priority, estimate, status, created)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(source_id)
    .bind(&fields.agent)
    .bind(&fields.material)
    .bind(&fields.detail)
    .bind(fields.priority)
    .bind(fields.estimate.as_deref())
    .bind(&fields.status)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    Ok(result.last_insert_rowid())
}

pub async fn get(conn: &mut SqliteConnection, id: i64) -> Result<Info> {
    sqlx::query_as::<_, Info>(
        r#"
        SELECT id, source_id, agent, material, details, priority,
               estimate, status, created, updated
        FROM info
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| match e {
        sqlx::Error::RowNotFound => DatabaseError::NotFound(format!("Info {} not found", id)),
        e => DatabaseError::Query(e),
    })
}

/// Infos of a source, lowest priority value first.
pub async fn list_by_source(conn: &mut SqliteConnection, source_id: i64) -> Result<Vec<InfoSummary>> {
    sqlx::query_as::<_, InfoSummary>(
        r#"
        SELECT id, source_id, material, priority, status, created
        FROM info
        WHERE source_id = ?
        ORDER BY priority ASC
        "#,
    )
    .bind(source_id)
    .fetch_all(&mut *conn)
    .await
    .map_err(DatabaseError::Query)
}

/// Overwrite the editable fields and stamp `updated`.
pub async fn update(conn: &mut SqliteConnection, id: i64, fields: &InfoFields) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE info
        SET agent = ?, material = ?, priority = ?, details = ?,
            estimate = ?, status = ?, updated = ?
        WHERE id = ?
        "#,
    )
    .bind(&fields.agent)
    .bind(&fields.material)
    .bind(fields.priority)
    .bind(&fields.detail)
    .bind(fields.estimate.as_deref())
    .bind(&fields.status)
    .bind(Utc::now())
    .bind(id)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Deleting an id that does not exist, or that is filed under another
/// source, is a no-op.
pub async fn delete(conn: &mut SqliteConnection, source_id: i64, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM info WHERE id = ? AND source_id = ?")
        .bind(id)
        .bind(source_id)
        .execute(&mut *conn)
        .await?;

    Ok(())
}
