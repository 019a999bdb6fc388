use anyhow::Result;
use sqlx::PgPool;
use time::OffsetDateTime;

use crate::domain::{ConsumptionKind, ConsumptionRecord};

/// Insert one consumption record. Returns the stored row, including the
/// database-assigned id and timestamps.
///
/// Returns the raw `sqlx::Error` so callers can inspect constraint failures.
pub async fn insert_record(
    pool: &PgPool,
    user_id: i64,
    ts: OffsetDateTime,
    amount: f64,
    kind: ConsumptionKind,
    notes: Option<&str>,
) -> Result<ConsumptionRecord, sqlx::Error> {
    sqlx::query_as::<_, ConsumptionRecord>(
        r#"
        INSERT INTO consumptions (user_id, ts, amount, kind, notes)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, user_id, ts, amount, kind, notes, created_at, updated_at
        "#,
    )
    .bind(user_id)
    .bind(ts)
    .bind(amount)
    .bind(kind)
    .bind(notes)
    .fetch_one(pool)
    .await
}

/// Fetch every record owned by `user_id`, oldest first. This is the input to
/// the analytics aggregator; the WHERE clause is the tenant-isolation
/// boundary, so nothing above it filters by owner again.
pub async fn fetch_records_for_owner(pool: &PgPool, user_id: i64) -> Result<Vec<ConsumptionRecord>> {
    let rows = sqlx::query_as::<_, ConsumptionRecord>(
        r#"
        SELECT id, user_id, ts, amount, kind, notes, created_at, updated_at
        FROM consumptions
        WHERE user_id = $1
        ORDER BY ts
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// One page of a user's records, newest consumption date first and newest
/// creation first within a date.
pub async fn fetch_page_for_owner(
    pool: &PgPool,
    user_id: i64,
    limit: i64,
    offset: i64,
) -> Result<Vec<ConsumptionRecord>> {
    let rows = sqlx::query_as::<_, ConsumptionRecord>(
        r#"
        SELECT id, user_id, ts, amount, kind, notes, created_at, updated_at
        FROM consumptions
        WHERE user_id = $1
        ORDER BY ts DESC, created_at DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

pub async fn count_for_owner(pool: &PgPool, user_id: i64) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM consumptions WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await?;

    Ok(count)
}
