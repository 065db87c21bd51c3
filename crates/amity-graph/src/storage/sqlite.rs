//! `SQLite` edge storage.
//!
//! Edges live in a single `relationships` table. The three graph reads are
//! self-joins over that table.

use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::instrument;

use super::EdgeStore;
use crate::account::AccountId;
use crate::error::{GraphError, Result};
use crate::schema::{Edge, EdgeStatus, RelationshipSet};

type EdgeRow = (String, String, String, String, String);

/// Edge storage backed by `SQLite`.
#[derive(Clone)]
pub struct SqliteEdgeStore {
    pool: SqlitePool,
}

impl SqliteEdgeStore {
    /// Create a new store with an existing connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create the `relationships` table and its indexes if missing.
    #[instrument(skip_all)]
    pub async fn init_schema(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS relationships (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                requestor TEXT NOT NULL,
                target TEXT NOT NULL,
                status TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                UNIQUE(requestor, target)
            )",
        )
        .execute(pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_relationships_requestor ON relationships(requestor)",
        )
        .execute(pool)
        .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_relationships_target ON relationships(target)")
            .execute(pool)
            .await?;

        Ok(())
    }

    /// Total number of stored edges.
    pub async fn edge_count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM relationships")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|err| GraphError::Storage(format!("invalid timestamp {raw:?}: {err}")))
}

fn edge_from_row((requestor, target, status, created_at, updated_at): EdgeRow) -> Result<Edge> {
    let status = EdgeStatus::parse(&status)
        .ok_or_else(|| GraphError::Storage(format!("unknown relationship status: {status}")))?;
    Ok(Edge {
        requestor: AccountId::from_stored(requestor),
        target: AccountId::from_stored(target),
        status,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

fn collect_accounts(rows: Vec<(String,)>) -> BTreeSet<AccountId> {
    rows.into_iter()
        .map(|(id,)| AccountId::from_stored(id))
        .collect()
}

#[async_trait]
impl EdgeStore for SqliteEdgeStore {
    #[instrument(skip(self))]
    async fn find_edges_between(&self, a: &AccountId, b: &AccountId) -> Result<RelationshipSet> {
        let rows = sqlx::query_as::<_, EdgeRow>(
            "SELECT requestor, target, status, created_at, updated_at
             FROM relationships
             WHERE (requestor = ?1 AND target = ?2) OR (requestor = ?2 AND target = ?1)
             ORDER BY id",
        )
        .bind(a.as_str())
        .bind(b.as_str())
        .fetch_all(&self.pool)
        .await?;

        let edges = rows
            .into_iter()
            .map(edge_from_row)
            .collect::<Result<Vec<_>>>()?;
        Ok(RelationshipSet::new(edges))
    }

    #[instrument(skip(self))]
    async fn insert_edge(
        &self,
        requestor: &AccountId,
        target: &AccountId,
        status: EdgeStatus,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let now = now.to_rfc3339();
        sqlx::query(
            "INSERT INTO relationships (requestor, target, status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)",
        )
        .bind(requestor.as_str())
        .bind(target.as_str())
        .bind(status.as_str())
        .bind(&now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn update_edge_status(
        &self,
        requestor: &AccountId,
        target: &AccountId,
        status: EdgeStatus,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let result = sqlx::query(
            "UPDATE relationships SET status = ?1, updated_at = ?2
             WHERE requestor = ?3 AND target = ?4",
        )
        .bind(status.as_str())
        .bind(now.to_rfc3339())
        .bind(requestor.as_str())
        .bind(target.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(GraphError::Storage(format!(
                "no relationship from {requestor} to {target}"
            )));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn friends_of(&self, account: &AccountId) -> Result<BTreeSet<AccountId>> {
        let rows = sqlx::query_as::<_, (String,)>(
            "SELECT outbound.target
             FROM relationships outbound
             INNER JOIN relationships inbound
                ON inbound.requestor = outbound.target
                AND inbound.target = outbound.requestor
             WHERE outbound.requestor = ?1
                AND outbound.status = ?2
                AND inbound.status = ?2",
        )
        .bind(account.as_str())
        .bind(EdgeStatus::Friend.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(collect_accounts(rows))
    }

    #[instrument(skip(self))]
    async fn common_friends_of(
        &self,
        a: &AccountId,
        b: &AccountId,
    ) -> Result<BTreeSet<AccountId>> {
        // fa/fa_back: a <-> T, fb/fb_back: b <-> T, all friend edges.
        let rows = sqlx::query_as::<_, (String,)>(
            "SELECT fa.target
             FROM relationships fa
             INNER JOIN relationships fa_back
                ON fa_back.requestor = fa.target
                AND fa_back.target = fa.requestor
                AND fa_back.status = ?3
             INNER JOIN relationships fb
                ON fb.target = fa.target
                AND fb.requestor = ?2
                AND fb.status = ?3
             INNER JOIN relationships fb_back
                ON fb_back.requestor = fb.target
                AND fb_back.target = fb.requestor
                AND fb_back.status = ?3
             WHERE fa.requestor = ?1
                AND fa.status = ?3
                AND EXISTS (
                    SELECT 1 FROM relationships link
                    WHERE (link.requestor = ?1 AND link.target = ?2)
                       OR (link.requestor = ?2 AND link.target = ?1)
                )",
        )
        .bind(a.as_str())
        .bind(b.as_str())
        .bind(EdgeStatus::Friend.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(collect_accounts(rows))
    }

    #[instrument(skip(self))]
    async fn subscribers_of(&self, account: &AccountId) -> Result<BTreeSet<AccountId>> {
        // The reverse edge may be missing: subscriptions are one-way.
        let rows = sqlx::query_as::<_, (String,)>(
            "SELECT inbound.requestor
             FROM relationships inbound
             LEFT JOIN relationships outbound
                ON outbound.requestor = inbound.target
                AND outbound.target = inbound.requestor
             WHERE inbound.target = ?1
                AND (
                    (inbound.status = ?2 AND outbound.status = ?2)
                    OR (inbound.status = ?3
                        AND (outbound.status IS NULL OR outbound.status <> ?4))
                )",
        )
        .bind(account.as_str())
        .bind(EdgeStatus::Friend.as_str())
        .bind(EdgeStatus::Subscribed.as_str())
        .bind(EdgeStatus::Blocked.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(collect_accounts(rows))
    }
}
