//! Edge storage.
//!
//! `EdgeStore` is the persistence boundary of the engine. Every graph
//! operation reads and writes through it; the engine never talks to a
//! database directly.
//!
//! Two implementations ship with the crate:
//! - [`SqliteEdgeStore`]: the `relationships` table in `SQLite`
//! - [`MemoryEdgeStore`]: an in-process edge list for tests and ephemeral runs

use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::account::AccountId;
use crate::error::Result;
use crate::schema::{EdgeStatus, RelationshipSet};

mod memory;
mod sqlite;

pub use memory::MemoryEdgeStore;
pub use sqlite::SqliteEdgeStore;

/// Persistence over directed relationship edges.
///
/// Reads have no side effects. Writes do not deduplicate: callers check the
/// relationship set before inserting.
#[async_trait]
pub trait EdgeStore: Send + Sync {
    /// Every edge from `a` to `b` or from `b` to `a`.
    async fn find_edges_between(&self, a: &AccountId, b: &AccountId) -> Result<RelationshipSet>;

    /// Insert a new edge.
    async fn insert_edge(
        &self,
        requestor: &AccountId,
        target: &AccountId,
        status: EdgeStatus,
        now: DateTime<Utc>,
    ) -> Result<()>;

    /// Change the status of the existing edge from `requestor` to `target`.
    async fn update_edge_status(
        &self,
        requestor: &AccountId,
        target: &AccountId,
        status: EdgeStatus,
        now: DateTime<Utc>,
    ) -> Result<()>;

    /// Accounts with a `Friend` edge in both directions to `account`.
    async fn friends_of(&self, account: &AccountId) -> Result<BTreeSet<AccountId>>;

    /// Accounts that are friends of both `a` and `b`. Empty unless `a` and
    /// `b` share at least one edge of any status.
    async fn common_friends_of(&self, a: &AccountId, b: &AccountId)
        -> Result<BTreeSet<AccountId>>;

    /// Accounts that receive updates from `account`: mutual friends plus
    /// subscribers, minus anyone `account` has blocked.
    async fn subscribers_of(&self, account: &AccountId) -> Result<BTreeSet<AccountId>>;
}
