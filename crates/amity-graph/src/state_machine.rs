//! Relationship state machine.
//!
//! Decides whether a friendship, subscription or block may be created given
//! the edges already stored between the two accounts, then performs the
//! writes. Guard checks read the whole relationship set first and evaluate
//! `Blocked`, then `Friend`, then `Subscribed`.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument, warn};

use crate::account::AccountId;
use crate::error::{GraphError, Result};
use crate::locks::PairLocks;
use crate::schema::{EdgeStatus, RelationshipSet};
use crate::storage::EdgeStore;

/// Guarded writer of relationship edges.
#[derive(Clone)]
pub struct RelationshipMachine {
    store: Arc<dyn EdgeStore>,
    locks: Option<Arc<PairLocks>>,
}

/// Validate the requestor/target pair shared by subscribe and block.
fn directed_pair(requestor: &str, target: &str) -> Result<(AccountId, AccountId)> {
    let mut missing = Vec::new();
    if requestor.trim().is_empty() {
        missing.push("no requestor was provided");
    }
    if target.trim().is_empty() {
        missing.push("no target was provided");
    }
    if !missing.is_empty() {
        return Err(GraphError::invalid(missing.join(",")));
    }

    match (AccountId::parse(requestor), AccountId::parse(target)) {
        (Some(requestor), Some(target)) => Ok((requestor, target)),
        _ => Err(GraphError::invalid("invalid email being submitted")),
    }
}

fn reject_conflict(set: &RelationshipSet) -> Result<()> {
    match set.strongest() {
        Some((status, message)) => {
            warn!(?status, "relationship rejected: {}", message);
            Err(GraphError::Conflict(message))
        }
        None => Ok(()),
    }
}

impl RelationshipMachine {
    /// A machine that serializes writes per account pair.
    pub fn new(store: Arc<dyn EdgeStore>) -> Self {
        Self {
            store,
            locks: Some(Arc::new(PairLocks::new())),
        }
    }

    /// A machine without pair serialization. Concurrent writers on the same
    /// pair may both pass the guard check.
    pub fn unserialized(store: Arc<dyn EdgeStore>) -> Self {
        Self { store, locks: None }
    }

    pub fn is_serialized(&self) -> bool {
        self.locks.is_some()
    }

    async fn guard(
        &self,
        a: &AccountId,
        b: &AccountId,
    ) -> Option<tokio::sync::OwnedMutexGuard<()>> {
        match &self.locks {
            Some(locks) => Some(locks.acquire(a, b).await),
            None => None,
        }
    }

    /// Make two accounts friends by writing the edge pair `(a, b)`, `(b, a)`.
    ///
    /// Exactly two identifiers are required. Any existing edge between the
    /// pair, in either direction, is a conflict.
    #[instrument(skip(self, users), fields(count = users.len()))]
    pub async fn create_friendship<S: AsRef<str>>(&self, users: &[S]) -> Result<()> {
        let [first, second] = users else {
            return Err(GraphError::invalid("incorrect number of friends"));
        };
        let (a, b) = match (AccountId::parse(first.as_ref()), AccountId::parse(second.as_ref())) {
            (Some(a), Some(b)) => (a, b),
            _ => return Err(GraphError::invalid("invalid email being submitted")),
        };
        if a == b {
            return Err(GraphError::invalid("cannot be friends with oneself"));
        }

        let _guard = self.guard(&a, &b).await;
        let existing = self.store.find_edges_between(&a, &b).await?;
        reject_conflict(&existing)?;

        let now = Utc::now();
        self.store
            .insert_edge(&a, &b, EdgeStatus::Friend, now)
            .await?;
        // A failure here leaves the first edge in place; friends_of ignores
        // half-written pairs.
        self.store
            .insert_edge(&b, &a, EdgeStatus::Friend, now)
            .await?;

        info!(%a, %b, "friendship created");
        Ok(())
    }

    /// Subscribe `requestor` to updates from `target`.
    ///
    /// Any existing edge between the pair, in either direction, is a conflict.
    #[instrument(skip(self))]
    pub async fn subscribe(&self, requestor: &str, target: &str) -> Result<()> {
        let (requestor, target) = directed_pair(requestor, target)?;
        if requestor == target {
            return Err(GraphError::invalid("cannot subscribe to oneself"));
        }

        let _guard = self.guard(&requestor, &target).await;
        let existing = self.store.find_edges_between(&requestor, &target).await?;
        reject_conflict(&existing)?;

        self.store
            .insert_edge(&requestor, &target, EdgeStatus::Subscribed, Utc::now())
            .await?;

        info!(%requestor, %target, "subscription created");
        Ok(())
    }

    /// Block updates from `target` to `requestor`.
    ///
    /// An existing block in either direction is a conflict. An existing
    /// `(requestor, target)` friend or subscription edge is overwritten in
    /// place; the reverse edge is left untouched. Otherwise a new blocked
    /// edge is inserted.
    #[instrument(skip(self))]
    pub async fn block(&self, requestor: &str, target: &str) -> Result<()> {
        let (requestor, target) = directed_pair(requestor, target)?;
        if requestor == target {
            return Err(GraphError::invalid("cannot block oneself"));
        }

        let _guard = self.guard(&requestor, &target).await;
        let existing = self.store.find_edges_between(&requestor, &target).await?;
        if let Some(message) = existing.describe(EdgeStatus::Blocked) {
            warn!("block rejected: {}", message);
            return Err(GraphError::Conflict(message));
        }

        let now = Utc::now();
        match existing.edge(&requestor, &target) {
            Some(edge) => {
                self.store
                    .update_edge_status(&requestor, &target, EdgeStatus::Blocked, now)
                    .await?;
                info!(%requestor, %target, previous = edge.status.as_str(), "relationship blocked");
            }
            None => {
                self.store
                    .insert_edge(&requestor, &target, EdgeStatus::Blocked, now)
                    .await?;
                info!(%requestor, %target, "block created");
            }
        }
        Ok(())
    }
}
