//! In-memory edge storage.

use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::EdgeStore;
use crate::account::AccountId;
use crate::error::{GraphError, Result};
use crate::schema::{Edge, EdgeStatus, RelationshipSet};

/// Edge storage held in process memory. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryEdgeStore {
    edges: RwLock<Vec<Edge>>,
}

impl MemoryEdgeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every stored edge, in insertion order.
    pub async fn edges(&self) -> Vec<Edge> {
        self.edges.read().await.clone()
    }

    pub async fn edge_count(&self) -> usize {
        self.edges.read().await.len()
    }
}

fn status_between(edges: &[Edge], requestor: &AccountId, target: &AccountId) -> Option<EdgeStatus> {
    edges
        .iter()
        .find(|e| e.connects(requestor, target))
        .map(|e| e.status)
}

fn mutual_friends(edges: &[Edge], account: &AccountId) -> BTreeSet<AccountId> {
    edges
        .iter()
        .filter(|e| &e.requestor == account && e.status == EdgeStatus::Friend)
        .filter(|e| status_between(edges, &e.target, account) == Some(EdgeStatus::Friend))
        .map(|e| e.target.clone())
        .collect()
}

#[async_trait]
impl EdgeStore for MemoryEdgeStore {
    async fn find_edges_between(&self, a: &AccountId, b: &AccountId) -> Result<RelationshipSet> {
        let edges = self.edges.read().await;
        Ok(RelationshipSet::new(
            edges
                .iter()
                .filter(|e| e.connects(a, b) || e.connects(b, a))
                .cloned()
                .collect(),
        ))
    }

    async fn insert_edge(
        &self,
        requestor: &AccountId,
        target: &AccountId,
        status: EdgeStatus,
        now: DateTime<Utc>,
    ) -> Result<()> {
        self.edges
            .write()
            .await
            .push(Edge::new(requestor.clone(), target.clone(), status, now));
        Ok(())
    }

    async fn update_edge_status(
        &self,
        requestor: &AccountId,
        target: &AccountId,
        status: EdgeStatus,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let mut edges = self.edges.write().await;
        let mut updated = false;
        for edge in edges.iter_mut().filter(|e| e.connects(requestor, target)) {
            edge.status = status;
            edge.updated_at = now;
            updated = true;
        }
        if !updated {
            return Err(GraphError::Storage(format!(
                "no relationship from {requestor} to {target}"
            )));
        }
        Ok(())
    }

    async fn friends_of(&self, account: &AccountId) -> Result<BTreeSet<AccountId>> {
        let edges = self.edges.read().await;
        Ok(mutual_friends(&edges, account))
    }

    async fn common_friends_of(
        &self,
        a: &AccountId,
        b: &AccountId,
    ) -> Result<BTreeSet<AccountId>> {
        let edges = self.edges.read().await;
        let connected = edges.iter().any(|e| e.connects(a, b) || e.connects(b, a));
        if !connected {
            return Ok(BTreeSet::new());
        }
        let of_b = mutual_friends(&edges, b);
        Ok(mutual_friends(&edges, a)
            .into_iter()
            .filter(|t| of_b.contains(t))
            .collect())
    }

    async fn subscribers_of(&self, account: &AccountId) -> Result<BTreeSet<AccountId>> {
        let edges = self.edges.read().await;
        Ok(edges
            .iter()
            .filter(|e| &e.target == account)
            .filter(|e| {
                let reverse = status_between(&edges, account, &e.requestor);
                match e.status {
                    EdgeStatus::Friend => reverse == Some(EdgeStatus::Friend),
                    EdgeStatus::Subscribed => reverse != Some(EdgeStatus::Blocked),
                    EdgeStatus::Blocked => false,
                }
            })
            .map(|e| e.requestor.clone())
            .collect())
    }
}
