//! Racing writers on the same account pair.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use amity_graph::{
    AccountId, EdgeStatus, EdgeStore, EngineConfig, GraphEngine, GraphError, MemoryEdgeStore,
    RelationshipSet, Result,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Widens the read-then-write window so racing requests overlap.
struct SlowReads {
    inner: MemoryEdgeStore,
    delay: Duration,
}

#[async_trait]
impl EdgeStore for SlowReads {
    async fn find_edges_between(&self, a: &AccountId, b: &AccountId) -> Result<RelationshipSet> {
        let set = self.inner.find_edges_between(a, b).await?;
        tokio::time::sleep(self.delay).await;
        Ok(set)
    }

    async fn insert_edge(
        &self,
        requestor: &AccountId,
        target: &AccountId,
        status: EdgeStatus,
        now: DateTime<Utc>,
    ) -> Result<()> {
        self.inner.insert_edge(requestor, target, status, now).await
    }

    async fn update_edge_status(
        &self,
        requestor: &AccountId,
        target: &AccountId,
        status: EdgeStatus,
        now: DateTime<Utc>,
    ) -> Result<()> {
        self.inner
            .update_edge_status(requestor, target, status, now)
            .await
    }

    async fn friends_of(&self, account: &AccountId) -> Result<BTreeSet<AccountId>> {
        self.inner.friends_of(account).await
    }

    async fn common_friends_of(
        &self,
        a: &AccountId,
        b: &AccountId,
    ) -> Result<BTreeSet<AccountId>> {
        self.inner.common_friends_of(a, b).await
    }

    async fn subscribers_of(&self, account: &AccountId) -> Result<BTreeSet<AccountId>> {
        self.inner.subscribers_of(account).await
    }
}

fn slow_store() -> Arc<SlowReads> {
    Arc::new(SlowReads {
        inner: MemoryEdgeStore::new(),
        delay: Duration::from_millis(50),
    })
}

async fn race_friendships(engine: &GraphEngine, writers: usize) -> (usize, usize) {
    let mut handles = Vec::new();
    for i in 0..writers {
        let engine = engine.clone();
        handles.push(tokio::spawn(async move {
            let pair = if i % 2 == 0 {
                ["a@x.com", "b@x.com"]
            } else {
                ["B@x.com", "A@x.com"]
            };
            engine.relationships().create_friendship(&pair).await
        }));
    }

    let (mut won, mut conflicted) = (0, 0);
    for handle in handles {
        match handle.await.unwrap() {
            Ok(()) => won += 1,
            Err(GraphError::Conflict(_)) => conflicted += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    (won, conflicted)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn serialized_pair_admits_one_friendship() {
    let store = slow_store();
    let engine = GraphEngine::new(store.clone());

    let (won, conflicted) = race_friendships(&engine, 16).await;
    assert_eq!(won, 1);
    assert_eq!(conflicted, 15);
    assert_eq!(store.inner.edge_count().await, 2);

    let friends = engine.queries().list_friends("a@x.com").await.unwrap();
    assert_eq!(friends.count, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn serialized_pair_admits_one_block() {
    let store = slow_store();
    let engine = GraphEngine::new(store.clone());

    let mut handles = Vec::new();
    for i in 0..8 {
        let engine = engine.clone();
        handles.push(tokio::spawn(async move {
            if i % 2 == 0 {
                engine.relationships().block("a@x.com", "b@x.com").await
            } else {
                engine.relationships().block("b@x.com", "a@x.com").await
            }
        }));
    }
    let mut won = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            won += 1;
        }
    }
    assert_eq!(won, 1);
    assert_eq!(store.inner.edge_count().await, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn distinct_pairs_proceed_in_parallel() {
    let store = slow_store();
    let engine = GraphEngine::new(store.clone());

    let mut handles = Vec::new();
    for i in 0..8 {
        let engine = engine.clone();
        handles.push(tokio::spawn(async move {
            let other = format!("friend{i}@x.com");
            engine
                .relationships()
                .create_friendship(&["hub@x.com".to_string(), other])
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let friends = engine.queries().list_friends("hub@x.com").await.unwrap();
    assert_eq!(friends.count, 8);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn unserialized_writes_race() {
    let store = slow_store();
    let engine = GraphEngine::with_config(
        store.clone(),
        EngineConfig {
            serialize_pair_writes: false,
        },
    );
    assert!(!engine.relationships().is_serialized());

    let (won, _) = race_friendships(&engine, 8).await;
    assert!(won > 1, "expected the guard race to admit several writers");
    assert!(store.inner.edge_count().await > 2);
}
