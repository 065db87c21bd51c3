//! Amity Graph - the relationship graph engine.
//!
//! Accounts (email addresses) are connected by directed edges carrying one
//! of three states: friend, blocked, subscribed. This crate provides:
//!
//! - **Accounts**: Email normalization and validation
//! - **Storage**: The `EdgeStore` trait with `SQLite` and in-memory backends
//! - **State Machine**: Guarded creation of friendships, subscriptions and blocks
//! - **Queries**: Friends, common friends and update recipients
//! - **Mentions**: Email extraction from message text
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use amity_graph::{GraphEngine, SqliteEdgeStore};
//!
//! SqliteEdgeStore::init_schema(&pool).await?;
//! let engine = GraphEngine::new(Arc::new(SqliteEdgeStore::new(pool)));
//!
//! engine
//!     .relationships()
//!     .create_friendship(&["andy@example.com", "john@example.com"])
//!     .await?;
//! let friends = engine.queries().list_friends("andy@example.com").await?;
//! assert_eq!(friends.count, 1);
//! ```

pub mod account;
pub mod engine;
pub mod error;
pub mod locks;
pub mod mentions;
pub mod query;
pub mod schema;
pub mod state_machine;
pub mod storage;

// Re-export commonly used types
pub use account::AccountId;
pub use engine::{EngineConfig, GraphEngine};
pub use error::{GraphError, Result};
pub use locks::PairLocks;
pub use mentions::extract_mentions;
pub use query::QueryEngine;
pub use schema::{Edge, EdgeStatus, FriendList, RelationshipSet};
pub use state_machine::RelationshipMachine;
pub use storage::{EdgeStore, MemoryEdgeStore, SqliteEdgeStore};
