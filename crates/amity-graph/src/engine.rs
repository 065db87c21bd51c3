//! The assembled graph engine: one store shared by the state machine and
//! the query engine.

use std::sync::Arc;

use crate::query::QueryEngine;
use crate::state_machine::RelationshipMachine;
use crate::storage::EdgeStore;

/// Configuration for the graph engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Serialize guard-check-then-write per unordered account pair (default: true)
    pub serialize_pair_writes: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            serialize_pair_writes: true,
        }
    }
}

/// Relationship writes and graph reads over a single edge store.
#[derive(Clone)]
pub struct GraphEngine {
    relationships: RelationshipMachine,
    queries: QueryEngine,
}

impl GraphEngine {
    /// Create an engine with default configuration.
    pub fn new(store: Arc<dyn EdgeStore>) -> Self {
        Self::with_config(store, EngineConfig::default())
    }

    /// Create an engine with custom configuration.
    pub fn with_config(store: Arc<dyn EdgeStore>, config: EngineConfig) -> Self {
        let relationships = if config.serialize_pair_writes {
            RelationshipMachine::new(store.clone())
        } else {
            RelationshipMachine::unserialized(store.clone())
        };
        Self {
            relationships,
            queries: QueryEngine::new(store),
        }
    }

    pub fn relationships(&self) -> &RelationshipMachine {
        &self.relationships
    }

    pub fn queries(&self) -> &QueryEngine {
        &self.queries
    }
}
