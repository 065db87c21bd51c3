//! Relationship schema definitions.
//!
//! This module defines the core types of the relationship graph:
//! - `EdgeStatus`: The three mutually exclusive relationship states
//! - `Edge`: A directed, timestamped relationship between two accounts
//! - `RelationshipSet`: Every edge found between a pair, in both directions
//! - `FriendList`: The answer to a friends or common-friends query

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::account::AccountId;

/// Status carried by a directed edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeStatus {
    /// One half of a mutual friendship (always written in pairs)
    Friend,
    /// Requestor blocks updates from target
    Blocked,
    /// Requestor receives updates from target
    Subscribed,
}

impl EdgeStatus {
    /// Guard evaluation order: a block outranks a friendship, which
    /// outranks a subscription.
    pub const PRECEDENCE: [EdgeStatus; 3] =
        [EdgeStatus::Blocked, EdgeStatus::Friend, EdgeStatus::Subscribed];

    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeStatus::Friend => "friend",
            EdgeStatus::Blocked => "blocked",
            EdgeStatus::Subscribed => "subscribed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "friend" => Some(EdgeStatus::Friend),
            "blocked" => Some(EdgeStatus::Blocked),
            "subscribed" => Some(EdgeStatus::Subscribed),
            _ => None,
        }
    }
}

/// A stored relationship edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub requestor: AccountId,
    pub target: AccountId,
    pub status: EdgeStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Edge {
    pub fn new(
        requestor: AccountId,
        target: AccountId,
        status: EdgeStatus,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            requestor,
            target,
            status,
            created_at: now,
            updated_at: now,
        }
    }

    /// True if this edge runs from `requestor` to `target`.
    pub fn connects(&self, requestor: &AccountId, target: &AccountId) -> bool {
        &self.requestor == requestor && &self.target == target
    }

    /// Sentence describing this edge, used in conflict messages.
    pub fn describe(&self) -> String {
        match self.status {
            EdgeStatus::Blocked => format!("{} has blocked {}", self.requestor, self.target),
            EdgeStatus::Friend => {
                format!("{} is already a friend of {}", self.requestor, self.target)
            }
            EdgeStatus::Subscribed => {
                format!("{} has already subscribed to {}", self.requestor, self.target)
            }
        }
    }
}

/// All edges between two accounts, in either direction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationshipSet {
    edges: Vec<Edge>,
}

impl RelationshipSet {
    pub fn new(edges: Vec<Edge>) -> Self {
        Self { edges }
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// The edge running from `requestor` to `target`, if one exists.
    pub fn edge(&self, requestor: &AccountId, target: &AccountId) -> Option<&Edge> {
        self.edges.iter().find(|e| e.connects(requestor, target))
    }

    pub fn has_status(&self, status: EdgeStatus) -> bool {
        self.edges.iter().any(|e| e.status == status)
    }

    /// Describe every edge with `status`, joined with commas. `None` when
    /// no edge has that status.
    pub fn describe(&self, status: EdgeStatus) -> Option<String> {
        let messages: Vec<String> = self
            .edges
            .iter()
            .filter(|e| e.status == status)
            .map(Edge::describe)
            .collect();
        (!messages.is_empty()).then(|| messages.join(","))
    }

    /// The highest-precedence status present, with its composed message.
    pub fn strongest(&self) -> Option<(EdgeStatus, String)> {
        EdgeStatus::PRECEDENCE
            .iter()
            .find_map(|status| self.describe(*status).map(|message| (*status, message)))
    }
}

/// Friends (or common friends) of an account, with their count.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendList {
    pub friends: Vec<AccountId>,
    pub count: usize,
}

impl FriendList {
    pub fn new(friends: Vec<AccountId>) -> Self {
        let count = friends.len();
        Self { friends, count }
    }

    pub fn is_empty(&self) -> bool {
        self.friends.is_empty()
    }

    pub fn contains(&self, account: &AccountId) -> bool {
        self.friends.contains(account)
    }
}
