//! Read-side graph queries: friends, common friends and update recipients.

use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::account::AccountId;
use crate::error::{GraphError, Result};
use crate::mentions::extract_mentions;
use crate::schema::{EdgeStatus, FriendList};
use crate::storage::EdgeStore;

/// Read-only queries over the relationship graph.
#[derive(Clone)]
pub struct QueryEngine {
    store: Arc<dyn EdgeStore>,
}

impl QueryEngine {
    pub fn new(store: Arc<dyn EdgeStore>) -> Self {
        Self { store }
    }

    /// Mutual friends of `account`.
    ///
    /// Zero friends is reported as [`GraphError::Empty`], which callers may
    /// treat as an empty answer.
    #[instrument(skip(self))]
    pub async fn list_friends(&self, account: &str) -> Result<FriendList> {
        let account = AccountId::parse(account).ok_or_else(|| GraphError::invalid("invalid user"))?;

        let friends = self.store.friends_of(&account).await?;
        debug!(%account, count = friends.len(), "friends listed");
        if friends.is_empty() {
            return Err(GraphError::Empty("user doesn't have any friends".to_string()));
        }
        Ok(FriendList::new(friends.into_iter().collect()))
    }

    /// Friends shared by exactly two accounts.
    ///
    /// A block between the two, in either direction, is reported as a
    /// conflict before any intersection is computed.
    #[instrument(skip(self, users), fields(count = users.len()))]
    pub async fn list_common_friends<S: AsRef<str>>(&self, users: &[S]) -> Result<FriendList> {
        let [first, second] = users else {
            return Err(GraphError::invalid("incorrect number of friends"));
        };
        let (a, b) = match (AccountId::parse(first.as_ref()), AccountId::parse(second.as_ref())) {
            (Some(a), Some(b)) => (a, b),
            _ => return Err(GraphError::invalid("invalid user")),
        };

        let existing = self.store.find_edges_between(&a, &b).await?;
        if let Some(message) = existing.describe(EdgeStatus::Blocked) {
            warn!("common friends rejected: {}", message);
            return Err(GraphError::Conflict(message));
        }

        let common = self.store.common_friends_of(&a, &b).await?;
        debug!(%a, %b, count = common.len(), "common friends listed");
        if common.is_empty() {
            return Err(GraphError::Empty(
                "users doesn't have any common friends".to_string(),
            ));
        }
        Ok(FriendList::new(common.into_iter().collect()))
    }

    /// Accounts that should receive an update posted by `sender`.
    ///
    /// Accounts mentioned in `text` come first, in order of appearance,
    /// followed by the sender's friends and subscribers. Mentions are not
    /// subject to blocks.
    #[instrument(skip(self, text), fields(text_len = text.len()))]
    pub async fn resolve_subscribers(&self, sender: &str, text: &str) -> Result<Vec<AccountId>> {
        if sender.trim().is_empty() {
            return Err(GraphError::invalid("invalid message"));
        }
        let sender = AccountId::parse(sender).ok_or_else(|| GraphError::invalid("invalid user"))?;

        let mut recipients = extract_mentions(text);
        let mentioned = recipients.len();
        for subscriber in self.store.subscribers_of(&sender).await? {
            if !recipients.contains(&subscriber) {
                recipients.push(subscriber);
            }
        }

        debug!(%sender, mentioned, total = recipients.len(), "recipients resolved");
        Ok(recipients)
    }
}
