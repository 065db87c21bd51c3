//! Amity API - the request adapter in front of the graph engine.
//!
//! Requests are JSON objects naming a method and its params; every request,
//! successful or not, is answered with an [`Envelope`].

use anyhow::{anyhow, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use amity_graph::{AccountId, FriendList, GraphEngine, GraphError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    pub id: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Response envelope shared by every method.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub friends: Vec<String>,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub count: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recipients: Vec<String>,
}

fn is_zero(n: &usize) -> bool {
    *n == 0
}

fn into_strings(accounts: Vec<AccountId>) -> Vec<String> {
    accounts.into_iter().map(AccountId::into_string).collect()
}

impl Envelope {
    pub fn ok() -> Self {
        Self {
            success: true,
            ..Self::default()
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            errors: Some(message.into()),
            ..Self::default()
        }
    }

    fn with_id(mut self, id: Option<String>) -> Self {
        self.id = id;
        self
    }

    fn from_graph_error(err: GraphError) -> Self {
        if err.is_store_failure() {
            error!("store failure: {}", err);
        }
        Self::failure(err.to_string())
    }

    fn from_write(result: amity_graph::Result<()>) -> Self {
        match result {
            Ok(()) => Self::ok(),
            Err(err) => Self::from_graph_error(err),
        }
    }

    fn from_friends(result: amity_graph::Result<FriendList>) -> Self {
        match result {
            Ok(list) => Self {
                success: true,
                count: list.count,
                friends: into_strings(list.friends),
                ..Self::default()
            },
            Err(err) => Self::from_graph_error(err),
        }
    }

    fn from_recipients(result: amity_graph::Result<Vec<AccountId>>) -> Self {
        match result {
            Ok(recipients) => Self {
                success: true,
                recipients: into_strings(recipients),
                ..Self::default()
            },
            Err(err) => Self::from_graph_error(err),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FriendsParams {
    pub friends: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct EmailParams {
    pub email: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PairParams {
    pub requestor: String,
    pub target: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct MessageParams {
    pub sender: String,
    pub text: String,
}

fn parse_params<T: DeserializeOwned + Default>(params: serde_json::Value) -> Result<T> {
    if params.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(params).map_err(|err| anyhow!("invalid data err: {}", err))
}

pub struct Handler {
    engine: GraphEngine,
}

impl Handler {
    pub fn new(engine: GraphEngine) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &GraphEngine {
        &self.engine
    }

    /// Decode one request line and dispatch it.
    pub async fn handle_line(&self, line: &str) -> Envelope {
        match serde_json::from_str::<Request>(line) {
            Ok(request) => self.handle(request).await,
            Err(err) => Envelope::failure(format!("invalid data err: {}", err)),
        }
    }

    pub async fn handle(&self, request: Request) -> Envelope {
        let id = request.id.clone();
        let method = request.method.clone().unwrap_or_default();
        debug!(?id, %method, "dispatching request");

        let envelope = match self.dispatch(&method, request.params).await {
            Ok(envelope) => envelope,
            Err(err) => Envelope::failure(err.to_string()),
        };
        envelope.with_id(id)
    }

    async fn dispatch(&self, method: &str, params: serde_json::Value) -> Result<Envelope> {
        let relationships = self.engine.relationships();
        let queries = self.engine.queries();

        let envelope = match method {
            "create_friendship" => {
                let params: FriendsParams = parse_params(params)?;
                Envelope::from_write(relationships.create_friendship(params.friends.as_slice()).await)
            }
            "list_friends" => {
                let params: EmailParams = parse_params(params)?;
                Envelope::from_friends(queries.list_friends(&params.email).await)
            }
            "common_friends" => {
                let params: FriendsParams = parse_params(params)?;
                Envelope::from_friends(queries.list_common_friends(params.friends.as_slice()).await)
            }
            "subscribe" => {
                let params: PairParams = parse_params(params)?;
                Envelope::from_write(relationships.subscribe(&params.requestor, &params.target).await)
            }
            "block" => {
                let params: PairParams = parse_params(params)?;
                Envelope::from_write(relationships.block(&params.requestor, &params.target).await)
            }
            "recipients" => {
                let params: MessageParams = parse_params(params)?;
                Envelope::from_recipients(
                    queries.resolve_subscribers(&params.sender, &params.text).await,
                )
            }
            other => Envelope::failure(format!("unknown method: {}", other)),
        };
        Ok(envelope)
    }
}
