//! End-to-end request handling over JSON lines.

use std::sync::Arc;

use amity_api::{Envelope, Handler};
use amity_graph::{GraphEngine, MemoryEdgeStore, SqliteEdgeStore};
use serde_json::json;
use sqlx::sqlite::SqlitePoolOptions;

fn memory_handler() -> Handler {
    Handler::new(GraphEngine::new(Arc::new(MemoryEdgeStore::new())))
}

async fn send(handler: &Handler, method: &str, params: serde_json::Value) -> Envelope {
    let line = json!({"method": method, "params": params}).to_string();
    handler.handle_line(&line).await
}

#[tokio::test]
async fn friendship_round_trip() {
    let handler = memory_handler();

    let created = send(
        &handler,
        "create_friendship",
        json!({"friends": ["andy@example.com", "john@example.com"]}),
    )
    .await;
    assert_eq!(created, Envelope::ok());

    let listed = send(&handler, "list_friends", json!({"email": "andy@example.com"})).await;
    assert!(listed.success);
    assert_eq!(listed.friends, vec!["john@example.com"]);
    assert_eq!(listed.count, 1);

    let again = send(
        &handler,
        "create_friendship",
        json!({"friends": ["john@example.com", "andy@example.com"]}),
    )
    .await;
    assert!(!again.success);
    assert!(again
        .errors
        .unwrap()
        .contains("is already a friend of"));
}

#[tokio::test]
async fn input_errors_are_reported() {
    let handler = memory_handler();

    let none = send(&handler, "create_friendship", json!({})).await;
    assert_eq!(none.errors.as_deref(), Some("incorrect number of friends"));

    let empty = send(&handler, "create_friendship", json!({"friends": []})).await;
    assert_eq!(empty.errors.as_deref(), Some("incorrect number of friends"));

    let common = send(&handler, "common_friends", json!({"friends": []})).await;
    assert_eq!(common.errors.as_deref(), Some("incorrect number of friends"));

    let one = send(&handler, "create_friendship", json!({"friends": ["a@x.com"]})).await;
    assert_eq!(one.errors.as_deref(), Some("incorrect number of friends"));

    let same = send(
        &handler,
        "create_friendship",
        json!({"friends": ["a@x.com", "a@x.com"]}),
    )
    .await;
    assert_eq!(same.errors.as_deref(), Some("cannot be friends with oneself"));

    let email = send(&handler, "list_friends", json!({"email": ""})).await;
    assert_eq!(email.errors.as_deref(), Some("invalid user"));

    let pair = send(&handler, "subscribe", json!({})).await;
    assert_eq!(
        pair.errors.as_deref(),
        Some("no requestor was provided,no target was provided")
    );

    let message = send(&handler, "recipients", json!({"text": "hi"})).await;
    assert_eq!(message.errors.as_deref(), Some("invalid message"));
}

#[tokio::test]
async fn malformed_lines_and_unknown_methods() {
    let handler = memory_handler();

    let garbage = handler.handle_line("{not json").await;
    assert!(!garbage.success);
    assert!(garbage.errors.unwrap().starts_with("invalid data err:"));

    let unknown = handler
        .handle_line(r#"{"id": "9", "method": "unfriend", "params": {}}"#)
        .await;
    assert_eq!(unknown.id.as_deref(), Some("9"));
    assert_eq!(unknown.errors.as_deref(), Some("unknown method: unfriend"));
}

#[tokio::test]
async fn subscribe_block_and_recipients() {
    let handler = memory_handler();

    let subscribed = send(
        &handler,
        "subscribe",
        json!({"requestor": "lisa@example.com", "target": "john@example.com"}),
    )
    .await;
    assert!(subscribed.success);

    let repeated = send(
        &handler,
        "subscribe",
        json!({"requestor": "lisa@example.com", "target": "john@example.com"}),
    )
    .await;
    assert_eq!(
        repeated.errors.as_deref(),
        Some("lisa@example.com has already subscribed to john@example.com")
    );

    send(
        &handler,
        "create_friendship",
        json!({"friends": ["john@example.com", "sean@example.com"]}),
    )
    .await;

    let recipients = send(
        &handler,
        "recipients",
        json!({"sender": "john@example.com", "text": "Hello World! kate@example.com"}),
    )
    .await;
    assert!(recipients.success);
    assert_eq!(
        recipients.recipients,
        vec!["kate@example.com", "lisa@example.com", "sean@example.com"]
    );

    let blocked = send(
        &handler,
        "block",
        json!({"requestor": "john@example.com", "target": "sean@example.com"}),
    )
    .await;
    assert!(blocked.success);

    let after_block = send(
        &handler,
        "recipients",
        json!({"sender": "john@example.com", "text": ""}),
    )
    .await;
    assert_eq!(after_block.recipients, vec!["lisa@example.com"]);

    let block_again = send(
        &handler,
        "block",
        json!({"requestor": "sean@example.com", "target": "john@example.com"}),
    )
    .await;
    assert_eq!(
        block_again.errors.as_deref(),
        Some("john@example.com has blocked sean@example.com")
    );
}

#[tokio::test]
async fn common_friends_over_sqlite() {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    SqliteEdgeStore::init_schema(&pool).await.unwrap();
    let handler = Handler::new(GraphEngine::new(Arc::new(SqliteEdgeStore::new(pool))));

    for pair in [
        ["andy@example.com", "john@example.com"],
        ["andy@example.com", "lisa@example.com"],
        ["john@example.com", "lisa@example.com"],
        ["sean@example.com", "lisa@example.com"],
    ] {
        let created = send(&handler, "create_friendship", json!({"friends": pair})).await;
        assert!(created.success, "{:?}", created.errors);
    }

    let common = send(
        &handler,
        "common_friends",
        json!({"friends": ["john@example.com", "andy@example.com"]}),
    )
    .await;
    assert!(common.success);
    assert_eq!(common.friends, vec!["lisa@example.com"]);
    assert_eq!(common.count, 1);

    let unconnected = send(
        &handler,
        "common_friends",
        json!({"friends": ["sean@example.com", "andy@example.com"]}),
    )
    .await;
    assert!(!unconnected.success);
    assert_eq!(
        unconnected.errors.as_deref(),
        Some("users doesn't have any common friends")
    );

    let lonely = send(&handler, "list_friends", json!({"email": "nobody@example.com"})).await;
    assert!(!lonely.success);
    assert!(lonely.friends.is_empty());
    assert_eq!(lonely.errors.as_deref(), Some("user doesn't have any friends"));
}
