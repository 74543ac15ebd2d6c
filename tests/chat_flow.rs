//! The whole messaging core exercised together: connect, send, live
//! delivery, unread counts, bulk mark-read.

use std::sync::Arc;

use sqlx::sqlite::SqlitePoolOptions;
use sweetnothings::auth::normalize_username;
use sweetnothings::chat::hub::{DeliveryPolicy, Hub, Inbound};
use sweetnothings::chat::store::MessageStore;
use sweetnothings::chat::unread;
use sweetnothings::db;

async fn setup() -> (MessageStore, Arc<Hub>) {
    let db_pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(":memory:")
        .await
        .unwrap();
    db::init(&db_pool).await.unwrap();
    let store = MessageStore::new(db_pool);
    let hub = Arc::new(Hub::new(store.clone(), DeliveryPolicy::Broadcast));
    (store, hub)
}

#[tokio::test]
async fn direct_message_round_trip() {
    let (store, hub) = setup().await;

    let alice = normalize_username("alice");
    let bob = normalize_username("bob");

    let (_alice_conn, mut alice_rx) = hub.registry().register(&alice);
    let (_bob_conn, mut bob_rx) = hub.registry().register(&bob);

    let sent = hub
        .handle_send(
            &alice,
            Inbound {
                receiver: Some(bob.clone()),
                text: Some("hi".to_owned()),
            },
        )
        .await
        .unwrap()
        .expect("complete event is persisted");
    assert_eq!(sent.sender, "Alice");
    assert_eq!(sent.receiver, "Bob");
    assert!(!sent.is_read);

    // Both live connections get the same formatted event.
    for rx in [&mut alice_rx, &mut bob_rx] {
        let event: serde_json::Value = serde_json::from_str(&rx.recv().await.unwrap()).unwrap();
        assert_eq!(event["sender"], "Alice");
        assert_eq!(event["receiver"], "Bob");
        assert_eq!(event["text"], "hi");
        assert_eq!(event["is_read"], false);
        assert!(event["time"].is_string());
    }

    // Bob's conversation list shows one unread from Alice.
    let counts = unread::unread_counts(&store, &bob, vec![alice.clone()])
        .await
        .unwrap();
    assert_eq!(counts[0].unread, 1);

    // Bob opens the thread: one-way bulk transition, idempotent.
    assert_eq!(store.mark_all_read(&alice, &bob).await.unwrap(), 1);
    assert_eq!(store.count_unread(&alice, &bob).await.unwrap(), 0);
    assert_eq!(store.mark_all_read(&alice, &bob).await.unwrap(), 0);

    // History still holds the message exactly once, now read.
    let thread = store.thread_between(&alice, &bob).await.unwrap();
    assert_eq!(thread.len(), 1);
    assert!(thread[0].is_read);
}

#[tokio::test]
async fn disconnect_then_send_still_delivers_to_the_rest() {
    let (_store, hub) = setup().await;

    let (alice_conn, alice_rx) = hub.registry().register("Alice");
    let (_bob_conn, mut bob_rx) = hub.registry().register("Bob");

    drop(alice_rx);
    hub.registry().deregister(alice_conn);
    assert_eq!(hub.registry().connection_count(), 1);

    let sent = hub
        .handle_send(
            "Alice",
            Inbound {
                receiver: Some("Bob".to_owned()),
                text: Some("still here?".to_owned()),
            },
        )
        .await
        .unwrap();
    assert!(sent.is_some());

    let event: serde_json::Value =
        serde_json::from_str(&bob_rx.recv().await.unwrap()).unwrap();
    assert_eq!(event["text"], "still here?");
}
