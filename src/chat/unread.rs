use serde::Serialize;

use super::store::{MessageStore, StoreError};

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct PeerUnread {
    pub username: String,
    pub unread: i64,
}

/// Stateless derivation over the store: for each candidate peer, how
/// many of their messages the viewer has not read yet. No caching; every
/// call reflects the latest committed writes.
pub async fn unread_counts(
    store: &MessageStore,
    viewer: &str,
    peers: Vec<String>,
) -> Result<Vec<PeerUnread>, StoreError> {
    let mut counts = Vec::with_capacity(peers.len());
    for username in peers {
        let unread = store.count_unread(&username, viewer).await?;
        counts.push(PeerUnread { username, unread });
    }
    Ok(counts)
}

#[cfg(test)]
mod tests {
    use sqlx::sqlite::SqlitePoolOptions;

    use super::*;
    use crate::chat::clock;

    #[tokio::test]
    async fn counts_follow_the_store_per_peer() {
        let db_pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(":memory:")
            .await
            .unwrap();
        crate::db::init(&db_pool).await.unwrap();
        let store = MessageStore::new(db_pool);

        for _ in 0..2 {
            store.append("Alice", "Bob", "hey", clock::now()).await.unwrap();
        }
        store.append("Carol", "Bob", "hello", clock::now()).await.unwrap();
        // Bob's own sends never count against him.
        store.append("Bob", "Alice", "hi", clock::now()).await.unwrap();

        let peers = vec!["Alice".to_owned(), "Carol".to_owned(), "Dave".to_owned()];
        let counts = unread_counts(&store, "Bob", peers).await.unwrap();
        assert_eq!(
            counts,
            vec![
                PeerUnread { username: "Alice".to_owned(), unread: 2 },
                PeerUnread { username: "Carol".to_owned(), unread: 1 },
                PeerUnread { username: "Dave".to_owned(), unread: 0 },
            ]
        );

        store.mark_all_read("Alice", "Bob").await.unwrap();
        let counts = unread_counts(&store, "Bob", vec!["Alice".to_owned()]).await.unwrap();
        assert_eq!(counts[0].unread, 0);
    }
}
