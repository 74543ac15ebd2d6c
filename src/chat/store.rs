use serde::Serialize;
use sqlx::SqlitePool;
use thiserror::Error;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

use super::clock;

pub const MAX_TEXT_LEN: usize = 500;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid message: {0}")]
    Validation(&'static str),
    #[error(transparent)]
    Persistence(#[from] sqlx::Error),
    #[error("stored timestamp is unreadable: {0}")]
    Timestamp(#[from] time::error::Parse),
}

/// A persisted message. `id` and `timestamp` are assigned once by
/// [`MessageStore::append`] and never change; `is_read` only ever goes
/// false -> true, in bulk, via [`MessageStore::mark_all_read`].
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub id: i64,
    pub sender: String,
    pub receiver: String,
    pub text: String,
    pub timestamp: OffsetDateTime,
    pub is_read: bool,
}

/// The wire/query shape of a message: same fields, timestamp rendered
/// with the fixed display clock.
#[derive(Debug, Clone, Serialize)]
pub struct MessageView {
    pub sender: String,
    pub receiver: String,
    pub text: String,
    pub time: String,
    pub is_read: bool,
}

impl Message {
    pub fn view(&self) -> MessageView {
        MessageView {
            sender: self.sender.clone(),
            receiver: self.receiver.clone(),
            text: self.text.clone(),
            time: clock::display(self.timestamp),
            is_read: self.is_read,
        }
    }
}

type MessageRow = (i64, String, String, String, String, bool);

fn row_to_message(
    (id, sender, receiver, text, timestamp, is_read): MessageRow,
) -> Result<Message, StoreError> {
    Ok(Message {
        id,
        sender,
        receiver,
        text,
        timestamp: OffsetDateTime::parse(&timestamp, &Rfc3339)?,
        is_read,
    })
}

/// Sole owner of the canonical message records. Everything else reads
/// through here or asks it to mutate.
#[derive(Clone)]
pub struct MessageStore {
    db_pool: SqlitePool,
}

impl MessageStore {
    pub fn new(db_pool: SqlitePool) -> Self {
        Self { db_pool }
    }

    /// Durably append one message. The id comes from the store's own
    /// rowid sequence, so concurrent appends never collide.
    pub async fn append(
        &self,
        sender: &str,
        receiver: &str,
        text: &str,
        timestamp: OffsetDateTime,
    ) -> Result<Message, StoreError> {
        if sender.is_empty() {
            return Err(StoreError::Validation("sender is empty"));
        }
        if receiver.is_empty() {
            return Err(StoreError::Validation("receiver is empty"));
        }
        if text.is_empty() {
            return Err(StoreError::Validation("text is empty"));
        }
        if text.chars().count() > MAX_TEXT_LEN {
            return Err(StoreError::Validation("text exceeds 500 characters"));
        }

        let stored = timestamp
            .format(&Rfc3339)
            .map_err(|_| StoreError::Validation("timestamp is not representable"))?;
        let result =
            sqlx::query("INSERT INTO messages (sender,receiver,text,timestamp,is_read) VALUES (?,?,?,?,0)")
                .bind(sender)
                .bind(receiver)
                .bind(text)
                .bind(&stored)
                .execute(&self.db_pool)
                .await?;

        Ok(Message {
            id: result.last_insert_rowid(),
            sender: sender.to_owned(),
            receiver: receiver.to_owned(),
            text: text.to_owned(),
            timestamp,
            is_read: false,
        })
    }

    /// The full conversation between two users, both directions, oldest
    /// first. Ties on timestamp fall back to id order so the sequence is
    /// deterministic.
    pub async fn thread_between(&self, user_a: &str, user_b: &str) -> Result<Vec<Message>, StoreError> {
        let rows = sqlx::query_as::<_, MessageRow>(
            "SELECT id,sender,receiver,text,timestamp,is_read FROM messages \
             WHERE (sender=? AND receiver=?) OR (sender=? AND receiver=?) \
             ORDER BY timestamp ASC, id ASC",
        )
        .bind(user_a)
        .bind(user_b)
        .bind(user_b)
        .bind(user_a)
        .fetch_all(&self.db_pool)
        .await?;

        rows.into_iter().map(row_to_message).collect()
    }

    pub async fn count_unread(&self, from: &str, to: &str) -> Result<i64, StoreError> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM messages WHERE sender=? AND receiver=? AND is_read=0",
        )
        .bind(from)
        .bind(to)
        .fetch_one(&self.db_pool)
        .await?;

        Ok(count)
    }

    /// Flip every unread message from `from` to `to` to read, as one
    /// statement. Returns how many flipped; calling again with nothing
    /// new in between returns 0.
    pub async fn mark_all_read(&self, from: &str, to: &str) -> Result<u64, StoreError> {
        let result = sqlx::query(
            "UPDATE messages SET is_read=1 WHERE sender=? AND receiver=? AND is_read=0",
        )
        .bind(from)
        .bind(to)
        .execute(&self.db_pool)
        .await?;

        Ok(result.rows_affected())
    }
}
