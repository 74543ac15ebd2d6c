use axum::{
    debug_handler,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{session::USERNAME, AppResult};

use super::{store::MessageStore, unread};

/// Every other user, with how many of their messages the caller has not
/// read yet. Backs the conversation list.
#[debug_handler(state = crate::AppState)]
pub(crate) async fn peers(
    State(db_pool): State<SqlitePool>,
    State(store): State<MessageStore>,
    session: Session,
) -> AppResult<Response> {
    let Some(current_user) = session.get::<String>(USERNAME).await? else {
        return Ok((
            StatusCode::FORBIDDEN,
            Json(json!({"status": "error", "message": "Unauthorized"})),
        )
            .into_response());
    };

    let usernames: Vec<(String,)> =
        sqlx::query_as("SELECT username FROM users WHERE username != ? ORDER BY username")
            .bind(&current_user)
            .fetch_all(&db_pool)
            .await?;

    let peers = unread::unread_counts(
        &store,
        &current_user,
        usernames.into_iter().map(|(name,)| name).collect(),
    )
    .await?;

    Ok(Json(json!({"status": "success", "peers": peers})).into_response())
}
