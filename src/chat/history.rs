use axum::{
    debug_handler,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tower_sessions::Session;

use crate::{session::USERNAME, AppResult};

use super::store::{MessageStore, MessageView};

#[debug_handler]
pub(crate) async fn get_messages(
    Path(peer): Path<String>,
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

    let thread = store.thread_between(&current_user, &peer).await?;
    let messages: Vec<MessageView> = thread.iter().map(|m| m.view()).collect();

    Ok(Json(json!({"status": "success", "messages": messages})).into_response())
}
