use axum::{
    debug_handler,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tower_sessions::Session;

use crate::{session::USERNAME, AppResult};

use super::store::MessageStore;

#[derive(Deserialize)]
pub(crate) struct MarkReadBody {
    sender: Option<String>,
}

/// Bulk read transition: everything `sender` sent to the calling user
/// flips to read in one batch.
#[debug_handler]
pub(crate) async fn mark_read(
    State(store): State<MessageStore>,
    session: Session,
    Json(MarkReadBody { sender }): Json<MarkReadBody>,
) -> AppResult<Response> {
    let receiver = session.get::<String>(USERNAME).await?;
    let (Some(sender), Some(receiver)) = (sender, receiver) else {
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(json!({"status": "error", "message": "Missing data"})),
        )
            .into_response());
    };

    let read_count = store.mark_all_read(&sender, &receiver).await?;

    Ok(Json(json!({"status": "success", "read_count": read_count})).into_response())
}
