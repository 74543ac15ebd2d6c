use std::sync::Arc;

use axum::{
    debug_handler,
    extract::{State, WebSocketUpgrade},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures_util::{SinkExt, StreamExt};
use tower_sessions::Session;
use tracing::error;

use crate::{session::USERNAME, AppResult};

use super::hub::{Hub, Inbound};

/// The live connection. Sender identity comes from the session, never
/// from the payload, so an upgrade without a session gets refused.
#[debug_handler(state = crate::AppState)]
pub(crate) async fn chat_ws(
    State(hub): State<Arc<Hub>>,
    session: Session,

    ws: WebSocketUpgrade,
) -> AppResult<Response> {
    let Some(username) = session.get::<String>(USERNAME).await? else {
        return Ok(StatusCode::FORBIDDEN.into_response());
    };

    Ok(ws.on_upgrade(async move |stream| {
        let (conn_id, mut events) = hub.registry().register(&username);
        let (mut sender, mut receiver) = stream.split();

        let pump = tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                if sender.send(event.into()).await.is_err() {
                    break;
                }
            }
        });

        while let Some(Ok(frame)) = receiver.next().await {
            let Ok(inbound) = serde_json::from_slice::<Inbound>(&frame.into_data()) else {
                continue;
            };

            if let Err(err) = hub.handle_send(&username, inbound).await {
                error!(user = %username, "send failed: {err}");
            }
        }

        // Runs on any disconnect, graceful or not, so the registry
        // never keeps a dead connection around.
        hub.registry().deregister(conn_id);
        pump.abort();
    }))
}
