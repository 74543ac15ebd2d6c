pub mod clock;
pub mod hub;
pub mod store;
pub mod unread;

mod history;
mod mark_read;
mod peers;
mod ws;

use axum::{
    routing::{get, post},
    Router,
};

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/ws", get(ws::chat_ws))
        .route("/messages/{peer}", get(history::get_messages))
        .route("/mark_read", post(mark_read::mark_read))
        .route("/peers", get(peers::peers))
}
