use axum::{
    debug_handler,
    extract::State,
    response::{IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;
use sqlx::SqlitePool;
use tower_sessions::Session;
use tracing::info;

use crate::{session::USERNAME, AppResult};

use super::normalize_username;

#[derive(Deserialize)]
pub(crate) struct LoginForm {
    username: String,
    password: String,
}

#[debug_handler]
pub(crate) async fn login_page() -> impl IntoResponse {
    "POST username and password to /login"
}

#[debug_handler]
pub(crate) async fn login(
    State(db_pool): State<SqlitePool>,
    session: Session,

    Form(LoginForm { username, password }): Form<LoginForm>,
) -> AppResult<Response> {
    let username = normalize_username(&username);

    let row: Option<(String,)> = sqlx::query_as("SELECT password FROM users WHERE username=?")
        .bind(&username)
        .fetch_optional(&db_pool)
        .await?;

    let Some((hash,)) = row else {
        return Ok("Invalid credentials".into_response());
    };
    if !bcrypt::verify(&password, &hash)? {
        return Ok("Invalid credentials".into_response());
    }

    session.insert(USERNAME, &username).await?;
    info!(user = %username, "logged in");

    Ok(Redirect::to("/").into_response())
}
