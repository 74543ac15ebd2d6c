use axum::{
    debug_handler,
    extract::State,
    response::{IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::info;

use crate::AppResult;

use super::normalize_username;

#[derive(Deserialize)]
pub(crate) struct SignupForm {
    username: String,
    password: String,
}

#[debug_handler]
pub(crate) async fn signup(
    State(db_pool): State<SqlitePool>,
    Form(SignupForm { username, password }): Form<SignupForm>,
) -> AppResult<Response> {
    let username = normalize_username(&username);
    if username.is_empty() {
        return Ok("Invalid username".into_response());
    }

    let taken = sqlx::query_as::<_, (i64,)>("SELECT 1 FROM users WHERE username=?")
        .bind(&username)
        .fetch_optional(&db_pool)
        .await?;
    if taken.is_some() {
        return Ok("User already exists".into_response());
    }

    let password = bcrypt::hash(&password, bcrypt::DEFAULT_COST)?;
    sqlx::query("INSERT INTO users (username,password) VALUES (?,?)")
        .bind(&username)
        .bind(&password)
        .execute(&db_pool)
        .await?;

    info!(user = %username, "signed up");
    Ok(Redirect::to("/").into_response())
}
