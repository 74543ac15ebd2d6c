mod login;
mod logout;
mod signup;

use axum::{
    routing::{get, post},
    Router,
};

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup::signup))
        .route("/login", get(login::login_page).post(login::login))
        .route("/logout", get(logout::logout))
}

/// Canonical username form, applied at signup and at every login
/// lookup: first letter upper, rest lower.
pub fn normalize_username(raw: &str) -> String {
    let mut chars = raw.trim().chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
