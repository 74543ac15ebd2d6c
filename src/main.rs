use std::sync::Arc;

use axum::{
    debug_handler,
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Router,
};
use sqlx::sqlite::SqlitePoolOptions;
use sweetnothings::{
    auth,
    chat::{
        self,
        hub::{DeliveryPolicy, Hub},
        store::MessageStore,
    },
    db,
    session::USERNAME,
    AppResult, AppState,
};
use tower_http::cors::CorsLayer;
use tower_sessions::{cookie::SameSite, Expiry, MemoryStore, Session, SessionManagerLayer};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(false)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(30)));

    let db_pool = SqlitePoolOptions::new()
        .max_connections(16)
        .connect(
            dotenv::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://sweetnothings.db?mode=rwc".to_owned())
                .as_str(),
        )
        .await
        .unwrap();
    db::init(&db_pool).await.unwrap();

    let policy: DeliveryPolicy = match dotenv::var("DELIVERY_MODE") {
        Ok(mode) => mode.parse().unwrap(),
        Err(_) => DeliveryPolicy::default(),
    };

    let store = MessageStore::new(db_pool.clone());
    let hub = Arc::new(Hub::new(store.clone(), policy));
    let app_state = AppState { db_pool, store, hub };

    let app = Router::new()
        .route("/", get(index))

        .merge(auth::router())
        .merge(chat::router())

        .with_state(app_state)
        .layer(session_layer)
        .layer(CorsLayer::permissive());

    let port = dotenv::var("PORT").unwrap_or_else(|_| "8080".to_owned());
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await.unwrap();
    tracing::info!("listening on 0.0.0.0:{port}");
    axum::serve(listener, app).await.unwrap();
}

#[debug_handler]
async fn index(session: Session) -> AppResult<Response> {
    if let Some(username) = session.get::<String>(USERNAME).await? {
        Ok(format!("signed in as {username}").into_response())
    } else {
        Ok(Redirect::to("/login").into_response())
    }
}
