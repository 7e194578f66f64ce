mod config;
mod db;
mod routes;
mod services;
mod state;

use std::sync::Arc;

use services::google::GoogleProvider;
use services::session::PgSessionStore;
use services::users::PgUserDirectory;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    if let Err(e) = dotenvy::dotenv() {
        tracing::debug!(error = %e, "no .env file loaded");
    }

    let config = config::AppConfig::from_env().expect("invalid configuration");

    let pool = db::init_pool(&config.database_url, config.db_max_connections)
        .await
        .expect("database init failed");

    let provider = GoogleProvider::new(config.google.clone()).expect("http client init failed");
    let port = config.port;
    let state = state::AppState::new(
        config,
        Arc::new(PgUserDirectory::new(pool.clone())),
        Arc::new(PgSessionStore::new(pool)),
        Arc::new(provider),
    );

    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, "campus listening");
    axum::serve(listener, app).await.expect("server failed");
}
