use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use bulletin_server::config::Config;
use bulletin_server::handlers::auth;
use bulletin_server::routes::create_routes;
use bulletin_server::session::SessionStore;
use bulletin_server::state::AppState;
use bulletin_server::{db, upload};

#[tokio::main]
async fn main() {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("bulletin_server=debug,tower_http=info")),
        )
        .init();

    let config = Config::from_env();

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(5))
        .connect_with(config.connect_options())
        .await
        .expect("Failed to connect to database");

    tracing::info!("Successfully connected to database");

    sqlx::migrate!()
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    tracing::info!("Migrations run successfully");

    upload::ensure_uploads_dir(&config.uploads_dir())
        .await
        .expect("Failed to create uploads directory");

    seed_admin(&pool, &config).await;

    let state = AppState {
        pool,
        sessions: SessionStore::new(),
        key: config.session_key(),
        public_dir: Arc::new(config.public_dir.clone()),
        uploads_dir: Arc::new(config.uploads_dir()),
    };

    let app: Router = create_routes(state);

    tracing::info!("Server running at http://{}", config.bind_addr);

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .expect("Failed to bind address");

    axum::serve(listener, app).await.expect("Server failed");
}

/// Seed the configured admin account on first run. Skipped when the
/// variables are unset; a no-op when the account already exists.
async fn seed_admin(pool: &PgPool, config: &Config) {
    let (Some(email), Some(password)) = (&config.admin_email, &config.admin_password) else {
        return;
    };

    let email = email.trim().to_lowercase();
    let password_hash = auth::hash_password(password).expect("Failed to hash admin password");
    db::ensure_admin(pool, &email, &password_hash)
        .await
        .expect("Failed to seed admin account");

    tracing::info!(%email, "Admin account ensured");
}
