use std::sync::Arc;

use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use events_server::config::{Config, Storage};
use events_server::repositories::{
    AccountRepository, EventRepository, InMemoryAccountRepository, InMemoryEventRepository,
    PgAccountRepository, PgEventRepository,
};
use events_server::routes::create_routes;
use events_server::state::AppState;

#[tokio::main]
async fn main() {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env().expect("Invalid configuration");

    let (event_repository, account_repository): (Arc<dyn EventRepository>, Arc<dyn AccountRepository>) =
        match &config.storage {
            Storage::Postgres { database_url } => {
                let pool = PgPoolOptions::new()
                    .max_connections(5)
                    .connect(database_url)
                    .await
                    .expect("Failed to connect to database");

                tracing::info!("Successfully connected to database");

                sqlx::migrate!()
                    .run(&pool)
                    .await
                    .expect("Failed to run migrations");

                tracing::info!("Migrations run successfully");

                (
                    Arc::new(PgEventRepository::new(pool.clone())),
                    Arc::new(PgAccountRepository::new(pool)),
                )
            }
            Storage::Memory => {
                tracing::warn!("Using in-memory storage; data is lost on shutdown");
                (
                    Arc::new(InMemoryEventRepository::new()),
                    Arc::new(InMemoryAccountRepository::new()),
                )
            }
        };

    let state = AppState::new(&config, event_repository, account_repository)
        .expect("Failed to build application state");
    state
        .seed_accounts(&config.app)
        .await
        .expect("Failed to seed default accounts");

    let app = create_routes(state, &config);

    tracing::info!("🚀 Server running at http://{}", config.server_addr);

    let listener = TcpListener::bind(config.server_addr)
        .await
        .expect("Failed to bind address");

    axum::serve(listener, app).await.expect("Server failed");
}
