use std::net::SocketAddr;

use timetable_backend::api::{router, with_layers};
use timetable_backend::config::Config;
use timetable_backend::db;
use timetable_backend::state::AppState;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "timetable_backend=debug,tower_http=info".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let pool = db::connect(&config.database_url, config.max_connections).await?;

    let state = AppState::sqlite(pool);
    let app = with_layers(router(state), config.cors_allow_origin.as_deref())?;

    let addr = SocketAddr::new(config.host, config.port);
    info!("listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
