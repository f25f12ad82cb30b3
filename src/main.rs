use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use customer_voucher_service::{
    adapters::database::{memory::MemoryDatabase, sqlite::SqliteDatabase},
    commands::DomainLogic,
    config::{Config, StoreKind},
    http, telemetry,
};
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    telemetry::init();

    let config = Config::from_env()?;
    info!(store = %config.database.store, "starting customer voucher service");

    let app: Router = match config.database.store {
        StoreKind::Sqlite => {
            let database =
                SqliteDatabase::connect(&config.database.url, config.database.max_connections)
                    .await
                    .with_context(|| format!("opening {}", config.database.url))?;
            http::router(DomainLogic::new(Arc::new(database)))
        }
        StoreKind::Memory => http::router(DomainLogic::new(Arc::new(MemoryDatabase::default()))),
    };

    let address = config.server.address();
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("binding {address}"))?;
    info!(%address, "listening");

    axum::serve(listener, app).await?;

    Ok(())
}
