mod analyzers;
mod api;
mod db;
mod errors;
mod models;
mod packer;
mod privacy;
mod prover;
mod state;

use crate::errors::ApiError;
use crate::privacy::budget::BudgetLedger;
use crate::state::AppState;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Default per-user epsilon budget, milli-units (10.0).
const DEFAULT_BUDGET_MILLI: u64 = 10_000;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .init();

    // Store local state under backend/data (ignored by git).
    let data_dir = PathBuf::from("data");
    std::fs::create_dir_all(&data_dir).map_err(|_| ApiError::Internal)?;

    let db_path = data_dir.join("credentials.sqlite");
    let db_url = format!("sqlite:{}", db_path.to_string_lossy());

    let db = db::connect(&db_url).await?;
    db::init_schema(&db).await?;

    // Budgets survive restarts; consumption is never forgotten.
    let persisted = db::load_budgets(&db).await?;
    let ledger = BudgetLedger::restore(DEFAULT_BUDGET_MILLI, persisted);

    let salt = std::env::var("IDENTITY_SALT").unwrap_or_else(|_| "dev-identity-salt".to_string());

    let state = AppState::new(db, data_dir, ledger, salt);

    let app = api::router(state);

    let addr = std::env::var("BACKEND_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|_| ApiError::Internal)?;

    tracing::info!(%addr, "backend listening");

    axum::serve(listener, app).await.map_err(|_| ApiError::Internal)?;

    Ok(())
}
