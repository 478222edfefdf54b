//! Loan ShArc Gateway
//!
//! REST surface over the credit scorer and the loan ledger:
//! - Scoring: collector payload preview, evaluation, stored scores
//! - Pool: owner funding and withdrawal
//! - Loans: issuance, repayment, cancellation, borrower lookups
//! - Journal: paginated ledger events

mod api;
mod config;
mod error;

use anyhow::Result;
use sharc_common::VERSION;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::GatewayConfig;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first: it decides the log format
    let config = GatewayConfig::load()?;
    init_tracing(config.json_logs);

    info!("Starting Loan ShArc Gateway v{}", VERSION);
    info!(
        host = %config.host,
        port = config.port,
        fee_bps = config.ledger.service_fee_rate_bps,
        min_score = config.ledger.min_credit_score,
        "Loaded configuration"
    );
    if config.ledger.has_default_owner() {
        warn!("No ledger owner configured (SHARC_LEDGER__OWNER); using the zero address");
    }

    let state = api::AppState::new(config.ledger.to_ledger_config()?)?;
    let app = api::router(state);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Gateway listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Gateway stopped");
    Ok(())
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received shutdown signal"),
        Err(e) => {
            warn!(error = %e, "Failed to listen for shutdown signal");
            std::future::pending::<()>().await
        }
    }
}
