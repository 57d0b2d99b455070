// ============================================================================
// AlphaCards Betting Engine - Service Entry Point
// ============================================================================

use std::net::SocketAddr;

use tracing::info;

use alphacards_engine::{build_router, AppState, EngineConfig};

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "alphacards_engine=info,tower_http=info".into()),
        )
        .init();

    let config = EngineConfig::from_env();
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(1234);

    info!(
        platform_fee_rate = config.platform_fee_rate,
        resolution_bond = config.resolution_bond,
        dispute_period_secs = config.dispute_period_secs,
        voting_period_secs = config.voting_period_secs,
        "engine configured"
    );

    let state = AppState::shared(config);
    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    println!("🎴 AlphaCards Betting Engine");
    println!("   Listening on http://{}", addr);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            eprintln!("failed to bind {}: {}", addr, err);
            std::process::exit(1);
        }
    };

    if let Err(err) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        eprintln!("server error: {}", err);
        std::process::exit(1);
    }
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown signal received");
    }
}
