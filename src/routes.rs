// ============================================================================
// Router - AlphaCards Betting Engine
// ============================================================================

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::app_state::SharedState;
use crate::handlers::*;

/// Build the full API router. Kept separate from `main` so tests can drive
/// the service in-process.
pub fn build_router(state: SharedState) -> Router {
    Router::new()
        // ===== CARD ENDPOINTS =====
        .route("/cards", get(list_cards).post(create_card))
        .route("/cards/:id", get(get_card))
        // ===== STAKE ENDPOINTS =====
        .route("/cards/:id/stake", post(stake_on_card))
        .route("/cards/:id/stake/:account", get(get_user_stake))
        // ===== RESOLUTION ENDPOINTS =====
        .route("/cards/:id/propose", post(propose_outcome))
        .route("/cards/:id/dispute", post(dispute_proposal))
        .route("/cards/:id/vote", post(cast_vote))
        .route("/cards/:id/finalize", post(finalize_card))
        .route("/cards/:id/proposal", get(get_proposal))
        // ===== PAYOUT ENDPOINTS =====
        .route("/cards/:id/redeem", post(redeem_winnings))
        // ===== LEDGER ENDPOINTS =====
        .route("/balance/:account", get(get_balance))
        .route("/transfer", post(transfer))
        // ===== META =====
        .route("/config", get(get_config))
        .route("/", get(health_check))
        .route("/health", get(health_check))
        // CORS: the dashboard is served from a different origin
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
