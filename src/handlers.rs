// ============================================================================
// HTTP Handlers - AlphaCards Betting Engine
// ============================================================================
//
// Thin request/response layer over the engine. Each mutating handler takes
// the card's lock, runs the engine transaction, and only then moves money in
// the ledger: debits after every validation has passed, credits as the very
// last step. Errors map onto HTTP statuses by taxonomy: validation and
// economic failures are 400, wrong-phase failures are 409, lookups are 404.
//
// ============================================================================

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde_json::{json, Value};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::warn;

use crate::app_state::SharedState;
use crate::error::CardError;
use crate::ledger::TxType;
use crate::models::*;
use crate::resolution::coordinator::Settlement;

type ApiError = (StatusCode, Json<Value>);
type ApiResult = Result<Json<Value>, ApiError>;

fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_secs())
        .unwrap_or(0)
}

fn reject(err: CardError) -> ApiError {
    let status = match &err {
        CardError::CardNotFound(_) | CardError::AccountNotFound(_) => StatusCode::NOT_FOUND,
        CardError::CardClosed
        | CardError::AlreadyResolved
        | CardError::NotResolved
        | CardError::AlreadyProposed
        | CardError::NoProposal
        | CardError::DeadlineNotReached { .. }
        | CardError::AlreadyDisputed
        | CardError::SelfDispute
        | CardError::DisputeWindowClosed
        | CardError::DisputeWindowOpen
        | CardError::VotingClosed
        | CardError::VotingNotEnded
        | CardError::AlreadyVoted(_)
        | CardError::NoStake(_) => StatusCode::CONFLICT,
        _ => StatusCode::BAD_REQUEST,
    };
    warn!(code = err.code(), "request rejected: {}", err);
    (
        status,
        Json(json!({ "success": false, "error": err.to_string(), "code": err.code() })),
    )
}

// ===== CARD ENDPOINTS =====

pub async fn create_card(
    State(state): State<SharedState>,
    Json(request): Json<CreateCardRequest>,
) -> ApiResult {
    let card_id = state
        .store
        .create_card(
            request.netuid,
            request.kind,
            request.deadline,
            &request.creator,
            now(),
            state.config,
        )
        .map_err(reject)?;

    Ok(Json(json!({ "success": true, "card_id": card_id })))
}

pub async fn list_cards(State(state): State<SharedState>) -> Json<Value> {
    let cards = state.store.snapshots();
    Json(json!({
        "count": cards.len(),
        "cards": cards,
    }))
}

pub async fn get_card(State(state): State<SharedState>, Path(id): Path<u64>) -> ApiResult {
    let entry = state.store.entry(id).map_err(reject)?;
    let card = entry.lock().unwrap();
    let phase = card.phase(now());
    Ok(Json(json!({ "card": card.snapshot(), "phase": phase })))
}

// ===== STAKE ENDPOINTS =====

pub async fn stake_on_card(
    State(state): State<SharedState>,
    Path(id): Path<u64>,
    Json(request): Json<StakeRequest>,
) -> ApiResult {
    let entry = state.store.entry(id).map_err(reject)?;
    let mut card = entry.lock().unwrap();
    let mut ledger = state.ledger.lock().unwrap();

    // Funds check up front so a broke staker never mutates the card
    let available = ledger.balance_of(&request.account);
    if available < request.amount {
        return Err(reject(CardError::InsufficientBalance {
            available,
            required: request.amount,
        }));
    }

    let receipt = card
        .stake(request.outcome, request.amount, &request.account, now())
        .map_err(reject)?;
    ledger
        .debit(&request.account, request.amount, TxType::Stake)
        .map_err(reject)?;

    let new_balance = ledger.balance_of(&request.account);
    Ok(Json(json!({ "success": true, "receipt": receipt, "new_balance": new_balance })))
}

pub async fn get_user_stake(
    State(state): State<SharedState>,
    Path((id, account)): Path<(u64, String)>,
) -> ApiResult {
    let entry = state.store.entry(id).map_err(reject)?;
    let card = entry.lock().unwrap();
    let per_outcome = card.user_stake(&account);
    let total: f64 = per_outcome.iter().sum();
    Ok(Json(json!({
        "card_id": id,
        "account": account,
        "stakes": per_outcome,
        "total": total,
    })))
}

// ===== RESOLUTION ENDPOINTS =====

pub async fn propose_outcome(
    State(state): State<SharedState>,
    Path(id): Path<u64>,
    Json(request): Json<ProposeRequest>,
) -> ApiResult {
    let entry = state.store.entry(id).map_err(reject)?;
    let mut card = entry.lock().unwrap();
    let mut ledger = state.ledger.lock().unwrap();

    let available = ledger.balance_of(&request.account);
    if available < request.bond {
        return Err(reject(CardError::InsufficientBalance { available, required: request.bond }));
    }

    card.propose(request.outcome, request.bond, &request.account, now())
        .map_err(reject)?;
    ledger
        .debit(&request.account, request.bond, TxType::Bond)
        .map_err(reject)?;

    let phase = card.phase(now());
    Ok(Json(json!({ "success": true, "phase": phase })))
}

pub async fn dispute_proposal(
    State(state): State<SharedState>,
    Path(id): Path<u64>,
    Json(request): Json<DisputeRequest>,
) -> ApiResult {
    let entry = state.store.entry(id).map_err(reject)?;
    let mut card = entry.lock().unwrap();
    let mut ledger = state.ledger.lock().unwrap();

    let available = ledger.balance_of(&request.account);
    if available < request.bond {
        return Err(reject(CardError::InsufficientBalance { available, required: request.bond }));
    }

    card.dispute(request.bond, &request.account, now()).map_err(reject)?;
    ledger
        .debit(&request.account, request.bond, TxType::Bond)
        .map_err(reject)?;

    let phase = card.phase(now());
    Ok(Json(json!({ "success": true, "phase": phase })))
}

pub async fn cast_vote(
    State(state): State<SharedState>,
    Path(id): Path<u64>,
    Json(request): Json<VoteRequest>,
) -> ApiResult {
    let entry = state.store.entry(id).map_err(reject)?;
    let mut card = entry.lock().unwrap();
    let record = card
        .vote(&request.account, request.supports, now())
        .map_err(reject)?;
    Ok(Json(json!({ "success": true, "vote": record })))
}

pub async fn finalize_card(State(state): State<SharedState>, Path(id): Path<u64>) -> ApiResult {
    let entry = state.store.entry(id).map_err(reject)?;
    let mut card = entry.lock().unwrap();
    let settlement = card.finalize(now()).map_err(reject)?;

    // Bond money moves only after the outcome is durably written
    let mut ledger = state.ledger.lock().unwrap();
    match &settlement {
        Settlement::Uncontested { proposer, refund, .. } => {
            ledger.credit(proposer, *refund, TxType::BondSettlement);
        }
        Settlement::ProposerWins { proposer, award, .. } => {
            ledger.credit(proposer, *award, TxType::BondSettlement);
        }
        Settlement::ChallengerWins { challenger, award } => {
            ledger.credit(challenger, *award, TxType::BondSettlement);
        }
    }

    Ok(Json(json!({
        "success": true,
        "resolved": card.card.resolved,
        "outcome": card.card.outcome,
        "settlement": settlement,
    })))
}

pub async fn get_proposal(State(state): State<SharedState>, Path(id): Path<u64>) -> ApiResult {
    let entry = state.store.entry(id).map_err(reject)?;
    let card = entry.lock().unwrap();
    let phase = card.phase(now());
    match &card.proposal {
        Some(proposal) => Ok(Json(json!({
            "proposal": ProposalView::from_proposal(proposal, phase),
            "phase": phase,
        }))),
        None => Ok(Json(json!({ "proposal": null, "phase": phase }))),
    }
}

// ===== PAYOUT ENDPOINTS =====

pub async fn redeem_winnings(
    State(state): State<SharedState>,
    Path(id): Path<u64>,
    Json(request): Json<RedeemRequest>,
) -> ApiResult {
    let entry = state.store.entry(id).map_err(reject)?;
    let mut card = entry.lock().unwrap();
    let receipt = card.redeem(&request.account).map_err(reject)?;

    // Credit last: bookkeeping above is already committed
    let mut ledger = state.ledger.lock().unwrap();
    ledger.credit(&request.account, receipt.payout, TxType::Payout);
    let new_balance = ledger.balance_of(&request.account);

    Ok(Json(json!({ "success": true, "receipt": receipt, "new_balance": new_balance })))
}

// ===== LEDGER ENDPOINTS =====

pub async fn get_balance(
    State(state): State<SharedState>,
    Path(account): Path<String>,
) -> Json<Value> {
    let mut ledger = state.ledger.lock().unwrap();
    let balance = ledger.balance_of(&account);
    Json(json!({ "account": account, "balance": balance }))
}

pub async fn transfer(
    State(state): State<SharedState>,
    Json(request): Json<TransferRequest>,
) -> ApiResult {
    let mut ledger = state.ledger.lock().unwrap();
    let tx_id = ledger
        .transfer(&request.from, &request.to, request.amount)
        .map_err(reject)?;
    Ok(Json(json!({ "success": true, "transaction_id": tx_id })))
}

// ===== META ENDPOINTS =====

pub async fn get_config(State(state): State<SharedState>) -> Json<Value> {
    Json(json!({
        "config": state.config,
        "card_count": state.store.card_count(),
        "accumulated_fees": state.store.total_fees(),
    }))
}

pub async fn health_check() -> &'static str {
    "AlphaCards Betting Engine - Online"
}
