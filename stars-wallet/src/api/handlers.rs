//! API request handlers

use super::{responses::*, ApiState};
use crate::core::{UserId, WalletError};
use crate::domain::deposit::DepositState;
use crate::domain::events::InboundEvent;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;

/// Query parameters for pagination
#[derive(Deserialize)]
pub struct PaginationQuery {
    pub limit: Option<usize>,
}

fn status_for(err: &WalletError) -> StatusCode {
    match err {
        WalletError::AccountNotFound { .. } => StatusCode::NOT_FOUND,
        WalletError::InvalidCredit(_) => StatusCode::BAD_REQUEST,
        _ => {
            tracing::error!("Request failed: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Deliver one event from the messaging surface
pub async fn post_event(
    State(state): State<ApiState>,
    Json(event): Json<InboundEvent>,
) -> Json<EventResponse> {
    let effects = state.wallet.handle(event).await;
    Json(EventResponse { effects })
}

/// Get an account
pub async fn get_account(
    State(state): State<ApiState>,
    Path(user_id): Path<UserId>,
) -> Result<Json<AccountResponse>, StatusCode> {
    let account = state
        .wallet
        .accounts()
        .get_account(user_id)
        .await
        .map_err(|e| status_for(&e))?;

    match account {
        Some(account) => Ok(Json(AccountResponse { account })),
        None => Err(StatusCode::NOT_FOUND),
    }
}

/// Get an account balance
pub async fn get_balance(
    State(state): State<ApiState>,
    Path(user_id): Path<UserId>,
) -> Result<Json<BalanceResponse>, StatusCode> {
    let balance = state
        .wallet
        .accounts()
        .get_balance(user_id)
        .await
        .map_err(|e| status_for(&e))?;

    Ok(Json(BalanceResponse { user_id, balance }))
}

/// Flip the auto-buy flag
pub async fn toggle_auto_buy(
    State(state): State<ApiState>,
    Path(user_id): Path<UserId>,
) -> Result<Json<AutoBuyResponse>, StatusCode> {
    let auto_buy_enabled = state
        .wallet
        .accounts()
        .toggle_auto_buy(user_id)
        .await
        .map_err(|e| status_for(&e))?;

    Ok(Json(AutoBuyResponse {
        user_id,
        auto_buy_enabled,
    }))
}

/// Payment history, newest first
pub async fn list_payments(
    State(state): State<ApiState>,
    Path(user_id): Path<UserId>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<Json<PaymentsResponse>, StatusCode> {
    let limit = pagination.limit.unwrap_or(20).clamp(1, 100);

    let payments = state
        .wallet
        .payments(user_id, limit)
        .await
        .map_err(|e| status_for(&e))?;

    Ok(Json(PaymentsResponse { payments, limit }))
}

/// Current deposit conversation state
pub async fn get_deposit_state(
    State(state): State<ApiState>,
    Path(user_id): Path<UserId>,
) -> Result<Json<DepositStateResponse>, StatusCode> {
    let pending = state
        .wallet
        .deposits()
        .pending(user_id)
        .await
        .map_err(|e| status_for(&e))?;

    Ok(Json(DepositStateResponse {
        state: DepositState::from(pending.as_ref()),
        pending,
    }))
}
