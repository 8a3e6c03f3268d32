//! API route definitions

use super::{handlers::*, ApiState};
use axum::{
    routing::{get, post},
    Router,
};

/// Inbound messaging surface events
pub fn create_event_routes() -> Router<ApiState> {
    Router::new().route("/events", post(post_event))
}

/// Account and ledger routes
pub fn create_account_routes() -> Router<ApiState> {
    Router::new()
        .route("/users/:user_id", get(get_account))
        .route("/users/:user_id/balance", get(get_balance))
        .route("/users/:user_id/payments", get(list_payments))
        .route("/users/:user_id/auto-buy/toggle", post(toggle_auto_buy))
        .route("/users/:user_id/deposit", get(get_deposit_state))
}
