//! Incentive endpoints
//!
//! - GET  /api/incentive
//! - POST /api/questions/{id}/unlock

use hyper::{Response, StatusCode};
use serde::Serialize;

use super::response::{json_response, BoxBody};
use crate::auth::Identity;
use crate::server::AppState;
use crate::types::Result;

#[derive(Serialize)]
struct Balance {
    amount: i64,
}

pub async fn balance(state: &AppState, identity: &Identity) -> Result<Response<BoxBody>> {
    let amount = state.ledger.get(identity).await?;
    Ok(json_response(StatusCode::OK, &Balance { amount }))
}

pub async fn unlock(
    state: &AppState,
    identity: &Identity,
    question_id: &str,
) -> Result<Response<BoxBody>> {
    let outcome = state.unlocks.unlock_with_incentive(identity, question_id).await?;
    Ok(json_response(StatusCode::OK, &outcome))
}
