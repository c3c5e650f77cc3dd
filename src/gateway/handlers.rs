//! Gateway HTTP handlers
//!
//! Thin layer over [`TransferCoordinator`](crate::transfer::TransferCoordinator):
//! extract the bearer token, call the coordinator, wrap the result in the
//! `{code, msg, data}` envelope.

use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::info;

use super::state::AppState;
use crate::auth::bearer_token;
use crate::protocol::{
    Ack, ApiResponse, BalanceData, RegisterBankRequest, TransferApiRequest, TransferApiResponse,
};
use crate::transfer::TransferError;

pub type ApiResult<T> = Result<Json<ApiResponse<T>>, TransferError>;

impl IntoResponse for TransferError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = ApiResponse::<()>::error(self.api_code(), self.detail());
        (status, Json(body)).into_response()
    }
}

fn authorization(headers: &HeaderMap) -> Result<&str, TransferError> {
    let value = headers
        .get(AUTHORIZATION)
        .map(|v| v.to_str().map_err(|_| TransferError::InvalidToken))
        .transpose()?;
    bearer_token(value)
}

#[derive(Debug, Serialize)]
pub struct HealthData {
    pub banks: usize,
    pub cached_transactions: usize,
}

/// GET /api/v1/health
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<ApiResponse<HealthData>> {
    Json(ApiResponse::success(HealthData {
        banks: state.coordinator.registry().names().len(),
        cached_transactions: state.coordinator.cache().len(),
    }))
}

/// POST /api/v1/banks/register
///
/// Called once by each bank server at startup. A second registration under
/// the same name is rejected with 409.
pub async fn register_bank(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterBankRequest>,
) -> ApiResult<Ack> {
    state
        .coordinator
        .register_participant(req.name, &req.address)?;
    Ok(Json(ApiResponse::success(Ack {})))
}

/// POST /api/v1/transfer
pub async fn create_transfer(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<TransferApiRequest>,
) -> ApiResult<TransferApiResponse> {
    let token = authorization(&headers)?;
    let receipt = state.coordinator.transfer(token, req).await?;
    Ok(Json(ApiResponse::success(receipt.into())))
}

/// GET /api/v1/balance
pub async fn get_balance(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ApiResult<BalanceData> {
    let token = authorization(&headers)?;
    let (caller, balance) = state.coordinator.balance(token).await?;
    info!(user = %caller.username, bank = %caller.bank, "Balance enquiry");
    Ok(Json(ApiResponse::success(BalanceData {
        account: caller.account,
        balance,
    })))
}
