//! Bank server HTTP handlers.
//!
//! Internal surface, called only by the gateway.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::error::BankError;
use super::service::BankService;
use crate::core_types::AccountId;
use crate::protocol::{Ack, ApiResponse, BalanceData, LegRequest, ReleaseRequest};

pub type BankResult<T> = Result<Json<ApiResponse<T>>, BankError>;

impl IntoResponse for BankError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = ApiResponse::<()>::error(self.api_code(), self.detail());
        (status, Json(body)).into_response()
    }
}

/// POST /internal/v1/prepare
pub async fn prepare(
    State(bank): State<Arc<BankService>>,
    Json(req): Json<LegRequest>,
) -> BankResult<Ack> {
    bank.prepare(&req).await?;
    Ok(Json(ApiResponse::success(Ack {})))
}

/// POST /internal/v1/commit
pub async fn commit(
    State(bank): State<Arc<BankService>>,
    Json(req): Json<LegRequest>,
) -> BankResult<Ack> {
    bank.commit(&req)?;
    Ok(Json(ApiResponse::success(Ack {})))
}

/// POST /internal/v1/release
pub async fn release(
    State(bank): State<Arc<BankService>>,
    Json(req): Json<ReleaseRequest>,
) -> BankResult<Ack> {
    bank.release(&req)?;
    Ok(Json(ApiResponse::success(Ack {})))
}

/// GET /internal/v1/accounts/{account}/balance
pub async fn balance(
    State(bank): State<Arc<BankService>>,
    Path(account): Path<String>,
) -> BankResult<BalanceData> {
    let account = AccountId::new(account);
    let balance = bank.balance(&account)?;
    Ok(Json(ApiResponse::success(BalanceData { account, balance })))
}
