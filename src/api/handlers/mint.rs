//! Identifier minting handler.

use axum::{
    Json,
    extract::{Query, State},
};

use crate::api::state::AppState;
use crate::domain::{ApiResponse, MintQuery, MintResponse, SettingOverrides};
use crate::error::Result;

/// Mint identifiers under the current setting, with per-request overrides.
///
/// # Errors
///
/// Returns an error if the effective setting is invalid, the amount exceeds
/// the batch limit or remaining capacity, or storage fails.
pub async fn mint(
    State(state): State<AppState>,
    Query(query): Query<MintQuery>,
    Query(overrides): Query<SettingOverrides>,
) -> Result<Json<ApiResponse<MintResponse>>> {
    let setting = overrides.apply(state.minter.current_setting().await?);
    let batch = state.minter.mint(query.amount, &setting).await?;

    Ok(Json(ApiResponse::success(MintResponse {
        pids: batch.pids,
        ordinal: batch.next_ordinal,
    })))
}
