//! Setting management handlers.

use axum::{
    Json,
    extract::{Query, State},
};

use crate::api::state::AppState;
use crate::domain::{
    ApiResponse, CapacityReport, ResumeRequest, ResumeResponse, Setting, SettingOverrides,
    UsageState,
};
use crate::error::Result;

/// Get the current setting.
///
/// # Errors
///
/// Returns an error if storage fails.
pub async fn get_setting(State(state): State<AppState>) -> Result<Json<ApiResponse<Setting>>> {
    let setting = state.minter.current_setting().await?;
    Ok(Json(ApiResponse::success(setting)))
}

/// Replace the current setting.
///
/// # Errors
///
/// Returns an error if the setting is invalid or storage fails.
pub async fn update_setting(
    State(state): State<AppState>,
    Json(setting): Json<Setting>,
) -> Result<Json<ApiResponse<Setting>>> {
    let setting = state.minter.update_setting(setting).await?;
    Ok(Json(ApiResponse::success(setting)))
}

/// Report remaining capacity of the current setting, with overrides.
///
/// # Errors
///
/// Returns an error if the effective setting is invalid or storage fails.
pub async fn capacity(
    State(state): State<AppState>,
    Query(overrides): Query<SettingOverrides>,
) -> Result<Json<ApiResponse<CapacityReport>>> {
    let setting = overrides.apply(state.minter.current_setting().await?);
    let report = state.minter.capacity(&setting).await?;
    Ok(Json(ApiResponse::success(report)))
}

/// Move the sequential resume point past an existing identifier.
///
/// # Errors
///
/// Returns an error if the identifier does not decode under the effective
/// setting, or storage fails.
pub async fn resume(
    State(state): State<AppState>,
    Json(request): Json<ResumeRequest>,
) -> Result<Json<ApiResponse<ResumeResponse>>> {
    let setting = request
        .overrides
        .apply(state.minter.current_setting().await?);
    let ordinal = state.minter.resume_after(&setting, &request.pid).await?;
    Ok(Json(ApiResponse::success(ResumeResponse { ordinal })))
}

/// List usage records of every configuration minted so far.
///
/// # Errors
///
/// Returns an error if storage fails.
pub async fn list_usage(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<UsageState>>>> {
    let usage = state.minter.usage_records().await?;
    Ok(Json(ApiResponse::success(usage)))
}
