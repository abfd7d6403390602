use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};
use validator::Validate;

use super::dto::{
    RegisterThermometerRequest, ThermometerResponse, UnregisterQuery,
};
use crate::monitoring::MonitoringStatus;
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::BaseResponse;

/// Register a thermometer for monitoring in a channel
///
/// Starts the monitoring loop when it is not running. Re-registering an
/// inactive pair reactivates it with the supplied settings.
#[utoipa::path(
    post,
    path = "/api/thermometers",
    request_body = RegisterThermometerRequest,
    responses(
        (status = 200, description = "Thermometer registered", body = SuccessThermometerResponse),
        (status = 400, description = "Invalid request or thresholds", body = ErrorResponse),
        (status = 409, description = "Already registered in this channel", body = ErrorResponse),
        (status = 500, description = "Registry failure", body = ErrorResponse)
    ),
    tag = "Thermometer"
)]
pub async fn register_thermometer(
    State(state): State<AppState>,
    payload: Result<Json<RegisterThermometerRequest>, JsonRejection>,
) -> Result<Json<BaseResponse<ThermometerResponse>>, AppError> {
    let Json(req) = payload?;
    req.validate()?;

    let device = state.thermometer_service.register(req.into()).await?;

    Ok(Json(BaseResponse::success(device.into())))
}

/// Unregister a thermometer from a channel
///
/// Monitoring stops once no active registrations remain.
#[utoipa::path(
    delete,
    path = "/api/thermometers/{thermometerId}",
    params(
        ("thermometerId" = String, Path, description = "Vendor device id"),
        ("channelId" = String, Query, description = "Channel the thermometer is registered in")
    ),
    responses(
        (status = 200, description = "Thermometer unregistered", body = SuccessThermometerResponse),
        (status = 400, description = "Missing channelId", body = ErrorResponse),
        (status = 404, description = "Not registered in this channel", body = ErrorResponse),
        (status = 409, description = "Already unregistered", body = ErrorResponse)
    ),
    tag = "Thermometer"
)]
pub async fn unregister_thermometer(
    State(state): State<AppState>,
    Path(thermometer_id): Path<String>,
    query: Result<Query<UnregisterQuery>, QueryRejection>,
) -> Result<Json<BaseResponse<ThermometerResponse>>, AppError> {
    let Query(query) = query?;
    query.validate()?;

    let device = state
        .thermometer_service
        .unregister(&thermometer_id, &query.channel_id)
        .await?;

    Ok(Json(BaseResponse::success(device.into())))
}

/// Active thermometers of a channel, newest first
#[utoipa::path(
    get,
    path = "/api/channels/{channelId}/thermometers",
    params(
        ("channelId" = String, Path, description = "Delivery channel id")
    ),
    responses(
        (status = 200, description = "Channel thermometers", body = SuccessThermometerListResponse)
    ),
    tag = "Thermometer"
)]
pub async fn list_channel_thermometers(
    State(state): State<AppState>,
    Path(channel_id): Path<String>,
) -> Result<Json<BaseResponse<Vec<ThermometerResponse>>>, AppError> {
    let devices = state.thermometer_service.list_by_channel(&channel_id).await?;

    Ok(Json(BaseResponse::success(
        devices.into_iter().map(ThermometerResponse::from).collect(),
    )))
}

/// Monitoring loop diagnostics
#[utoipa::path(
    get,
    path = "/api/monitoring/status",
    responses(
        (status = 200, description = "Current loop state", body = SuccessMonitoringStatusResponse)
    ),
    tag = "Monitoring"
)]
pub async fn monitoring_status(State(state): State<AppState>) -> Json<BaseResponse<MonitoringStatus>> {
    Json(BaseResponse::success(state.thermometer_service.monitoring_status()))
}
