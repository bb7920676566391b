use crate::AppState;
use api_contract::{ApiResponse, DeviceDto};
use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// 已注册设备（注册顺序）。
pub async fn list_devices(State(state): State<AppState>) -> Response {
    let devices: Vec<DeviceDto> = state
        .registry
        .iter()
        .map(|acquirer| DeviceDto {
            device_id: acquirer.device_id().to_string(),
            target: acquirer.target().to_string(),
            min_period_ms: acquirer.min_period().as_millis() as u64,
            field_count: acquirer.register_map().field_count(),
        })
        .collect();
    (StatusCode::OK, Json(ApiResponse::success(devices))).into_response()
}
