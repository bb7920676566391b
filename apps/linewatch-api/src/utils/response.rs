//! HTTP 错误响应辅助函数
//!
//! 所有错误返回统一的 ApiResponse 格式，HTTP 状态码与错误码一一对应。

use api_contract::ApiResponse;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use linewatch_acquisition::AcquisitionError;

/// 错误请求响应
pub fn bad_request_error(message: impl Into<String>) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiResponse::<()>::error("INVALID.REQUEST", message.into())),
    )
        .into_response()
}

/// 设备未注册
pub fn device_not_found_error(device_id: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ApiResponse::<()>::error(
            "DEVICE.NOT_FOUND",
            format!("unknown device: {}", device_id),
        )),
    )
        .into_response()
}

/// 采集错误响应
pub fn acquisition_error(err: AcquisitionError) -> Response {
    match err {
        AcquisitionError::UnknownDevice(device_id) => device_not_found_error(&device_id),
        err => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::<()>::error("INTERNAL.ERROR", err.to_string())),
        )
            .into_response(),
    }
}
