//! 稳定的 DTO 与 API 响应契约。

use serde::{Deserialize, Serialize};

/// 标准 API 响应封装。
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

/// 失败响应的错误体。
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ApiError {
                code: code.into(),
                message: message.into(),
            }),
        }
    }
}

/// 测量值查询参数（`/api/get-params?id=1`）。
#[derive(Debug, Deserialize)]
pub struct ParamsQuery {
    pub id: Option<String>,
}

/// 单个测量值。
///
/// `status` 与 `fresh` 同义（1 = 新鲜），供现有前端直接使用。
#[derive(Debug, Clone, Serialize)]
pub struct MeasurementDto {
    pub name: String,
    pub value: String,
    pub fresh: bool,
    pub status: u8,
}

impl MeasurementDto {
    pub fn new(name: impl Into<String>, value: impl Into<String>, fresh: bool) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            fresh,
            status: u8::from(fresh),
        }
    }
}

/// 已注册设备。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceDto {
    pub device_id: String,
    pub target: String,
    pub min_period_ms: u64,
    pub field_count: usize,
}

/// 采集指标快照。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshotDto {
    pub refresh_completed: u64,
    pub refresh_throttled: u64,
    pub refresh_in_flight: u64,
    pub block_read_success: u64,
    pub block_read_timeout: u64,
    pub block_read_failure: u64,
    pub field_decode_failure: u64,
}
