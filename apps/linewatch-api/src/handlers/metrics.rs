use api_contract::{ApiResponse, MetricsSnapshotDto};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use linewatch_telemetry::metrics;

/// 进程内累计的采集计数。
pub async fn get_metrics() -> Response {
    let snapshot = metrics().snapshot();
    let dto = MetricsSnapshotDto {
        refresh_completed: snapshot.refresh_completed,
        refresh_throttled: snapshot.refresh_throttled,
        refresh_in_flight: snapshot.refresh_in_flight,
        block_read_success: snapshot.block_read_success,
        block_read_timeout: snapshot.block_read_timeout,
        block_read_failure: snapshot.block_read_failure,
        field_decode_failure: snapshot.field_decode_failure,
    };
    (StatusCode::OK, Json(ApiResponse::success(dto))).into_response()
}
