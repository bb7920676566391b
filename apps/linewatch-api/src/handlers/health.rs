use axum::{Json, response::IntoResponse};

/// 健康检查，返回 `{"ok": true}`。不触发任何设备读取。
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "ok": true }))
}
