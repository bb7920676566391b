//! 测量值查询
//!
//! `GET /api/get-params?id=<device>` 先按需刷新（受节流约束），再返回缓存快照。
//! 返回体为裸 JSON 数组，顺序与寄存器映射一致：
//!
//! ```json
//! [{"name": "Счетчик", "value": "42", "fresh": true, "status": 1}, ...]
//! ```
//!
//! 设备读不到时依然返回 200，退化只体现在 `fresh`/`status` 上。

use crate::AppState;
use crate::utils::response::{acquisition_error, bad_request_error};
use api_contract::{MeasurementDto, ParamsQuery};
use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::time::Instant;

pub async fn get_params(
    State(state): State<AppState>,
    Query(query): Query<ParamsQuery>,
) -> Response {
    let Some(device_id) = query.id.filter(|id| !id.trim().is_empty()) else {
        return bad_request_error("query parameter `id` is required");
    };

    match state.registry.get_snapshot(device_id.trim(), Instant::now()).await {
        Ok(snapshot) => {
            let items: Vec<MeasurementDto> = snapshot
                .into_iter()
                .map(|item| MeasurementDto::new(item.name, item.value, item.fresh))
                .collect();
            (StatusCode::OK, Json(items)).into_response()
        }
        Err(err) => acquisition_error(err),
    }
}
