//! 路由定义
//!
//! - 健康检查：/health
//! - 测量值：/get-params?id=<device>
//! - 设备列表：/devices
//! - 采集计数：/metrics

use super::AppState;
use super::handlers::*;
use axum::{Router, routing::get};

pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/get-params", get(get_params))
        .route("/devices", get(list_devices))
        .route("/metrics", get(get_metrics))
}

#[cfg(test)]
mod tests {
    use crate::{AppState, build_app};
    use async_trait::async_trait;
    use axum::{
        Router,
        body::Body,
        http::{Request, StatusCode},
    };
    use bytes::Bytes;
    use domain::{BlockSpec, DeviceTarget, FieldSpec, FunctionCode, RegisterKind, RegisterMap};
    use http_body_util::BodyExt;
    use linewatch_acquisition::{AcquirerRegistry, DeviceAcquirer};
    use linewatch_protocol::{BlockReader, ProtocolError};
    use serde_json::Value;
    use std::sync::Arc;
    use tower::ServiceExt;

    /// 固定返回同一组寄存器值。
    struct FixedReader(Vec<i64>);

    #[async_trait]
    impl BlockReader for FixedReader {
        async fn read_block(
            &mut self,
            _unit_id: u8,
            _function_code: FunctionCode,
            _start: u16,
            _quantity: u16,
            _layout: &str,
        ) -> Result<Vec<i64>, ProtocolError> {
            Ok(self.0.clone())
        }
    }

    /// 始终超时。
    struct DeadReader;

    #[async_trait]
    impl BlockReader for DeadReader {
        async fn read_block(
            &mut self,
            _unit_id: u8,
            _function_code: FunctionCode,
            _start: u16,
            _quantity: u16,
            _layout: &str,
        ) -> Result<Vec<i64>, ProtocolError> {
            Err(ProtocolError::Timeout("no response".to_string()))
        }
    }

    fn map() -> Arc<RegisterMap> {
        let block = BlockSpec::new(
            FunctionCode::ReadInputRegisters,
            1,
            2,
            vec![
                FieldSpec::new("counter", "Счетчик", 1).with_kind(RegisterKind::Uint16),
                FieldSpec::new("t1", "Т1", 2).with_scale(0.1).expect("scale"),
            ],
        )
        .expect("block");
        Arc::new(RegisterMap::new(vec![block]).expect("map"))
    }

    fn app() -> Router {
        let map = map();
        let registry = AcquirerRegistry::new(vec![
            DeviceAcquirer::new(
                "1",
                DeviceTarget::new("192.168.0.15", 502),
                Arc::clone(&map),
                Box::new(FixedReader(vec![42, 215])),
            ),
            DeviceAcquirer::new(
                "2",
                DeviceTarget::new("192.168.0.16", 502),
                map,
                Box::new(DeadReader),
            ),
        ])
        .expect("registry");
        build_app(AppState {
            registry: Arc::new(registry),
        })
    }

    async fn send(app: Router, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes: Bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn get_params_returns_fresh_measurements() {
        let (status, body) = send(app(), "/api/get-params?id=1").await;
        assert_eq!(status, StatusCode::OK);
        let items = body.as_array().expect("array");
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["name"], "Счетчик");
        assert_eq!(items[0]["value"], "42");
        assert_eq!(items[0]["fresh"], true);
        assert_eq!(items[0]["status"], 1);
        assert_eq!(items[1]["name"], "Т1");
        assert_eq!(items[1]["value"], "21.5");
    }

    #[tokio::test]
    async fn get_params_without_api_prefix() {
        let (status, body) = send(app(), "/get-params?id=1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().map(Vec::len), Some(2));
    }

    #[tokio::test]
    async fn unreachable_device_yields_stale_empty_values() {
        let (status, body) = send(app(), "/api/get-params?id=2").await;
        assert_eq!(status, StatusCode::OK);
        for item in body.as_array().expect("array") {
            assert_eq!(item["value"], "");
            assert_eq!(item["fresh"], false);
            assert_eq!(item["status"], 0);
        }
    }

    #[tokio::test]
    async fn unknown_device_is_not_found() {
        let (status, body) = send(app(), "/api/get-params?id=9").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "DEVICE.NOT_FOUND");
    }

    #[tokio::test]
    async fn missing_id_is_bad_request() {
        let (status, body) = send(app(), "/api/get-params").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "INVALID.REQUEST");
    }

    #[tokio::test]
    async fn devices_are_listed_in_registration_order() {
        let (status, body) = send(app(), "/api/devices").await;
        assert_eq!(status, StatusCode::OK);
        let devices = body["data"].as_array().expect("array");
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0]["deviceId"], "1");
        assert_eq!(devices[0]["target"], "192.168.0.15:502");
        assert_eq!(devices[0]["minPeriodMs"], 500);
        assert_eq!(devices[1]["fieldCount"], 2);
    }

    #[tokio::test]
    async fn health_and_request_ids() {
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        assert!(response.headers().contains_key("x-trace-id"));
    }

    #[tokio::test]
    async fn metrics_reports_counters() {
        let (status, body) = send(app(), "/api/metrics").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert!(body["data"]["refreshCompleted"].is_u64());
        assert!(body["data"]["blockReadTimeout"].is_u64());
    }
}
