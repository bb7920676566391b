//! 挤出线数据采集 HTTP 服务：测量值查询、设备列表、采集计数与请求追踪 ID。

mod handlers;
mod line_map;
mod routes;
mod utils;

use axum::{
    Router,
    body::Body,
    http::{HeaderValue, Request},
    middleware::{self, Next},
    response::Response,
};
use domain::RegisterMap;
use linewatch_acquisition::{AcquirerRegistry, AcquisitionError, DeviceAcquirer, spawn_poller};
use linewatch_config::AppConfig;
use linewatch_protocol::{ModbusTcpClient, ModbusTcpConfig};
use linewatch_telemetry::{init_tracing, new_request_ids};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{Instrument, info};

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<AcquirerRegistry>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 加载本地 .env（如存在），便于直接 cargo run 启动
    dotenvy::dotenv().ok();
    // 从环境变量加载运行配置
    let config = AppConfig::from_env()?;
    // 初始化结构化日志
    init_tracing();

    // 两条线共用同一份寄存器映射
    let map = Arc::new(line_map::extrusion_line_map()?);
    let registry = Arc::new(build_registry(&config, map)?);
    info!(devices = ?registry.device_ids(), "acquirer registry ready");

    if config.poll_enabled {
        spawn_poller(Arc::clone(&registry), config.poll_interval);
    }

    let app = build_app(AppState { registry });

    let listener = tokio::net::TcpListener::bind(&config.http_addr).await?;
    info!(addr = %config.http_addr, "http server listening");
    axum::serve(listener, app).await?;
    Ok(())
}

/// 每台设备一个独占的 Modbus TCP 客户端。
fn build_registry(
    config: &AppConfig,
    map: Arc<RegisterMap>,
) -> Result<AcquirerRegistry, AcquisitionError> {
    let acquirers = config
        .devices
        .iter()
        .map(|device| {
            let client_config = ModbusTcpConfig::from_target(&device.target)
                .with_timeouts(config.connect_timeout_ms, config.read_timeout_ms);
            DeviceAcquirer::new(
                device.id.clone(),
                device.target.clone(),
                Arc::clone(&map),
                Box::new(ModbusTcpClient::new(client_config)),
            )
            .with_min_period(device.effective_min_period(config.min_period))
        })
        .collect();
    AcquirerRegistry::new(acquirers)
}

/// 挂载路由（/ 与 /api/ 两种前缀）和请求中间件。
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .merge(routes::create_api_router())
        .nest("/api", routes::create_api_router())
        .with_state(state)
        // 注入 request_id/trace_id
        .layer(middleware::from_fn(request_context))
        .layer(TraceLayer::new_for_http())
}

async fn request_context(mut req: Request<Body>, next: Next) -> Response {
    let ids = new_request_ids();
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    req.extensions_mut().insert(ids.clone());

    let span = tracing::info_span!(
        "request",
        request_id = %ids.request_id,
        trace_id = %ids.trace_id,
        method = %method,
        path = %path
    );

    let mut response = next.run(req).instrument(span).await;
    for (name, value) in [("x-request-id", &ids.request_id), ("x-trace-id", &ids.trace_id)] {
        response.headers_mut().insert(
            name,
            HeaderValue::from_str(value).unwrap_or_else(|_| HeaderValue::from_static("")),
        );
    }
    response
}
