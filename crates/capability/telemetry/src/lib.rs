//! 追踪、请求 ID 与采集计数。

use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing_subscriber::{EnvFilter, fmt};

/// 请求级追踪标识。
#[derive(Debug, Clone)]
pub struct RequestIds {
    pub request_id: String,
    pub trace_id: String,
}

/// 采集指标快照。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub refresh_completed: u64,
    pub refresh_throttled: u64,
    pub refresh_in_flight: u64,
    pub block_read_success: u64,
    pub block_read_timeout: u64,
    pub block_read_failure: u64,
    pub field_decode_failure: u64,
}

/// 采集指标（进程内累计）。
pub struct TelemetryMetrics {
    refresh_completed: AtomicU64,
    refresh_throttled: AtomicU64,
    refresh_in_flight: AtomicU64,
    block_read_success: AtomicU64,
    block_read_timeout: AtomicU64,
    block_read_failure: AtomicU64,
    field_decode_failure: AtomicU64,
}

impl Default for TelemetryMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetryMetrics {
    pub fn new() -> Self {
        Self {
            refresh_completed: AtomicU64::new(0),
            refresh_throttled: AtomicU64::new(0),
            refresh_in_flight: AtomicU64::new(0),
            block_read_success: AtomicU64::new(0),
            block_read_timeout: AtomicU64::new(0),
            block_read_failure: AtomicU64::new(0),
            field_decode_failure: AtomicU64::new(0),
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            refresh_completed: self.refresh_completed.load(Ordering::Relaxed),
            refresh_throttled: self.refresh_throttled.load(Ordering::Relaxed),
            refresh_in_flight: self.refresh_in_flight.load(Ordering::Relaxed),
            block_read_success: self.block_read_success.load(Ordering::Relaxed),
            block_read_timeout: self.block_read_timeout.load(Ordering::Relaxed),
            block_read_failure: self.block_read_failure.load(Ordering::Relaxed),
            field_decode_failure: self.field_decode_failure.load(Ordering::Relaxed),
        }
    }
}

static METRICS: OnceLock<TelemetryMetrics> = OnceLock::new();

/// 获取全局指标实例。
pub fn metrics() -> &'static TelemetryMetrics {
    METRICS.get_or_init(TelemetryMetrics::new)
}

/// 初始化 tracing（默认 info）。
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).try_init();
}

/// 生成新的 request_id 与 trace_id。
pub fn new_request_ids() -> RequestIds {
    RequestIds {
        request_id: uuid::Uuid::new_v4().to_string(),
        trace_id: uuid::Uuid::new_v4().to_string(),
    }
}

/// 记录完成的刷新轮次。
pub fn record_refresh_completed() {
    metrics().refresh_completed.fetch_add(1, Ordering::Relaxed);
}

/// 记录被节流跳过的刷新。
pub fn record_refresh_throttled() {
    metrics().refresh_throttled.fetch_add(1, Ordering::Relaxed);
}

/// 记录因已有刷新在执行而跳过的刷新。
pub fn record_refresh_in_flight() {
    metrics().refresh_in_flight.fetch_add(1, Ordering::Relaxed);
}

/// 记录块读取成功次数。
pub fn record_block_read_success() {
    metrics().block_read_success.fetch_add(1, Ordering::Relaxed);
}

/// 记录块读取超时次数。
pub fn record_block_read_timeout() {
    metrics().block_read_timeout.fetch_add(1, Ordering::Relaxed);
}

/// 记录块读取失败次数（超时除外）。
pub fn record_block_read_failure() {
    metrics().block_read_failure.fetch_add(1, Ordering::Relaxed);
}

/// 记录字段解码失败次数。
pub fn record_field_decode_failure() {
    metrics()
        .field_decode_failure
        .fetch_add(1, Ordering::Relaxed);
}
