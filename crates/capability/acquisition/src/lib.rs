//! # 数据采集核心
//!
//! ```text
//! 调用方 → AcquirerRegistry::get_snapshot(device_id, now)
//!       │
//!       ▼
//! DeviceAcquirer::refresh_if_due(now)   (节流：最小刷新周期 + 单飞)
//!       │  按映射顺序逐块读取
//!       ▼
//! BlockReader::read_block(...)          (每块独立超时、独立失败)
//!       │
//!       ▼
//! MeasurementCache::apply_block(...)    (解码 + 缩放 + 打时间戳)
//!       │
//!       ▼
//! DeviceAcquirer::snapshot(now)         (name, value, fresh)
//! ```
//!
//! 块读取与字段解码的错误只记录日志和计数，不会传播给调用方；
//! 对外唯一可见的退化信号是测量值的新鲜度标记。

mod acquirer;
mod cache;
mod error;
mod poller;
mod registry;

pub use acquirer::{
    BlockFailure, DEFAULT_MIN_PERIOD, DEFAULT_UNIT_ID, DeviceAcquirer, RefreshOutcome,
    RefreshReport,
};
pub use cache::{BlockApply, FieldError, MeasurementCache, MeasurementSnapshot, STALENESS_WINDOW};
pub use error::AcquisitionError;
pub use poller::spawn_poller;
pub use registry::AcquirerRegistry;
