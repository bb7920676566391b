//! 单台设备的采集器
//!
//! 状态机只有两个状态：空闲 / 刷新中。`refresh_if_due` 在同一次加锁内完成
//! “是否到期”判断、`last_attempt` 打点和进入刷新中状态，因此同一设备任意时刻
//! 至多一轮刷新在执行。刷新期间到来的调用直接返回，读取上一次提交的缓存。

use crate::cache::{FieldError, MeasurementCache, MeasurementSnapshot};
use crate::error::AcquisitionError;
use domain::{DeviceTarget, RegisterMap};
use linewatch_protocol::BlockReader;
use linewatch_telemetry::{
    record_block_read_failure, record_block_read_success, record_block_read_timeout,
    record_field_decode_failure, record_refresh_completed, record_refresh_in_flight,
    record_refresh_throttled,
};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// 默认最小刷新周期
pub const DEFAULT_MIN_PERIOD: Duration = Duration::from_millis(500);

/// 块读取使用的从站地址
pub const DEFAULT_UNIT_ID: u8 = 1;

/// 失败的块读取。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockFailure {
    pub start: u16,
    pub quantity: u16,
    pub error: AcquisitionError,
}

/// 一轮刷新的结果汇总。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshReport {
    pub blocks_read: usize,
    pub fields_updated: usize,
    pub timeouts: Vec<BlockFailure>,
    pub failures: Vec<BlockFailure>,
    pub field_errors: Vec<FieldError>,
}

impl RefreshReport {
    /// 所有块读取成功且无字段错误。
    pub fn is_clean(&self) -> bool {
        self.timeouts.is_empty() && self.failures.is_empty() && self.field_errors.is_empty()
    }
}

/// `refresh_if_due` 的结果。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// 距上次尝试不足最小刷新周期
    Throttled,
    /// 已有一轮刷新在执行
    InFlight,
    /// 本次调用执行了一轮刷新
    Completed(RefreshReport),
}

impl RefreshOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }
}

#[derive(Debug, Default)]
struct ThrottleState {
    last_attempt: Option<Instant>,
    refreshing: bool,
}

/// 刷新中标记的持有者；析构时回到空闲（包括调用方 future 被取消的情况）。
struct RefreshGuard<'a> {
    throttle: &'a Mutex<ThrottleState>,
}

impl Drop for RefreshGuard<'_> {
    fn drop(&mut self) {
        let mut state = self
            .throttle
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        state.refreshing = false;
    }
}

/// 单台设备：连接、寄存器映射与测量缓存。
pub struct DeviceAcquirer {
    device_id: String,
    target: DeviceTarget,
    map: Arc<RegisterMap>,
    min_period: Duration,
    unit_id: u8,
    cache: MeasurementCache,
    throttle: Mutex<ThrottleState>,
    reader: tokio::sync::Mutex<Box<dyn BlockReader>>,
}

impl DeviceAcquirer {
    pub fn new(
        device_id: impl Into<String>,
        target: DeviceTarget,
        map: Arc<RegisterMap>,
        reader: Box<dyn BlockReader>,
    ) -> Self {
        let cache = MeasurementCache::new(&map);
        Self {
            device_id: device_id.into(),
            target,
            map,
            min_period: DEFAULT_MIN_PERIOD,
            unit_id: DEFAULT_UNIT_ID,
            cache,
            throttle: Mutex::new(ThrottleState::default()),
            reader: tokio::sync::Mutex::new(reader),
        }
    }

    pub fn with_min_period(mut self, min_period: Duration) -> Self {
        self.min_period = min_period;
        self
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn target(&self) -> &DeviceTarget {
        &self.target
    }

    pub fn register_map(&self) -> &RegisterMap {
        &self.map
    }

    pub fn min_period(&self) -> Duration {
        self.min_period
    }

    pub fn cache(&self) -> &MeasurementCache {
        &self.cache
    }

    pub fn last_attempt(&self) -> Option<Instant> {
        self.throttle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last_attempt
    }

    pub fn is_refreshing(&self) -> bool {
        self.throttle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .refreshing
    }

    /// 到期判断与打点在同一把锁内完成。
    fn try_begin(&self, now: Instant) -> Result<RefreshGuard<'_>, RefreshOutcome> {
        let mut state = self
            .throttle
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if state.refreshing {
            return Err(RefreshOutcome::InFlight);
        }
        if let Some(last_attempt) = state.last_attempt
            && now < last_attempt + self.min_period
        {
            return Err(RefreshOutcome::Throttled);
        }
        state.last_attempt = Some(now);
        state.refreshing = true;
        Ok(RefreshGuard {
            throttle: &self.throttle,
        })
    }

    /// 到期则按映射顺序读取全部块并更新缓存，否则立即返回。
    ///
    /// 块读取失败不会中断本轮刷新，也不会返回错误；该块字段保持原值直至过期。
    pub async fn refresh_if_due(&self, now: Instant) -> RefreshOutcome {
        let _guard = match self.try_begin(now) {
            Ok(guard) => guard,
            Err(outcome) => {
                match outcome {
                    RefreshOutcome::InFlight => record_refresh_in_flight(),
                    _ => record_refresh_throttled(),
                }
                return outcome;
            }
        };

        let report = self.refresh_blocks(now).await;
        record_refresh_completed();
        debug!(
            device_id = %self.device_id,
            blocks_read = report.blocks_read,
            fields_updated = report.fields_updated,
            values = %self.summary(),
            "refresh finished"
        );
        RefreshOutcome::Completed(report)
    }

    async fn refresh_blocks(&self, now: Instant) -> RefreshReport {
        let started = Instant::now();
        let mut report = RefreshReport::default();
        let mut reader = self.reader.lock().await;

        for block in self.map.blocks() {
            let result = reader
                .read_block(
                    self.unit_id,
                    block.function_code(),
                    block.start(),
                    block.count(),
                    block.layout(),
                )
                .await;

            let values = match result {
                Ok(values) => values,
                Err(err) => {
                    let failure = BlockFailure {
                        start: block.start(),
                        quantity: block.count(),
                        error: AcquisitionError::from(err),
                    };
                    if let AcquisitionError::ConnectionTimeout(_) = failure.error {
                        record_block_read_timeout();
                        warn!(
                            device_id = %self.device_id,
                            block_start = block.start(),
                            quantity = block.count(),
                            error = %failure.error,
                            "block read timed out"
                        );
                        report.timeouts.push(failure);
                    } else {
                        record_block_read_failure();
                        warn!(
                            device_id = %self.device_id,
                            block_start = block.start(),
                            quantity = block.count(),
                            error = %failure.error,
                            "block read failed"
                        );
                        report.failures.push(failure);
                    }
                    continue;
                }
            };

            record_block_read_success();
            report.blocks_read += 1;
            // 时间戳取实际解码时刻，相对本轮触发时刻偏移
            let applied = self.cache.apply_block(block, &values, now + started.elapsed());
            report.fields_updated += applied.updated;
            for field_error in applied.errors {
                record_field_decode_failure();
                warn!(
                    device_id = %self.device_id,
                    block_start = block.start(),
                    field_id = %field_error.field_id,
                    error = %field_error.error,
                    "field decode failed"
                );
                report.field_errors.push(field_error);
            }
        }

        report
    }

    /// 当前缓存快照，不等待进行中的刷新。
    pub fn snapshot(&self, now: Instant) -> Vec<MeasurementSnapshot> {
        self.cache.snapshot(now)
    }

    fn summary(&self) -> String {
        self.map
            .fields()
            .map(|field| {
                let value = self.cache.value(field.id()).unwrap_or_default();
                format!("{}={}", field.id(), value)
            })
            .collect::<Vec<_>>()
            .join(",")
    }
}
