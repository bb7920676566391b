//! 测量值缓存
//!
//! 每个字段一把读写锁：并发快照看到的是某字段的旧值或新值，不会读到半更新状态。
//! 字段之间互不约束，各自随所属块的解码完成而更新。

use crate::error::AcquisitionError;
use domain::{BlockSpec, FieldSpec, RegisterMap};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};

/// 新鲜度窗口：最近一次成功解码距今小于该时长视为新鲜。
pub const STALENESS_WINDOW: Duration = Duration::from_secs(2);

/// 对外快照项。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeasurementSnapshot {
    pub id: String,
    pub name: String,
    pub value: String,
    pub fresh: bool,
}

/// 单个字段的解码错误。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field_id: String,
    pub error: AcquisitionError,
}

/// 一个块解码写入缓存的结果。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockApply {
    pub updated: usize,
    pub errors: Vec<FieldError>,
}

#[derive(Debug, Default)]
struct MeasurementState {
    raw: Option<i64>,
    value: String,
    updated_at: Option<Instant>,
}

struct Measurement {
    spec: FieldSpec,
    state: RwLock<MeasurementState>,
}

/// 一台设备全部字段的最新值。
pub struct MeasurementCache {
    measurements: Vec<Measurement>,
    index: HashMap<String, usize>,
    staleness_window: Duration,
}

impl MeasurementCache {
    /// 按映射顺序为每个字段创建初始（空值、过期）测量。
    pub fn new(map: &RegisterMap) -> Self {
        Self::with_staleness_window(map, STALENESS_WINDOW)
    }

    pub fn with_staleness_window(map: &RegisterMap, staleness_window: Duration) -> Self {
        let measurements: Vec<Measurement> = map
            .fields()
            .map(|spec| Measurement {
                spec: spec.clone(),
                state: RwLock::new(MeasurementState::default()),
            })
            .collect();
        let index = measurements
            .iter()
            .enumerate()
            .map(|(position, measurement)| (measurement.spec.id().to_string(), position))
            .collect();
        Self {
            measurements,
            index,
            staleness_window,
        }
    }

    pub fn len(&self) -> usize {
        self.measurements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.measurements.is_empty()
    }

    pub fn staleness_window(&self) -> Duration {
        self.staleness_window
    }

    fn measurement(&self, field_id: &str) -> Result<&Measurement, AcquisitionError> {
        self.index
            .get(field_id)
            .map(|position| &self.measurements[*position])
            .ok_or_else(|| AcquisitionError::UnknownField(field_id.to_string()))
    }

    /// 写入一个原始值：按字段缩放生成显示值，并以 `now` 作为更新时间。
    pub fn update(&self, field_id: &str, raw: i64, now: Instant) -> Result<String, AcquisitionError> {
        let measurement = self.measurement(field_id)?;
        if !measurement.spec.kind().contains(raw) {
            return Err(AcquisitionError::Protocol(format!(
                "value {} does not fit {:?} for field {}",
                raw,
                measurement.spec.kind(),
                field_id
            )));
        }
        let value = measurement.spec.scale().render(raw);

        let mut state = measurement
            .state
            .write()
            .map_err(|_| AcquisitionError::LockPoisoned)?;
        state.raw = Some(raw);
        state.value = value.clone();
        state.updated_at = Some(now);
        Ok(value)
    }

    /// 新鲜度：从未更新过的字段始终过期。
    pub fn freshness(&self, field_id: &str, now: Instant) -> Result<bool, AcquisitionError> {
        let measurement = self.measurement(field_id)?;
        let state = measurement
            .state
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        Ok(is_fresh(state.updated_at, now, self.staleness_window))
    }

    /// 当前显示值（未更新过为空串）。
    pub fn value(&self, field_id: &str) -> Result<String, AcquisitionError> {
        let measurement = self.measurement(field_id)?;
        let state = measurement
            .state
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        Ok(state.value.clone())
    }

    /// 最近一次解码得到的原始值。
    pub fn raw_value(&self, field_id: &str) -> Result<Option<i64>, AcquisitionError> {
        let measurement = self.measurement(field_id)?;
        let state = measurement
            .state
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        Ok(state.raw)
    }

    /// 按插入顺序返回全部字段。
    pub fn snapshot(&self, now: Instant) -> Vec<MeasurementSnapshot> {
        self.measurements
            .iter()
            .map(|measurement| {
                let state = measurement
                    .state
                    .read()
                    .unwrap_or_else(PoisonError::into_inner);
                MeasurementSnapshot {
                    id: measurement.spec.id().to_string(),
                    name: measurement.spec.name().to_string(),
                    value: state.value.clone(),
                    fresh: is_fresh(state.updated_at, now, self.staleness_window),
                }
            })
            .collect()
    }

    /// 将一次块读取的解码结果写入该块的全部字段。
    ///
    /// 单个字段越界或无法转换只记录在返回值中，不影响同块其他字段。
    pub fn apply_block(&self, block: &BlockSpec, values: &[i64], now: Instant) -> BlockApply {
        let mut result = BlockApply::default();
        for field in block.fields() {
            let offset = block.offset_of(field);
            let outcome = match values.get(offset) {
                Some(raw) => self.update(field.id(), *raw, now).map(|_| ()),
                None => Err(AcquisitionError::Protocol(format!(
                    "offset {} outside response of {} values",
                    offset,
                    values.len()
                ))),
            };
            match outcome {
                Ok(()) => result.updated += 1,
                Err(error) => result.errors.push(FieldError {
                    field_id: field.id().to_string(),
                    error,
                }),
            }
        }
        result
    }
}

fn is_fresh(updated_at: Option<Instant>, now: Instant, window: Duration) -> bool {
    match updated_at {
        Some(at) => now.saturating_duration_since(at) < window,
        None => false,
    }
}
