//! 设备注册表
//!
//! 启动时由静态配置一次性构建，运行期不增删设备；以显式对象形式传给服务层。

use crate::acquirer::{DeviceAcquirer, RefreshOutcome};
use crate::cache::MeasurementSnapshot;
use crate::error::AcquisitionError;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;
use tracing::warn;

/// 全部设备采集器，按设备 ID 索引。
pub struct AcquirerRegistry {
    devices: HashMap<String, Arc<DeviceAcquirer>>,
    order: Vec<String>,
}

impl AcquirerRegistry {
    /// 构建注册表；设备 ID 重复时报错。
    pub fn new(acquirers: Vec<DeviceAcquirer>) -> Result<Self, AcquisitionError> {
        let mut devices = HashMap::with_capacity(acquirers.len());
        let mut order = Vec::with_capacity(acquirers.len());
        for acquirer in acquirers {
            let device_id = acquirer.device_id().to_string();
            if devices.contains_key(&device_id) {
                return Err(AcquisitionError::DuplicateDevice(device_id));
            }
            order.push(device_id.clone());
            devices.insert(device_id, Arc::new(acquirer));
        }
        Ok(Self { devices, order })
    }

    pub fn get(&self, device_id: &str) -> Result<Arc<DeviceAcquirer>, AcquisitionError> {
        self.devices
            .get(device_id)
            .cloned()
            .ok_or_else(|| AcquisitionError::UnknownDevice(device_id.to_string()))
    }

    /// 注册顺序的设备 ID。
    pub fn device_ids(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// 按注册顺序遍历采集器。
    pub fn iter(&self) -> impl Iterator<Item = &Arc<DeviceAcquirer>> {
        self.order.iter().filter_map(|id| self.devices.get(id))
    }

    /// 对每台设备并发调用 `refresh_if_due`（每台设备一个任务），结果按注册顺序返回。
    ///
    /// 刷新任务 panic 的设备记录告警并从结果中省略，其余设备不受影响。
    pub async fn refresh_all(&self, now: Instant) -> Vec<(String, RefreshOutcome)> {
        let mut tasks = JoinSet::new();
        for (position, acquirer) in self.iter().enumerate() {
            let acquirer = Arc::clone(acquirer);
            tasks.spawn(async move { (position, acquirer.refresh_if_due(now).await) });
        }

        let mut outcomes = Vec::with_capacity(self.order.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => outcomes.push(outcome),
                Err(err) => warn!(error = %err, "device refresh task failed"),
            }
        }
        outcomes.sort_by_key(|(position, _)| *position);
        if outcomes.len() < self.order.len() {
            // 任务 panic 的设备不出现在结果中
            for (position, device_id) in self.order.iter().enumerate() {
                if !outcomes.iter().any(|(done, _)| *done == position) {
                    warn!(device_id = %device_id, "device refresh produced no outcome");
                }
            }
        }
        outcomes
            .into_iter()
            .map(|(position, outcome)| (self.order[position].clone(), outcome))
            .collect()
    }

    /// 查询入口：按需刷新（受节流约束）后返回快照。
    pub async fn get_snapshot(
        &self,
        device_id: &str,
        now: Instant,
    ) -> Result<Vec<MeasurementSnapshot>, AcquisitionError> {
        let acquirer = self.get(device_id)?;
        acquirer.refresh_if_due(now).await;
        Ok(acquirer.snapshot(now))
    }
}
