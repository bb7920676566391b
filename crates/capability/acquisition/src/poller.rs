//! 周期轮询任务
//!
//! 与按需刷新共用 `refresh_if_due`，两种触发方式同时开启时仍受同一节流约束。

use crate::registry::AcquirerRegistry;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval};
use tracing::{debug, info};

/// 启动后台轮询，每个周期对全部设备触发一次刷新。
pub fn spawn_poller(registry: Arc<AcquirerRegistry>, period: Duration) -> JoinHandle<()> {
    let period = period.max(Duration::from_millis(1));
    tokio::spawn(async move {
        info!(
            devices = registry.len(),
            period_ms = period.as_millis() as u64,
            "acquisition poller started"
        );
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            // 取 tokio 时钟，与 interval 同源
            let tick = ticker.tick().await;
            let outcomes = registry.refresh_all(tick.into_std()).await;
            let completed = outcomes
                .iter()
                .filter(|(_, outcome)| outcome.is_completed())
                .count();
            debug!(devices = outcomes.len(), completed, "poll tick");
        }
    })
}
