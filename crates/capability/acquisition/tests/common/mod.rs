#![allow(dead_code)]

use async_trait::async_trait;
use domain::{BlockSpec, DeviceTarget, FieldSpec, FunctionCode, RegisterKind, RegisterMap};
use linewatch_acquisition::DeviceAcquirer;
use linewatch_protocol::{BlockReader, ProtocolError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

/// 脚本化的块响应。
#[derive(Debug, Clone)]
pub enum Scripted {
    Values(Vec<i64>),
    Timeout,
    Fail,
    /// 读取过程中 panic
    Panic,
}

#[derive(Default)]
struct Script {
    responses: HashMap<u16, Scripted>,
    calls: Vec<(u8, FunctionCode, u16)>,
}

/// 测试侧控制句柄：修改响应、统计调用。
#[derive(Clone, Default)]
pub struct ReaderHandle {
    script: Arc<Mutex<Script>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl ReaderHandle {
    pub fn set(&self, start: u16, response: Scripted) {
        self.script
            .lock()
            .expect("script")
            .responses
            .insert(start, response);
    }

    /// 全部块读取调用（按起始地址记录）。
    pub fn calls(&self) -> Vec<u16> {
        self.requests().into_iter().map(|(_, _, start)| start).collect()
    }

    /// 全部块读取调用：(从站地址, 功能码, 起始地址)。
    pub fn requests(&self) -> Vec<(u8, FunctionCode, u16)> {
        self.script.lock().expect("script").calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls().len()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

/// 按起始地址返回预设结果的块读取器，可选每次读取延迟。
pub struct ScriptedReader {
    handle: ReaderHandle,
    delay: Option<Duration>,
    gate: Option<Arc<Notify>>,
}

impl ScriptedReader {
    pub fn new() -> (Self, ReaderHandle) {
        let handle = ReaderHandle::default();
        (
            Self {
                handle: handle.clone(),
                delay: None,
                gate: None,
            },
            handle,
        )
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// 每次读取都等待 `gate` 放行。
    pub fn with_gate(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }
}

#[async_trait]
impl BlockReader for ScriptedReader {
    async fn read_block(
        &mut self,
        unit_id: u8,
        function_code: FunctionCode,
        start: u16,
        quantity: u16,
        layout: &str,
    ) -> Result<Vec<i64>, ProtocolError> {
        assert_eq!(layout.len(), usize::from(quantity) + 1, "layout covers block");
        let current = self.handle.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.handle
            .max_in_flight
            .fetch_max(current, Ordering::SeqCst);

        let response = {
            let mut script = self.handle.script.lock().expect("script");
            script.calls.push((unit_id, function_code, start));
            script.responses.get(&start).cloned()
        };
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.handle.in_flight.fetch_sub(1, Ordering::SeqCst);

        match response {
            Some(Scripted::Values(values)) => Ok(values),
            Some(Scripted::Timeout) => Err(ProtocolError::Timeout(format!("block {}", start))),
            Some(Scripted::Panic) => panic!("reader crashed on block {}", start),
            Some(Scripted::Fail) | None => Err(ProtocolError::Modbus("exception: IllegalDataAddress".to_string())),
        }
    }
}

/// 只有一个 `counter` 字段的映射。
pub fn counter_map() -> Arc<RegisterMap> {
    let block = BlockSpec::new(
        FunctionCode::ReadInputRegisters,
        1,
        1,
        vec![FieldSpec::new("counter", "Счетчик", 1).with_kind(RegisterKind::Uint16)],
    )
    .expect("block");
    Arc::new(RegisterMap::new(vec![block]).expect("map"))
}

/// 三个块：计数器 @1、挤出机温度 @154..177（保持寄存器）、区温度 @12..114。
pub fn line_map() -> Arc<RegisterMap> {
    let scaled = |id: &str, name: &str, address: u16| {
        FieldSpec::new(id, name, address)
            .with_scale(0.1)
            .expect("scale")
    };
    let counter = BlockSpec::new(
        FunctionCode::ReadInputRegisters,
        1,
        1,
        vec![FieldSpec::new("counter", "Счетчик", 1).with_kind(RegisterKind::Uint16)],
    )
    .expect("block");
    let extruder = BlockSpec::new(
        FunctionCode::ReadHoldingRegisters,
        154,
        23,
        vec![
            scaled("extruder", "Экструдер", 154),
            scaled("pulling", "Протяжка", 165),
        ],
    )
    .expect("block");
    let zones = BlockSpec::new(
        FunctionCode::ReadInputRegisters,
        12,
        102,
        vec![scaled("t2", "Т2", 112), scaled("t12", "Т12", 12)],
    )
    .expect("block");
    Arc::new(RegisterMap::new(vec![counter, extruder, zones]).expect("map"))
}

/// 长度为 `len` 的响应，按偏移写入给定值。
pub fn response(len: usize, values: &[(usize, i64)]) -> Scripted {
    let mut registers = vec![0; len];
    for (offset, value) in values {
        registers[*offset] = *value;
    }
    Scripted::Values(registers)
}

pub fn acquirer(
    device_id: &str,
    map: Arc<RegisterMap>,
    reader: ScriptedReader,
    min_period: Duration,
) -> DeviceAcquirer {
    DeviceAcquirer::new(
        device_id,
        DeviceTarget::new("127.0.0.1", 502),
        map,
        Box::new(reader),
    )
    .with_min_period(min_period)
}
