//! Modbus TCP 客户端实现
//!
//! 每台设备独占一个客户端；首次读取时建立连接，传输失败或超时后丢弃连接，
//! 下一次读取自动重连。
//!
//! ## 使用示例
//!
//! ```rust,ignore
//! let config = ModbusTcpConfig::new("192.168.0.15", 502);
//! let mut client = ModbusTcpClient::new(config);
//! let values = client
//!     .read_block(1, FunctionCode::ReadInputRegisters, 154, 23, ">hhh...")
//!     .await?;
//! ```

use crate::client::BlockReader;
use crate::error::ProtocolError;
use crate::layout::decode_layout;
use async_trait::async_trait;
use domain::{DEFAULT_MODBUS_PORT, DeviceTarget, FunctionCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::timeout;
use tokio_modbus::prelude::*;
use tracing::{debug, info, warn};

/// Modbus TCP 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModbusTcpConfig {
    /// Modbus 服务器主机地址
    pub host: String,
    /// Modbus 服务器端口（默认 502）
    #[serde(default = "default_modbus_port")]
    pub port: u16,
    /// 连接超时（毫秒）
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_ms: u64,
    /// 单次块读取超时（毫秒）
    #[serde(default = "default_read_timeout")]
    pub read_timeout_ms: u64,
}

fn default_modbus_port() -> u16 {
    DEFAULT_MODBUS_PORT
}

fn default_connect_timeout() -> u64 {
    500
}

fn default_read_timeout() -> u64 {
    500
}

impl ModbusTcpConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            connect_timeout_ms: default_connect_timeout(),
            read_timeout_ms: default_read_timeout(),
        }
    }

    pub fn from_target(target: &DeviceTarget) -> Self {
        Self::new(target.host.clone(), target.port)
    }

    /// 从 JSON 配置字符串解析
    pub fn from_json(json: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(json).map_err(|e| ProtocolError::ConfigParse(e.to_string()))
    }

    pub fn with_timeouts(mut self, connect_timeout_ms: u64, read_timeout_ms: u64) -> Self {
        self.connect_timeout_ms = connect_timeout_ms;
        self.read_timeout_ms = read_timeout_ms;
        self
    }
}

/// Modbus TCP 块读取客户端
pub struct ModbusTcpClient {
    config: ModbusTcpConfig,
    ctx: Option<tokio_modbus::client::Context>,
}

impl ModbusTcpClient {
    pub fn new(config: ModbusTcpConfig) -> Self {
        Self { config, ctx: None }
    }

    pub fn config(&self) -> &ModbusTcpConfig {
        &self.config
    }

    pub fn is_connected(&self) -> bool {
        self.ctx.is_some()
    }

    /// 解析与建连共用一个连接超时。
    async fn connect(
        config: &ModbusTcpConfig,
    ) -> Result<tokio_modbus::client::Context, ProtocolError> {
        let connect_timeout = Duration::from_millis(config.connect_timeout_ms);
        let host = config.host.as_str();
        let port = config.port;

        let attempt = async {
            let addr = tokio::net::lookup_host((host, port))
                .await?
                .next()
                .ok_or_else(|| {
                    ProtocolError::Connection(format!("no address resolved for {}:{}", host, port))
                })?;
            tcp::connect(addr)
                .await
                .map_err(|e| ProtocolError::Connection(e.to_string()))
        };

        let ctx = timeout(connect_timeout, attempt).await.map_err(|_| {
            ProtocolError::Timeout(format!(
                "connect to {}:{} after {}ms",
                host, port, config.connect_timeout_ms
            ))
        })??;

        info!(host = %host, port = port, "connected to modbus server");
        Ok(ctx)
    }

    /// 读取原始寄存器字
    async fn read_registers(
        &mut self,
        unit_id: u8,
        function_code: FunctionCode,
        start: u16,
        quantity: u16,
    ) -> Result<Vec<u16>, ProtocolError> {
        if self.ctx.is_none() {
            self.ctx = Some(Self::connect(&self.config).await?);
        }
        let read_timeout = Duration::from_millis(self.config.read_timeout_ms);
        let Some(ctx) = self.ctx.as_mut() else {
            return Err(ProtocolError::Connection("not connected".to_string()));
        };
        ctx.set_slave(Slave(unit_id));

        let request = async {
            match function_code {
                FunctionCode::ReadHoldingRegisters => {
                    ctx.read_holding_registers(start, quantity).await
                }
                FunctionCode::ReadInputRegisters => ctx.read_input_registers(start, quantity).await,
            }
        };

        let outcome = timeout(read_timeout, request).await;
        match outcome {
            Err(_) => {
                // 超时后连接状态未知，丢弃以便下次重连
                self.ctx = None;
                Err(ProtocolError::Timeout(format!(
                    "read {} registers at {} after {}ms",
                    quantity, start, self.config.read_timeout_ms
                )))
            }
            Ok(Err(e)) => {
                self.ctx = None;
                warn!(
                    host = %self.config.host,
                    port = self.config.port,
                    error = %e,
                    "modbus transport failed, connection dropped"
                );
                Err(ProtocolError::Modbus(e.to_string()))
            }
            Ok(Ok(Err(exception))) => {
                Err(ProtocolError::Modbus(format!("exception: {:?}", exception)))
            }
            Ok(Ok(Ok(registers))) => Ok(registers),
        }
    }
}

#[async_trait]
impl BlockReader for ModbusTcpClient {
    async fn read_block(
        &mut self,
        unit_id: u8,
        function_code: FunctionCode,
        start: u16,
        quantity: u16,
        layout: &str,
    ) -> Result<Vec<i64>, ProtocolError> {
        let registers = self
            .read_registers(unit_id, function_code, start, quantity)
            .await?;

        debug!(
            slave = unit_id,
            function_code = function_code.code(),
            register = start,
            count = quantity,
            values = ?registers,
            "read modbus registers"
        );

        decode_layout(layout, &registers)
    }
}
