//! 设备连接地址。

use std::fmt;

/// Modbus TCP 默认端口
pub const DEFAULT_MODBUS_PORT: u16 = 502;

/// 设备地址解析错误。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid device target: {0}")]
pub struct InvalidTarget(pub String);

/// 设备连接目标（host + port）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceTarget {
    pub host: String,
    pub port: u16,
}

impl DeviceTarget {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// 解析 `host[:port]`，未写端口时使用 502。
    pub fn parse(value: &str) -> Result<Self, InvalidTarget> {
        let value = value.trim();
        let (host, port) = match value.split_once(':') {
            Some((host, port)) => {
                let port = port
                    .parse::<u16>()
                    .map_err(|_| InvalidTarget(value.to_string()))?;
                (host, port)
            }
            None => (value, DEFAULT_MODBUS_PORT),
        };
        if host.is_empty() {
            return Err(InvalidTarget(value.to_string()));
        }
        Ok(Self::new(host, port))
    }
}

impl fmt::Display for DeviceTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}
