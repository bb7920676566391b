//! 采集错误类型定义

use linewatch_protocol::ProtocolError;

/// 采集错误
///
/// 只有 `UnknownDevice` 会穿过 API 边界，其余错误在设备内部记录后丢弃。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AcquisitionError {
    /// 块读取超时
    #[error("connection timeout: {0}")]
    ConnectionTimeout(String),

    /// 协议错误（异常响应、响应过短、地址越界等）
    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("unknown field: {0}")]
    UnknownField(String),

    #[error("unknown device: {0}")]
    UnknownDevice(String),

    #[error("duplicate device: {0}")]
    DuplicateDevice(String),

    #[error("lock poisoned")]
    LockPoisoned,
}

impl From<ProtocolError> for AcquisitionError {
    fn from(err: ProtocolError) -> Self {
        if err.is_timeout() {
            Self::ConnectionTimeout(err.to_string())
        } else {
            Self::Protocol(err.to_string())
        }
    }
}
