//! # 协议通信能力模块
//!
//! 采集核心只依赖一个原语：按块读取一段连续寄存器，并按布局串解码为整数序列。
//!
//! ```text
//! DeviceAcquirer
//!       │  read_block(unit_id, function_code, start, quantity, layout)
//!       ▼
//! BlockReader (trait)
//!       │
//!       └── ModbusTcpClient (tokio-modbus)
//!              │
//!              ▼
//!        decode_layout(">hhH...", registers) → Vec<i64>
//! ```
//!
//! ## 错误分类
//!
//! - `ProtocolError::Timeout`：单次块读取超过超时时间
//! - 其余变体：连接失败、异常响应、响应长度不符等

mod client;
mod error;
mod layout;
mod modbus_tcp;

pub use client::BlockReader;
pub use error::ProtocolError;
pub use layout::{decode_layout, parse_layout};
pub use modbus_tcp::{ModbusTcpClient, ModbusTcpConfig};
