//! 采集核心共享的领域模型：寄存器映射、缩放规则与设备地址。

pub mod register_map;
pub mod scale;
pub mod target;

pub use register_map::{
    BlockSpec, FieldSpec, FunctionCode, RegisterKind, RegisterMap, RegisterMapError,
};
pub use scale::ScaleFactor;
pub use target::{DEFAULT_MODBUS_PORT, DeviceTarget, InvalidTarget};
