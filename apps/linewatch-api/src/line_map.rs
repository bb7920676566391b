//! 挤出线控制器的寄存器映射
//!
//! 三个块均用功能码 4 读取：
//! - 计数器 @1（无符号）
//! - 挤出机 / 牵引 / Т1 @154..177（k = 0.1）
//! - 区温度 Т2..Т12 @12..114（k = 0.1，每 10 个寄存器一个）

use domain::{BlockSpec, FieldSpec, FunctionCode, RegisterKind, RegisterMap, RegisterMapError};

const TEMPERATURE_SCALE: f64 = 0.1;

fn scaled(id: &str, name: &str, address: u16) -> Result<FieldSpec, RegisterMapError> {
    FieldSpec::new(id, name, address).with_scale(TEMPERATURE_SCALE)
}

/// 构建挤出线映射（两条线共用）。
pub fn extrusion_line_map() -> Result<RegisterMap, RegisterMapError> {
    let counter = BlockSpec::new(
        FunctionCode::ReadInputRegisters,
        1,
        1,
        vec![FieldSpec::new("counter", "Счетчик", 1).with_kind(RegisterKind::Uint16)],
    )?;

    let extruder = BlockSpec::new(
        FunctionCode::ReadInputRegisters,
        154,
        175 - 154 + 2,
        vec![
            scaled("extruder", "Экструдер", 154)?,
            scaled("pulling", "Протяжка", 165)?,
            scaled("t1", "Т1", 175)?,
        ],
    )?;

    // Т2 @112 递减到 Т12 @12
    let zones = (2..=12u16)
        .map(|zone| {
            let address = 112 - (zone - 2) * 10;
            scaled(&format!("t{}", zone), &format!("Т{}", zone), address)
        })
        .collect::<Result<Vec<_>, _>>()?;
    let zones = BlockSpec::new(FunctionCode::ReadInputRegisters, 12, 112 - 12 + 2, zones)?;

    RegisterMap::new(vec![counter, extruder, zones])
}
