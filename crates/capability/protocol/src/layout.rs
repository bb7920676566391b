//! 布局串解析与寄存器解码

use crate::error::ProtocolError;
use domain::RegisterKind;

/// 解析大端布局串（`>` 加每个寄存器一个 `h`/`H`）。
pub fn parse_layout(layout: &str) -> Result<Vec<RegisterKind>, ProtocolError> {
    let tokens = layout.strip_prefix('>').ok_or_else(|| {
        ProtocolError::DataParse(format!("layout must be big-endian: {}", layout))
    })?;
    tokens
        .chars()
        .map(|token| {
            RegisterKind::from_token(token).ok_or_else(|| {
                ProtocolError::DataParse(format!("unsupported layout token: {}", token))
            })
        })
        .collect()
}

/// 按布局串将寄存器字解码为整数序列，响应长度必须与标记数量一致。
pub fn decode_layout(layout: &str, registers: &[u16]) -> Result<Vec<i64>, ProtocolError> {
    let kinds = parse_layout(layout)?;
    if kinds.len() != registers.len() {
        return Err(ProtocolError::DataParse(format!(
            "expected {} registers, got {}",
            kinds.len(),
            registers.len()
        )));
    }
    Ok(kinds
        .iter()
        .zip(registers)
        .map(|(kind, register)| kind.decode(*register))
        .collect())
}
