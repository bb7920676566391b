//! 块读取接口

use crate::error::ProtocolError;
use async_trait::async_trait;
use domain::FunctionCode;

/// 寄存器块读取器
///
/// 一次调用读取 `[start, start + quantity)` 全部寄存器，并按 `layout`
/// （`>` 加每个寄存器一个 `h`/`H` 标记）解码为整数序列。
/// 每次调用自带超时，超时以 `ProtocolError::Timeout` 返回；重连由实现自行负责。
#[async_trait]
pub trait BlockReader: Send {
    async fn read_block(
        &mut self,
        unit_id: u8,
        function_code: FunctionCode,
        start: u16,
        quantity: u16,
        layout: &str,
    ) -> Result<Vec<i64>, ProtocolError>;
}
