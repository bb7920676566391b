//! 寄存器映射模型
//!
//! 一台设备的映射由若干寄存器块组成，每个块在一次协议调用中整体读取，
//! 然后按字段地址切分为命名测量值：
//!
//! ```text
//! RegisterMap
//!   ├── BlockSpec (fc=4, start=154, count=23, layout=">hhh...h")
//!   │     ├── FieldSpec extruder @154
//!   │     ├── FieldSpec pulling  @165
//!   │     └── FieldSpec t1       @175
//!   └── BlockSpec ...
//! ```

use crate::scale::ScaleFactor;
use std::collections::HashSet;

/// 寄存器映射构建错误。
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RegisterMapError {
    #[error("invalid block at {start}: {reason}")]
    InvalidBlock { start: u16, reason: String },
    #[error("field {field_id} address {address} outside block [{start}, {end})")]
    AddressOutOfBlock {
        field_id: String,
        address: u16,
        start: u16,
        end: u32,
    },
    #[error("conflicting register kinds at address {0}")]
    ConflictingKind(u16),
    #[error("duplicate field id: {0}")]
    DuplicateField(String),
    #[error("invalid scale factor: {0}")]
    InvalidScale(f64),
}

/// 单个寄存器的解码方式（大端，16 位）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterKind {
    /// 16 位有符号整数（`h`）
    Int16,
    /// 16 位无符号整数（`H`）
    Uint16,
}

impl Default for RegisterKind {
    fn default() -> Self {
        Self::Int16
    }
}

impl RegisterKind {
    /// 布局串中的标记字符。
    pub fn token(self) -> char {
        match self {
            Self::Int16 => 'h',
            Self::Uint16 => 'H',
        }
    }

    pub fn from_token(token: char) -> Option<Self> {
        match token {
            'h' => Some(Self::Int16),
            'H' => Some(Self::Uint16),
            _ => None,
        }
    }

    /// 将原始寄存器字解码为整数值。
    pub fn decode(self, register: u16) -> i64 {
        match self {
            Self::Int16 => i64::from(register as i16),
            Self::Uint16 => i64::from(register),
        }
    }

    /// 判断数值是否落在该类型的取值范围内。
    pub fn contains(self, value: i64) -> bool {
        match self {
            Self::Int16 => i16::try_from(value).is_ok(),
            Self::Uint16 => u16::try_from(value).is_ok(),
        }
    }
}

/// Modbus 读寄存器功能码
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionCode {
    /// 读保持寄存器 (0x03)
    ReadHoldingRegisters = 3,
    /// 读输入寄存器 (0x04)
    ReadInputRegisters = 4,
}

impl FunctionCode {
    pub fn code(self) -> u8 {
        self as u8
    }
}

/// 字段定义：一个命名测量值在寄存器空间中的位置与解释方式。
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    id: String,
    name: String,
    address: u16,
    kind: RegisterKind,
    scale: ScaleFactor,
}

impl FieldSpec {
    /// 创建字段（默认 `Int16`、k = 1）。
    pub fn new(id: impl Into<String>, name: impl Into<String>, address: u16) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            address,
            kind: RegisterKind::default(),
            scale: ScaleFactor::default(),
        }
    }

    pub fn with_kind(mut self, kind: RegisterKind) -> Self {
        self.kind = kind;
        self
    }

    /// 设置缩放系数；k 为 0、非有限值或倒数溢出时报错。
    pub fn with_scale(mut self, k: f64) -> Result<Self, RegisterMapError> {
        self.scale = ScaleFactor::new(k)?;
        Ok(self)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> u16 {
        self.address
    }

    pub fn kind(&self) -> RegisterKind {
        self.kind
    }

    pub fn scale(&self) -> ScaleFactor {
        self.scale
    }
}

/// 寄存器块：一次协议调用读取的连续寄存器区间。
#[derive(Debug, Clone, PartialEq)]
pub struct BlockSpec {
    function_code: FunctionCode,
    start: u16,
    count: u16,
    fields: Vec<FieldSpec>,
    layout: String,
}

impl BlockSpec {
    /// 校验字段地址并生成整块布局串。
    ///
    /// 布局串为 `>` 加每个寄存器一个标记；未被字段使用的填充寄存器按 `h` 读取。
    pub fn new(
        function_code: FunctionCode,
        start: u16,
        count: u16,
        fields: Vec<FieldSpec>,
    ) -> Result<Self, RegisterMapError> {
        if count == 0 {
            return Err(RegisterMapError::InvalidBlock {
                start,
                reason: "register count must be positive".to_string(),
            });
        }
        let end = u32::from(start) + u32::from(count);
        if end > u32::from(u16::MAX) + 1 {
            return Err(RegisterMapError::InvalidBlock {
                start,
                reason: format!("block end {} exceeds register space", end),
            });
        }

        let mut kinds: Vec<Option<RegisterKind>> = vec![None; usize::from(count)];
        for field in &fields {
            if field.address < start || u32::from(field.address) >= end {
                return Err(RegisterMapError::AddressOutOfBlock {
                    field_id: field.id.clone(),
                    address: field.address,
                    start,
                    end,
                });
            }
            let slot = &mut kinds[usize::from(field.address - start)];
            match slot {
                Some(existing) if *existing != field.kind => {
                    return Err(RegisterMapError::ConflictingKind(field.address));
                }
                _ => *slot = Some(field.kind),
            }
        }

        let mut layout = String::with_capacity(kinds.len() + 1);
        layout.push('>');
        for kind in kinds {
            layout.push(kind.unwrap_or_default().token());
        }

        Ok(Self {
            function_code,
            start,
            count,
            fields,
            layout,
        })
    }

    pub fn function_code(&self) -> FunctionCode {
        self.function_code
    }

    pub fn start(&self) -> u16 {
        self.start
    }

    pub fn count(&self) -> u16 {
        self.count
    }

    /// 区间右端（不含）。
    pub fn end(&self) -> u32 {
        u32::from(self.start) + u32::from(self.count)
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn layout(&self) -> &str {
        &self.layout
    }

    /// 字段在解码结果中的位置（`address - start`）。
    pub fn offset_of(&self, field: &FieldSpec) -> usize {
        usize::from(field.address.wrapping_sub(self.start))
    }
}

/// 一台设备的完整寄存器映射。
#[derive(Debug, Clone, PartialEq)]
pub struct RegisterMap {
    blocks: Vec<BlockSpec>,
}

impl RegisterMap {
    /// 构建映射；字段 ID 在整张映射内必须唯一（所有块共享一个缓存）。
    pub fn new(blocks: Vec<BlockSpec>) -> Result<Self, RegisterMapError> {
        let mut seen = HashSet::new();
        for field in blocks.iter().flat_map(|block| block.fields.iter()) {
            if !seen.insert(field.id.as_str()) {
                return Err(RegisterMapError::DuplicateField(field.id.clone()));
            }
        }
        Ok(Self { blocks })
    }

    pub fn blocks(&self) -> &[BlockSpec] {
        &self.blocks
    }

    /// 按映射顺序遍历全部字段。
    pub fn fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.blocks.iter().flat_map(|block| block.fields.iter())
    }

    pub fn field_count(&self) -> usize {
        self.blocks.iter().map(|block| block.fields.len()).sum()
    }

    pub fn find_field(&self, field_id: &str) -> Option<&FieldSpec> {
        self.fields().find(|field| field.id == field_id)
    }
}
