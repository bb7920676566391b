//! 测量值缩放与显示格式
//!
//! `k != 1` 时显示值为 `round(raw * k, decimals)`，其中
//! `decimals = len(str(int(1 / k))) - 1`：对 `1/k` 向零截断取整后，
//! 取其十进制文本（负数带 `-`）的长度减一。
//! 该规则对非 10 的幂的 k 会得到不直观的精度（k = 0.3 → 0 位小数），按原样保留。
//! `k == 1` 时直接输出原始整数。

use crate::register_map::RegisterMapError;

/// 缩放系数 k 及由其派生的小数位数。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleFactor {
    k: f64,
    decimals: Option<usize>,
}

impl Default for ScaleFactor {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl ScaleFactor {
    pub const IDENTITY: Self = Self {
        k: 1.0,
        decimals: None,
    };

    pub fn new(k: f64) -> Result<Self, RegisterMapError> {
        if k == 1.0 {
            return Ok(Self::IDENTITY);
        }
        if !k.is_finite() || k == 0.0 {
            return Err(RegisterMapError::InvalidScale(k));
        }
        let reciprocal = 1.0 / k;
        if !reciprocal.is_finite() {
            return Err(RegisterMapError::InvalidScale(k));
        }
        Ok(Self {
            k,
            decimals: Some(truncated_len(reciprocal) - 1),
        })
    }

    pub fn k(&self) -> f64 {
        self.k
    }

    /// 显示精度；`None` 表示不缩放、不取整。
    pub fn decimals(&self) -> Option<usize> {
        self.decimals
    }

    /// 生成原始值的显示文本。
    pub fn render(&self, raw: i64) -> String {
        match self.decimals {
            None => raw.to_string(),
            Some(decimals) => format_float(round_to(raw as f64 * self.k, decimals)),
        }
    }
}

/// `int(x)` 的十进制文本长度。
fn truncated_len(value: f64) -> usize {
    let truncated = value.trunc();
    if truncated == 0.0 {
        return 1;
    }
    // `{:.0}` 输出整数部分的精确十进制展开
    format!("{:.0}", truncated).len()
}

/// 按十进制精确取整（经文本往返，避免 `x * 10^n` 的二进制误差）。
fn round_to(value: f64, decimals: usize) -> f64 {
    if !value.is_finite() {
        return value;
    }
    format!("{:.*}", decimals, value)
        .parse::<f64>()
        .unwrap_or(value)
}

/// 最短往返浮点文本，整数值保留 `.0`，极大/极小值使用 `1e+16` 形式的指数记法。
fn format_float(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let magnitude = value.abs();
    if magnitude != 0.0 && !(1e-4..1e16).contains(&magnitude) {
        let text = format!("{:e}", value);
        return match text.split_once('e') {
            Some((mantissa, exponent)) => {
                let (sign, digits) = match exponent.strip_prefix('-') {
                    Some(digits) => ('-', digits),
                    None => ('+', exponent),
                };
                format!("{}e{}{:0>2}", mantissa, sign, digits)
            }
            None => text,
        };
    }

    let text = value.to_string();
    if text.contains('.') {
        text
    } else {
        format!("{}.0", text)
    }
}
