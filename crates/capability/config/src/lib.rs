//! 应用运行配置加载。

use domain::DeviceTarget;
use std::env;
use std::time::Duration;

/// 配置加载错误。
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required env: {0}")]
    Missing(String),
    #[error("invalid value for {0}: {1}")]
    Invalid(String, String),
}

/// 单台设备的静态配置。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceConfig {
    pub id: String,
    pub target: DeviceTarget,
    /// 覆盖全局最小刷新周期
    pub min_period: Option<Duration>,
}

impl DeviceConfig {
    pub fn effective_min_period(&self, default: Duration) -> Duration {
        self.min_period.unwrap_or(default)
    }
}

/// 应用运行配置。
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub http_addr: String,
    pub devices: Vec<DeviceConfig>,
    pub min_period: Duration,
    pub read_timeout_ms: u64,
    pub connect_timeout_ms: u64,
    pub poll_enabled: bool,
    pub poll_interval: Duration,
}

impl AppConfig {
    /// 从环境变量读取配置。
    pub fn from_env() -> Result<Self, ConfigError> {
        let http_addr =
            env::var("LINEWATCH_HTTP_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".to_string());
        let devices_spec = env::var("LINEWATCH_DEVICES")
            .map_err(|_| ConfigError::Missing("LINEWATCH_DEVICES".to_string()))?;
        let mut devices = parse_devices(&devices_spec)?;
        for device in &mut devices {
            let key = min_period_env_key(&device.id);
            device.min_period = read_optional_u64(&key)?.map(Duration::from_millis);
        }
        let min_period =
            Duration::from_millis(read_u64_with_default("LINEWATCH_MIN_PERIOD_MS", 500)?);
        let read_timeout_ms = read_u64_with_default("LINEWATCH_READ_TIMEOUT_MS", 500)?;
        let connect_timeout_ms = read_u64_with_default("LINEWATCH_CONNECT_TIMEOUT_MS", 500)?;
        let poll_enabled = read_bool_with_default("LINEWATCH_POLL_ENABLED", false);
        let poll_interval_ms = read_u64_with_default("LINEWATCH_POLL_INTERVAL_MS", 2000)?;
        if poll_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "LINEWATCH_POLL_INTERVAL_MS".to_string(),
                "0".to_string(),
            ));
        }

        Ok(Self {
            http_addr,
            devices,
            min_period,
            read_timeout_ms,
            connect_timeout_ms,
            poll_enabled,
            poll_interval: Duration::from_millis(poll_interval_ms),
        })
    }
}

/// 单台设备最小刷新周期的环境变量名；ID 中非字母数字字符替换为 `_`。
pub fn min_period_env_key(device_id: &str) -> String {
    let id: String = device_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
        .collect();
    format!("LINEWATCH_DEVICE_{}_MIN_PERIOD_MS", id)
}

/// 解析设备列表：`id=host[:port]`，逗号分隔。
pub fn parse_devices(value: &str) -> Result<Vec<DeviceConfig>, ConfigError> {
    let mut devices: Vec<DeviceConfig> = Vec::new();
    for entry in value.split(',').map(str::trim).filter(|entry| !entry.is_empty()) {
        let invalid = || ConfigError::Invalid("LINEWATCH_DEVICES".to_string(), entry.to_string());
        let (id, target) = entry.split_once('=').ok_or_else(invalid)?;
        let id = id.trim();
        if id.is_empty() || devices.iter().any(|device| device.id == id) {
            return Err(invalid());
        }
        let target = DeviceTarget::parse(target).map_err(|_| invalid())?;
        devices.push(DeviceConfig {
            id: id.to_string(),
            target,
            min_period: None,
        });
    }
    if devices.is_empty() {
        return Err(ConfigError::Invalid(
            "LINEWATCH_DEVICES".to_string(),
            value.to_string(),
        ));
    }
    Ok(devices)
}

fn read_u64_with_default(key: &str, default: u64) -> Result<u64, ConfigError> {
    let value = match env::var(key) {
        Ok(value) => value,
        Err(_) => return Ok(default),
    };
    value
        .parse::<u64>()
        .map_err(|_| ConfigError::Invalid(key.to_string(), value))
}

fn read_optional_u64(key: &str) -> Result<Option<u64>, ConfigError> {
    match env::var(key) {
        Ok(value) if value.is_empty() => Ok(None),
        Ok(value) => value
            .parse::<u64>()
            .map(Some)
            .map_err(|_| ConfigError::Invalid(key.to_string(), value)),
        Err(_) => Ok(None),
    }
}

fn read_bool_with_default(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(value) => matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "on"),
        Err(_) => default,
    }
}
