use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::FingerprintId;

/// 指纹档位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileClass {
    Mobile,
    Desktop,
    Balanced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    Mobile,
    Tablet,
    Desktop,
}

/// 设备子档案
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceProfile {
    pub device_type: DeviceType,
    pub brand: String,
    pub model: String,
    pub os_name: String,
    pub os_version: String,
    pub screen_width: u32,
    pub screen_height: u32,
    pub device_pixel_ratio: u8,
    pub touch_support: bool,
}

impl DeviceProfile {
    pub fn is_mobile(&self) -> bool {
        matches!(self.device_type, DeviceType::Mobile | DeviceType::Tablet)
    }
}

/// 浏览器子档案
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserProfile {
    pub name: String,
    pub version: String,
    pub user_agent: String,
    pub language: String,
    pub platform: String,
    pub hardware_concurrency: u8,
    pub device_memory_gb: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionType {
    Wifi,
    Cellular4g,
    Cellular3g,
    Ethernet,
}

/// 网络子档案
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkProfile {
    pub connection: ConnectionType,
    pub downlink_mbps: f64,
    pub rtt_ms: u32,
    pub save_data: bool,
}

/// 行为子档案
///
/// 参数化的人类行为模板：滚动速度、点击延迟、观看时长倍率与互动概率。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BehaviorProfile {
    pub name: String,
    pub scroll_speed: f64,
    pub click_delay_secs: f64,
    pub watch_time_multiplier: f64,
    pub interaction_probability: f64,
}

/// 合成客户端身份指纹
///
/// 签发后不可变，只能被新指纹取代。超过TTL后不再用于新请求，
/// 已在途的使用不受影响。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fingerprint {
    pub id: FingerprintId,
    pub class: ProfileClass,
    pub device: DeviceProfile,
    pub browser: BrowserProfile,
    pub network: NetworkProfile,
    pub behavior: BehaviorProfile,
    /// 档案内容的sha256摘要（十六进制）
    pub digest: String,
    pub created_at: DateTime<Utc>,
    pub invalidated: bool,
}

impl Fingerprint {
    /// 指纹年龄（小时）
    pub fn age_hours(&self, now: DateTime<Utc>) -> f64 {
        (now - self.created_at).num_seconds() as f64 / 3600.0
    }
}
