//! # 共享类型定义
//!
//! 包含系统中常用的类型别名、优先级与能力匹配表

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 任务ID类型
pub type TaskId = Uuid;

/// Worker ID类型
pub type WorkerId = String;

/// 账号ID类型
pub type AccountId = String;

/// 指纹ID类型
pub type FingerprintId = Uuid;

/// 优先级枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// 低优先级
    Low = 1,
    /// 普通优先级
    Normal = 2,
    /// 高优先级
    High = 3,
    /// 紧急优先级
    Critical = 4,
}

impl Default for Priority {
    fn default() -> Self {
        Self::Normal
    }
}

/// 任务能力标签
///
/// 每个任务声明自己需要的能力类别，`Any` 通配任意工作者。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Any,
    Browser,
    Organic,
    HighQuality,
    Api,
    Fast,
    Mobile,
    Cloud,
    Bulk,
    Scalable,
    Hybrid,
    Optimal,
}

/// 工作者类型
///
/// 工作者与任务能力之间是多对多的静态匹配关系，见 [`WorkerKind::supports`]。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerKind {
    Browser,
    Api,
    Mobile,
    Cloud,
    Hybrid,
}

impl WorkerKind {
    pub const ALL: [WorkerKind; 5] = [
        WorkerKind::Browser,
        WorkerKind::Api,
        WorkerKind::Mobile,
        WorkerKind::Cloud,
        WorkerKind::Hybrid,
    ];

    /// 静态能力匹配表
    pub fn supports(&self, capability: Capability) -> bool {
        use Capability::*;
        if capability == Any {
            return true;
        }
        match self {
            WorkerKind::Browser => matches!(capability, Browser | Organic | HighQuality),
            WorkerKind::Api => matches!(capability, Api | Fast | Mobile),
            WorkerKind::Mobile => matches!(capability, Mobile | Api | Fast),
            WorkerKind::Cloud => matches!(capability, Cloud | Bulk | Scalable),
            WorkerKind::Hybrid => matches!(capability, Hybrid | Optimal),
        }
    }
}

impl std::fmt::Display for WorkerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkerKind::Browser => write!(f, "browser"),
            WorkerKind::Api => write!(f, "api"),
            WorkerKind::Mobile => write!(f, "mobile"),
            WorkerKind::Cloud => write!(f, "cloud"),
            WorkerKind::Hybrid => write!(f, "hybrid"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_ordering() {
        assert!(Priority::Critical > Priority::High);
        assert!(Priority::High > Priority::Normal);
        assert!(Priority::Normal > Priority::Low);
        assert_eq!(Priority::default(), Priority::Normal);
    }

    #[test]
    fn test_any_matches_every_kind() {
        for kind in WorkerKind::ALL {
            assert!(kind.supports(Capability::Any));
        }
    }

    #[test]
    fn test_compatibility_matrix() {
        assert!(WorkerKind::Browser.supports(Capability::Organic));
        assert!(WorkerKind::Browser.supports(Capability::HighQuality));
        assert!(!WorkerKind::Browser.supports(Capability::Bulk));

        assert!(WorkerKind::Api.supports(Capability::Fast));
        assert!(WorkerKind::Mobile.supports(Capability::Api));
        assert!(WorkerKind::Cloud.supports(Capability::Scalable));
        assert!(!WorkerKind::Cloud.supports(Capability::Organic));

        assert!(WorkerKind::Hybrid.supports(Capability::Optimal));
        assert!(!WorkerKind::Hybrid.supports(Capability::Browser));
    }
}
