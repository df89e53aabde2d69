//! # 可注入时钟
//!
//! 监控、冷却与TTL逻辑全部通过 [`Clock`] 取时间，
//! 测试中用 [`ManualClock`] 手动推进即可同步地验证周期性逻辑。

use std::sync::{Arc, RwLock};

use chrono::{DateTime, Duration, Utc};

/// 时钟抽象
pub trait Clock: Send + Sync {
    /// 获取当前UTC时间
    fn now(&self) -> DateTime<Utc>;
}

pub type SharedClock = Arc<dyn Clock>;

/// 系统时钟
#[derive(Debug, Default, Clone)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// 手动推进的时钟，用于确定性测试
pub struct ManualClock {
    now: RwLock<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: RwLock::new(start),
        }
    }

    /// 从当前系统时间开始
    pub fn starting_now() -> Self {
        Self::new(Utc::now())
    }

    /// 推进时钟
    pub fn advance(&self, duration: Duration) {
        let mut now = self.now.write().expect("manual clock lock poisoned");
        *now = *now + duration;
    }

    /// 设置绝对时间
    pub fn set(&self, at: DateTime<Utc>) {
        let mut now = self.now.write().expect("manual clock lock poisoned");
        *now = at;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.read().expect("manual clock lock poisoned")
    }
}
