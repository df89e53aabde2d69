use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::AccountId;

/// 账号凭据
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub device_id: Option<String>,
    #[serde(default)]
    pub proxy: Option<String>,
}

/// 账号生命周期状态
///
/// `Banned` 是终态，任何状态都可以显式转入且不可恢复。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountState {
    Available,
    Leased,
    CoolingDown,
    Banned,
}

/// 共享账号资源
///
/// 软生命周期：池永远不会物理删除账号，只做状态流转。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub credentials: Credentials,
    pub state: AccountState,
    pub use_count: u64,
    pub success_count: u64,
    pub fail_count: u64,
    /// 连续失败次数，成功一次即清零；用于可选的自动封禁阈值
    pub consecutive_failures: u32,
    pub cooldown_until: Option<DateTime<Utc>>,
    pub last_used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub tags: Vec<String>,
    #[serde(default)]
    pub cookies: HashMap<String, String>,
}

impl Account {
    pub fn new(id: AccountId, credentials: Credentials, tags: Vec<String>, now: DateTime<Utc>) -> Self {
        Self {
            id,
            credentials,
            state: AccountState::Available,
            use_count: 0,
            success_count: 0,
            fail_count: 0,
            consecutive_failures: 0,
            cooldown_until: None,
            last_used_at: None,
            created_at: now,
            tags,
            cookies: HashMap::new(),
        }
    }

    pub fn is_banned(&self) -> bool {
        self.state == AccountState::Banned
    }

    /// 冷却是否已经结束
    pub fn cooldown_elapsed(&self, now: DateTime<Utc>) -> bool {
        match self.cooldown_until {
            Some(until) => now >= until,
            None => true,
        }
    }

    /// 此刻能否被租用（不考虑进程内已租出集合）
    pub fn is_acquirable(&self, now: DateTime<Utc>) -> bool {
        match self.state {
            AccountState::Available => true,
            AccountState::CoolingDown => self.cooldown_elapsed(now),
            AccountState::Leased | AccountState::Banned => false,
        }
    }

    /// 是否带有任一指定标签
    pub fn matches_tags(&self, tags: &[String]) -> bool {
        tags.is_empty() || tags.iter().any(|t| self.tags.contains(t))
    }
}

/// 租约
///
/// 仅存在于执行期间，不落盘。同一账号同一时刻至多一个活跃租约。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lease {
    pub account_id: AccountId,
    pub holder: String,
    pub acquired_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(now: DateTime<Utc>) -> Account {
        Account::new(
            "acc-1".into(),
            Credentials {
                username: "user1".into(),
                email: None,
                password: None,
                session_id: None,
                device_id: None,
                proxy: None,
            },
            vec!["premium".into()],
            now,
        )
    }

    #[test]
    fn test_fresh_account_is_acquirable() {
        let now = Utc::now();
        assert!(account(now).is_acquirable(now));
    }

    #[test]
    fn test_cooldown_excludes_until_elapsed() {
        let now = Utc::now();
        let mut acc = account(now);
        acc.state = AccountState::CoolingDown;
        acc.cooldown_until = Some(now + chrono::Duration::hours(1));
        assert!(!acc.is_acquirable(now));
        assert!(acc.is_acquirable(now + chrono::Duration::hours(1)));
    }

    #[test]
    fn test_banned_never_acquirable() {
        let now = Utc::now();
        let mut acc = account(now);
        acc.state = AccountState::Banned;
        assert!(!acc.is_acquirable(now + chrono::Duration::days(365)));
    }

    #[test]
    fn test_tag_matching() {
        let acc = account(Utc::now());
        assert!(acc.matches_tags(&[]));
        assert!(acc.matches_tags(&["premium".into(), "other".into()]));
        assert!(!acc.matches_tags(&["other".into()]));
    }
}
