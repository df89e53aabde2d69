use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Duration;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use fleet_core::{
    Account, AccountId, AccountState, FleetError, FleetResult, Lease, SharedClock,
};

use crate::store::{AccountStore, AccountStoreStats};

/// 租约池配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountPoolConfig {
    /// 每使用多少次触发一次冷却
    pub cooldown_every_uses: u64,
    /// 冷却时长（秒）
    pub cooldown_secs: i64,
    /// 连续失败达到该次数时自动封禁；None表示不自动封禁
    pub auto_ban_after_failures: Option<u32>,
}

impl Default for AccountPoolConfig {
    fn default() -> Self {
        Self {
            cooldown_every_uses: 10,  // 每10次使用冷却一次
            cooldown_secs: 3600,      // 冷却1小时
            auto_ban_after_failures: None,
        }
    }
}

impl AccountPoolConfig {
    pub fn validate(&self) -> FleetResult<()> {
        if self.cooldown_every_uses == 0 {
            return Err(FleetError::config_error("cooldown_every_uses 必须大于0"));
        }
        if self.cooldown_secs <= 0 {
            return Err(FleetError::config_error("cooldown_secs 必须大于0"));
        }
        if self.auto_ban_after_failures == Some(0) {
            return Err(FleetError::config_error(
                "auto_ban_after_failures 不能为0",
            ));
        }
        Ok(())
    }
}

/// 租约池统计
#[derive(Debug, Clone, Serialize)]
pub struct AccountPoolStats {
    #[serde(flatten)]
    pub store: AccountStoreStats,
    pub active_leases: usize,
}

/// 账号租约池
///
/// 在 [`AccountStore`] 之上维护进程内活跃租约集合：
/// `acquire`/`release` 的状态转换在同一把锁内完成，
/// 两个并发的 `acquire` 不可能拿到同一个账号；
/// 即使底层存储被多个逻辑持有者共享，活跃集合也能阻止重复租用。
pub struct AccountLeasePool {
    store: Arc<AccountStore>,
    config: AccountPoolConfig,
    leases: Mutex<HashMap<AccountId, Lease>>,
    clock: SharedClock,
}

impl AccountLeasePool {
    pub fn new(store: Arc<AccountStore>, config: AccountPoolConfig, clock: SharedClock) -> Self {
        Self {
            store,
            config,
            leases: Mutex::new(HashMap::new()),
            clock,
        }
    }

    pub fn store(&self) -> &Arc<AccountStore> {
        &self.store
    }

    /// 租用一个账号
    ///
    /// 返回最久未使用的可租用账号并将其转为 `Leased`。
    /// 没有符合条件的账号时返回 `Ok(None)` —— 这是正常的背压信号，不是错误。
    pub async fn acquire(
        &self,
        holder: &str,
        tags: Option<&[String]>,
    ) -> FleetResult<Option<Account>> {
        let mut leases = self.leases.lock().await;
        let active: HashSet<AccountId> = leases.keys().cloned().collect();
        let candidates = self.store.list_acquirable(tags, &active).await;

        let Some(candidate) = candidates.into_iter().next() else {
            debug!(holder, "无可用账号");
            return Ok(None);
        };

        let now = self.clock.now();
        let account = self
            .store
            .update(&candidate.id, |acc| {
                acc.state = AccountState::Leased;
                if acc.cooldown_elapsed(now) {
                    acc.cooldown_until = None;
                }
            })
            .await?;
        leases.insert(
            account.id.clone(),
            Lease {
                account_id: account.id.clone(),
                holder: holder.to_string(),
                acquired_at: now,
            },
        );
        debug!(account_id = %account.id, holder, "账号租出");
        Ok(Some(account))
    }

    /// 归还账号并更新使用记录
    ///
    /// 冷却策略：纯粹按使用次数取模触发，没有来自目标服务的任何限流信号，
    /// 是一个已知偏弱的节奏控制，保持原样不做加强。
    pub async fn release(&self, account_id: &str, success: bool) -> FleetResult<()> {
        let mut leases = self.leases.lock().await;
        if leases.remove(account_id).is_none() {
            return Err(FleetError::invalid_transition(format!(
                "归还未租出的账号: {account_id}"
            )));
        }

        let now = self.clock.now();
        let config = self.config.clone();
        let account = self
            .store
            .update(account_id, |acc| {
                acc.use_count += 1;
                acc.last_used_at = Some(now);
                if success {
                    acc.success_count += 1;
                    acc.consecutive_failures = 0;
                } else {
                    acc.fail_count += 1;
                    acc.consecutive_failures += 1;
                }

                let over_ban_threshold = config
                    .auto_ban_after_failures
                    .is_some_and(|limit| acc.consecutive_failures >= limit);
                if over_ban_threshold {
                    acc.state = AccountState::Banned;
                    acc.cooldown_until = None;
                } else if acc.use_count % config.cooldown_every_uses == 0 {
                    acc.state = AccountState::CoolingDown;
                    acc.cooldown_until = Some(now + Duration::seconds(config.cooldown_secs));
                } else {
                    acc.state = AccountState::Available;
                }
            })
            .await?;

        match account.state {
            AccountState::Banned => {
                warn!(account_id, failures = account.consecutive_failures, "账号连续失败，自动封禁");
            }
            AccountState::CoolingDown => {
                debug!(account_id, use_count = account.use_count, "账号进入冷却");
            }
            _ => {}
        }
        Ok(())
    }

    /// 封禁账号（终态，不可恢复）
    ///
    /// 任何状态都允许转入；若存在活跃租约则一并撤销。重复封禁是幂等的。
    pub async fn ban(&self, account_id: &str) -> FleetResult<()> {
        let mut leases = self.leases.lock().await;
        leases.remove(account_id);
        self.store
            .update(account_id, |acc| {
                acc.state = AccountState::Banned;
                acc.cooldown_until = None;
            })
            .await?;
        info!(account_id, "账号已封禁");
        Ok(())
    }

    /// 取出至多 `count` 个互不相同的账号做轮换使用
    ///
    /// 优先完全可用的账号；不足时回退到冷却中的账号，但绝不包含已封禁账号。
    /// 返回的是只读快照，不建立租约。
    pub async fn rotate(&self, count: usize, tags: Option<&[String]>) -> Vec<Account> {
        let leases = self.leases.lock().await;
        let active: HashSet<AccountId> = leases.keys().cloned().collect();
        drop(leases);

        let mut result = self.store.list_acquirable(tags, &active).await;
        result.truncate(count);
        if result.len() < count {
            let seen: HashSet<AccountId> = result.iter().map(|a| a.id.clone()).collect();
            for acc in self.store.list_cooling(tags).await {
                if result.len() >= count {
                    break;
                }
                if !seen.contains(&acc.id) && !active.contains(&acc.id) {
                    result.push(acc);
                }
            }
        }
        result
    }

    pub async fn active_lease_count(&self) -> usize {
        self.leases.lock().await.len()
    }

    pub async fn stats(&self) -> AccountPoolStats {
        AccountPoolStats {
            store: self.store.stats().await,
            active_leases: self.active_lease_count().await,
        }
    }
}
