use std::collections::{HashMap, HashSet};

use sha2::{Digest, Sha256};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use fleet_core::{
    Account, AccountId, AccountSnapshotStore, AccountState, Credentials, FleetError, FleetResult,
    SharedClock,
};

/// 账号注册表
///
/// 进程内的账号登记处：增删账号、标签管理、JSON批量导入导出与聚合统计。
/// 租约语义不在这一层，见 [`crate::AccountLeasePool`]。
pub struct AccountStore {
    accounts: RwLock<HashMap<AccountId, Account>>,
    clock: SharedClock,
}

/// 账号聚合统计
#[derive(Debug, Clone, serde::Serialize)]
pub struct AccountStoreStats {
    pub total: usize,
    pub available: usize,
    pub leased: usize,
    pub cooling_down: usize,
    pub banned: usize,
    pub total_uses: u64,
    pub total_success: u64,
    pub total_fail: u64,
    /// 全量成功率，无使用记录时为0
    pub success_rate: f64,
}

impl AccountStore {
    pub fn new(clock: SharedClock) -> Self {
        Self {
            accounts: RwLock::new(HashMap::new()),
            clock,
        }
    }

    /// 登记新账号，ID由用户名和邮箱确定性推导
    pub async fn add(&self, credentials: Credentials, tags: Vec<String>) -> FleetResult<AccountId> {
        let id = derive_account_id(&credentials);
        let mut accounts = self.accounts.write().await;
        if accounts.contains_key(&id) {
            return Err(FleetError::invalid_transition(format!(
                "账号已存在: {id}"
            )));
        }
        let account = Account::new(id.clone(), credentials, tags, self.clock.now());
        debug!(account_id = %id, "登记新账号");
        accounts.insert(id.clone(), account);
        Ok(id)
    }

    pub async fn get(&self, id: &str) -> Option<Account> {
        self.accounts.read().await.get(id).cloned()
    }

    /// 注销账号（管理操作；生命周期内的状态流转不走这里）
    pub async fn remove(&self, id: &str) -> FleetResult<Account> {
        let mut accounts = self.accounts.write().await;
        let removed = accounts
            .remove(id)
            .ok_or_else(|| FleetError::account_not_found(id))?;
        info!(account_id = %id, "账号已注销");
        Ok(removed)
    }

    /// 修改账号，闭包在写锁内执行
    pub async fn update<F>(&self, id: &str, f: F) -> FleetResult<Account>
    where
        F: FnOnce(&mut Account),
    {
        let mut accounts = self.accounts.write().await;
        let account = accounts
            .get_mut(id)
            .ok_or_else(|| FleetError::account_not_found(id))?;
        f(account);
        Ok(account.clone())
    }

    pub async fn add_tag(&self, id: &str, tag: &str) -> FleetResult<()> {
        self.update(id, |acc| {
            if !acc.tags.iter().any(|t| t == tag) {
                acc.tags.push(tag.to_string());
            }
        })
        .await
        .map(|_| ())
    }

    pub async fn remove_tag(&self, id: &str, tag: &str) -> FleetResult<()> {
        self.update(id, |acc| acc.tags.retain(|t| t != tag))
            .await
            .map(|_| ())
    }

    pub async fn update_cookies(
        &self,
        id: &str,
        cookies: HashMap<String, String>,
    ) -> FleetResult<()> {
        self.update(id, |acc| acc.cookies = cookies).await.map(|_| ())
    }

    /// 此刻可租用的账号，按（使用次数，最近使用时间）升序排列
    ///
    /// 排在最前的是最久未被使用的账号。`exclude` 为进程内已租出集合。
    pub async fn list_acquirable(
        &self,
        tags: Option<&[String]>,
        exclude: &HashSet<AccountId>,
    ) -> Vec<Account> {
        let now = self.clock.now();
        let accounts = self.accounts.read().await;
        let mut result: Vec<Account> = accounts
            .values()
            .filter(|acc| acc.is_acquirable(now))
            .filter(|acc| !exclude.contains(&acc.id))
            .filter(|acc| match tags {
                Some(tags) => acc.matches_tags(tags),
                None => true,
            })
            .cloned()
            .collect();
        result.sort_by(|a, b| {
            a.use_count
                .cmp(&b.use_count)
                .then(a.last_used_at.cmp(&b.last_used_at))
        });
        result
    }

    /// 未封禁但当前不可租用的账号（冷却中或已租出），rotate 的回退来源
    pub async fn list_cooling(&self, tags: Option<&[String]>) -> Vec<Account> {
        let now = self.clock.now();
        let accounts = self.accounts.read().await;
        let mut result: Vec<Account> = accounts
            .values()
            .filter(|acc| !acc.is_banned() && !acc.is_acquirable(now))
            .filter(|acc| acc.state != AccountState::Leased)
            .filter(|acc| match tags {
                Some(tags) => acc.matches_tags(tags),
                None => true,
            })
            .cloned()
            .collect();
        result.sort_by(|a, b| a.cooldown_until.cmp(&b.cooldown_until));
        result
    }

    pub async fn all(&self) -> Vec<Account> {
        self.accounts.read().await.values().cloned().collect()
    }

    /// JSON批量导入，跳过已存在的账号，返回导入条数
    pub async fn import_json(&self, data: &str) -> FleetResult<usize> {
        #[derive(serde::Deserialize)]
        struct ImportRecord {
            #[serde(flatten)]
            credentials: Credentials,
            #[serde(default)]
            tags: Vec<String>,
        }

        let records: Vec<ImportRecord> = serde_json::from_str(data)?;
        let mut imported = 0;
        for record in records {
            match self.add(record.credentials, record.tags).await {
                Ok(_) => imported += 1,
                Err(FleetError::InvalidTransition(msg)) => {
                    warn!("跳过重复账号: {msg}");
                }
                Err(e) => return Err(e),
            }
        }
        info!(imported, "账号批量导入完成");
        Ok(imported)
    }

    /// 导出全部账号为JSON
    pub async fn export_json(&self) -> FleetResult<String> {
        let accounts = self.all().await;
        Ok(serde_json::to_string_pretty(&accounts)?)
    }

    pub async fn stats(&self) -> AccountStoreStats {
        let now = self.clock.now();
        let accounts = self.accounts.read().await;
        let mut stats = AccountStoreStats {
            total: accounts.len(),
            available: 0,
            leased: 0,
            cooling_down: 0,
            banned: 0,
            total_uses: 0,
            total_success: 0,
            total_fail: 0,
            success_rate: 0.0,
        };
        for acc in accounts.values() {
            match acc.state {
                AccountState::Available => stats.available += 1,
                AccountState::Leased => stats.leased += 1,
                AccountState::CoolingDown => {
                    // 冷却到期视作可用
                    if acc.cooldown_elapsed(now) {
                        stats.available += 1;
                    } else {
                        stats.cooling_down += 1;
                    }
                }
                AccountState::Banned => stats.banned += 1,
            }
            stats.total_uses += acc.use_count;
            stats.total_success += acc.success_count;
            stats.total_fail += acc.fail_count;
        }
        if stats.total_uses > 0 {
            stats.success_rate = stats.total_success as f64 / stats.total_uses as f64;
        }
        stats
    }

    /// 通过持久化协作者保存快照
    pub async fn save_snapshot(&self, store: &dyn AccountSnapshotStore) -> FleetResult<()> {
        let accounts = self.all().await;
        store.save(&accounts).await
    }

    /// 从持久化协作者恢复账号；进行中的租约状态还原为可用
    pub async fn load_snapshot(&self, store: &dyn AccountSnapshotStore) -> FleetResult<usize> {
        let loaded = store.load().await?;
        let count = loaded.len();
        let mut accounts = self.accounts.write().await;
        for mut acc in loaded {
            if acc.state == AccountState::Leased {
                acc.state = AccountState::Available;
            }
            accounts.insert(acc.id.clone(), acc);
        }
        info!(count, "账号快照加载完成");
        Ok(count)
    }
}

/// 由凭据确定性推导账号ID（摘要前8位十六进制）
fn derive_account_id(credentials: &Credentials) -> AccountId {
    let mut hasher = Sha256::new();
    hasher.update(credentials.username.as_bytes());
    if let Some(email) = &credentials.email {
        hasher.update(email.as_bytes());
    }
    let digest = hasher.finalize();
    format!("{digest:x}")[..8].to_string()
}
