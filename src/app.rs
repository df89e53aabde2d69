//! 引擎装配：把工作池、账号租约池与指纹签发器接成一条执行链

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use fleet_account::{AccountLeasePool, AccountPoolStats, AccountStore};
use fleet_core::{
    Account, AccountId, Capability, DeliveryExecutor, ExecutionContext, Fingerprint,
    FingerprintId, FleetError, FleetResult, Priority, ProfileClass, SharedClock, Task,
    TaskExecutor, TaskSpec, WorkerId,
};
use fleet_fingerprint::{FingerprintIssuer, IssuerStats};
use fleet_worker::{PoolStats, TaskHandle, WorkerPool};

use crate::config::FleetConfig;

/// 账号租用的重试次数与间隔
const ACQUIRE_ATTEMPTS: usize = 3;
const ACQUIRE_RETRY_DELAY: Duration = Duration::from_millis(100);

/// 引擎聚合统计
#[derive(Debug, Clone, Serialize)]
pub struct EngineStats {
    pub worker: PoolStats,
    pub account: AccountPoolStats,
    pub fingerprint: IssuerStats,
}

/// 投放编排引擎
///
/// 持有三个组件并负责装配。任务的执行链在 [`LeasedExecutor`] 中：
/// 租账号、附指纹、执行、归还。
pub struct FleetEngine {
    pool: WorkerPool,
    accounts: Arc<AccountLeasePool>,
    fingerprints: Arc<FingerprintIssuer>,
}

impl std::fmt::Debug for FleetEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FleetEngine").finish_non_exhaustive()
    }
}

impl FleetEngine {
    pub fn new(
        config: FleetConfig,
        delivery: Arc<dyn DeliveryExecutor>,
        clock: SharedClock,
    ) -> FleetResult<Self> {
        config.validate()?;
        let store = Arc::new(AccountStore::new(clock.clone()));
        let accounts = Arc::new(AccountLeasePool::new(
            store,
            config.account.clone(),
            clock.clone(),
        ));
        let fingerprints = Arc::new(FingerprintIssuer::new(
            config.fingerprint.clone(),
            clock.clone(),
        ));
        let executor = Arc::new(LeasedExecutor {
            accounts: accounts.clone(),
            fingerprints: fingerprints.clone(),
            delivery,
            bindings: Mutex::new(HashMap::new()),
        });
        let pool = WorkerPool::new(config.worker, executor, clock)?;
        info!("引擎装配完成");
        Ok(Self {
            pool,
            accounts,
            fingerprints,
        })
    }

    pub async fn start(&self) -> FleetResult<()> {
        self.pool.start().await
    }

    pub async fn submit(
        &self,
        capability: Capability,
        priority: Priority,
        payload: serde_json::Value,
    ) -> FleetResult<TaskHandle> {
        self.pool.submit(capability, priority, payload).await
    }

    pub async fn submit_batch(&self, specs: Vec<TaskSpec>) -> FleetResult<Vec<TaskHandle>> {
        self.pool.submit_batch(specs).await
    }

    pub async fn stop(&self) {
        self.pool.stop().await;
    }

    pub async fn emergency_stop(&self) {
        self.pool.emergency_stop().await;
    }

    pub async fn stats(&self) -> EngineStats {
        EngineStats {
            worker: self.pool.stats().await,
            account: self.accounts.stats().await,
            fingerprint: self.fingerprints.stats().await,
        }
    }

    /// 账号租约池，用于注册账号、打标签、导入导出
    pub fn accounts(&self) -> &Arc<AccountLeasePool> {
        &self.accounts
    }

    pub fn fingerprints(&self) -> &Arc<FingerprintIssuer> {
        &self.fingerprints
    }
}

/// 工作池与资源组件之间的执行适配器
///
/// 每个任务：租账号（有限重试）、为账号取一个有效指纹（过期即轮换）、
/// 组装上下文交给投放实现、按成败归还账号。
struct LeasedExecutor {
    accounts: Arc<AccountLeasePool>,
    fingerprints: Arc<FingerprintIssuer>,
    delivery: Arc<dyn DeliveryExecutor>,
    /// 账号与指纹的当前绑定，保持同一账号的身份连续
    bindings: Mutex<HashMap<AccountId, FingerprintId>>,
}

#[async_trait]
impl TaskExecutor for LeasedExecutor {
    async fn execute(&self, task: Task, worker_id: WorkerId) -> FleetResult<serde_json::Value> {
        let account = self.acquire_account(&worker_id).await?;
        let account_id = account.id.clone();
        let result = self.deliver_with(task, worker_id, account).await;

        let released = self.accounts.release(&account_id, result.is_ok()).await;
        if let Err(err) = released {
            warn!(account_id = %account_id, %err, "归还账号失败");
            if result.is_ok() {
                return Err(err);
            }
        }
        result
    }
}

impl LeasedExecutor {
    async fn acquire_account(&self, worker_id: &str) -> FleetResult<Account> {
        for attempt in 0..ACQUIRE_ATTEMPTS {
            if let Some(account) = self.accounts.acquire(worker_id, None).await? {
                return Ok(account);
            }
            if attempt + 1 < ACQUIRE_ATTEMPTS {
                tokio::time::sleep(ACQUIRE_RETRY_DELAY).await;
            }
        }
        Err(FleetError::resource_exhausted("无可租用账号"))
    }

    async fn deliver_with(
        &self,
        task: Task,
        worker_id: WorkerId,
        account: Account,
    ) -> FleetResult<serde_json::Value> {
        let fingerprint = self
            .fingerprint_for(&account.id, class_for(task.capability))
            .await?;
        let headers = self.fingerprints.headers_for(fingerprint.id).await?;
        let cookies = self.fingerprints.cookies_for(fingerprint.id).await?;
        let ctx = ExecutionContext {
            task,
            worker_id,
            account,
            fingerprint,
            headers,
            cookies,
        };
        self.delivery.deliver(&ctx).await
    }

    /// 取账号当前绑定的指纹；未绑定或已失效时签发新的
    async fn fingerprint_for(
        &self,
        account_id: &str,
        class: ProfileClass,
    ) -> FleetResult<Fingerprint> {
        let mut bindings = self.bindings.lock().await;
        if let Some(&bound) = bindings.get(account_id) {
            if self.fingerprints.validate(bound).await {
                if let Some(fp) = self.fingerprints.get(bound).await {
                    return Ok(fp);
                }
            }
            debug!(account_id, fingerprint_id = %bound, "指纹失效，轮换");
            let replacement = self.fingerprints.rotate(bound).await?;
            bindings.insert(account_id.to_string(), replacement.id);
            return Ok(replacement);
        }
        let fresh = self.fingerprints.create(class).await?;
        bindings.insert(account_id.to_string(), fresh.id);
        Ok(fresh)
    }
}

/// 任务能力决定指纹档位
fn class_for(capability: Capability) -> ProfileClass {
    match capability {
        Capability::Mobile => ProfileClass::Mobile,
        Capability::Browser | Capability::Organic | Capability::HighQuality => {
            ProfileClass::Desktop
        }
        _ => ProfileClass::Balanced,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_follows_capability() {
        assert_eq!(class_for(Capability::Mobile), ProfileClass::Mobile);
        assert_eq!(class_for(Capability::Organic), ProfileClass::Desktop);
        assert_eq!(class_for(Capability::Any), ProfileClass::Balanced);
        assert_eq!(class_for(Capability::Bulk), ProfileClass::Balanced);
    }
}
