use async_trait::async_trait;

use crate::errors::FleetResult;
use crate::models::Account;

/// 账号状态的可选持久化协作者
///
/// 单进程生命周期内不依赖它保证正确性，仅用于跨进程恢复账号状态。
#[async_trait]
pub trait AccountSnapshotStore: Send + Sync {
    /// 保存全量账号快照
    async fn save(&self, accounts: &[Account]) -> FleetResult<()>;

    /// 加载账号快照，存储不存在时返回空集合
    async fn load(&self) -> FleetResult<Vec<Account>>;
}
