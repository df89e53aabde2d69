use std::path::PathBuf;

use async_trait::async_trait;
use tracing::debug;

use fleet_core::{Account, AccountSnapshotStore, FleetError, FleetResult};

/// JSON文件快照存储
///
/// 最简单的持久化协作者实现：全量账号写入单个JSON文件。
pub struct JsonFileSnapshotStore {
    path: PathBuf,
}

impl JsonFileSnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl AccountSnapshotStore for JsonFileSnapshotStore {
    async fn save(&self, accounts: &[Account]) -> FleetResult<()> {
        let data = serde_json::to_string_pretty(accounts)?;
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| FleetError::Snapshot(format!("创建快照目录失败: {e}")))?;
        }
        tokio::fs::write(&self.path, data)
            .await
            .map_err(|e| FleetError::Snapshot(format!("写入快照失败: {e}")))?;
        debug!(path = %self.path.display(), count = accounts.len(), "账号快照已保存");
        Ok(())
    }

    async fn load(&self) -> FleetResult<Vec<Account>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(data) => Ok(serde_json::from_str(&data)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(FleetError::Snapshot(format!("读取快照失败: {e}"))),
        }
    }
}
