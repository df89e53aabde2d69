//! 引擎配置的聚合与加载

use serde::{Deserialize, Serialize};

use fleet_account::AccountPoolConfig;
use fleet_core::{FleetError, FleetResult};
use fleet_fingerprint::FingerprintConfig;
use fleet_worker::WorkerPoolConfig;

/// 引擎总配置
///
/// 可从TOML文件加载，`FLEET__` 前缀的环境变量覆盖文件值
/// （如 `FLEET__WORKER__MAX_WORKERS=50`）。缺省的节使用各组件默认值。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FleetConfig {
    pub worker: WorkerPoolConfig,
    pub account: AccountPoolConfig,
    pub fingerprint: FingerprintConfig,
}

impl FleetConfig {
    /// 从配置文件与环境变量加载
    pub fn from_file(path: &str) -> FleetResult<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("FLEET")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| FleetError::config_error(e.to_string()))?;
        let loaded: FleetConfig = settings
            .try_deserialize()
            .map_err(|e| FleetError::config_error(e.to_string()))?;
        loaded.validate()?;
        Ok(loaded)
    }

    pub fn validate(&self) -> FleetResult<()> {
        self.worker.validate()?;
        self.account.validate()?;
        self.fingerprint.validate()?;
        Ok(())
    }
}
