//! # fleet
//!
//! 并发投放任务的进程内编排引擎。
//!
//! 三个核心组件：
//! - 工作池（[`WorkerPool`]）：任务分发、自动伸缩与健康巡检；
//! - 账号租约池（[`AccountLeasePool`]）：账号的独占租用与冷却、封禁生命周期；
//! - 指纹签发器（[`FingerprintIssuer`]）：限时有效的合成客户端身份。
//!
//! [`FleetEngine`] 把三者接成一条执行链：每个任务在执行前租一个账号、
//! 附上一个有效指纹，执行后按成败归还账号。

pub mod app;
pub mod config;
pub mod logging;

pub use app::{EngineStats, FleetEngine};
pub use config::FleetConfig;

pub use fleet_account::{AccountLeasePool, AccountPoolConfig, AccountStore, JsonFileSnapshotStore};
pub use fleet_core::{
    Account, AccountState, Capability, Credentials, DeliveryExecutor, ExecutionContext,
    FleetError, FleetResult, ManualClock, Priority, ProfileClass, SharedClock, SystemClock,
    TaskOutcome, TaskSpec, WorkerKind,
};
pub use fleet_fingerprint::{FingerprintConfig, FingerprintIssuer};
pub use fleet_worker::{PoolStats, TaskHandle, WorkerPool, WorkerPoolConfig};
