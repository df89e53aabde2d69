//! # fleet-account
//!
//! 账号资源管理：注册表、租约池与快照持久化。
//!
//! 账号是系统中竞争最激烈的资源，必须以独占租约的方式使用。
//! [`AccountStore`] 负责账号的登记、标签与导入导出；
//! [`AccountLeasePool`] 在其上维护进程内活跃租约集合，
//! 保证并发 `acquire` 不会把同一账号发给两个持有者。

pub mod pool;
pub mod snapshot;
pub mod store;

pub use pool::{AccountLeasePool, AccountPoolConfig, AccountPoolStats};
pub use snapshot::JsonFileSnapshotStore;
pub use store::{AccountStore, AccountStoreStats};
