//! # fleet-worker
//!
//! 工作池：任务分发、自动伸缩、健康巡检与性能评分。
//!
//! 任务按优先级入队，空闲工作者从队首扫描并认领第一个能力匹配的任务。
//! 高优先级任务只交给性能评分达标的工作者。执行错误被捕获并记录为
//! 失败结果，永远不会导致工作者退出。

mod health;
mod queue;
mod scaling;
mod score;

pub mod pool;

pub use pool::{PoolStats, TaskHandle, WorkerPool, WorkerPoolConfig};
