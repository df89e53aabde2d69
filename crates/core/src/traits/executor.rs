use std::collections::HashMap;

use async_trait::async_trait;

use crate::errors::FleetResult;
use crate::models::{Account, Fingerprint, Task};
use crate::types::WorkerId;

/// 工作池的执行接口
///
/// 工作池不解释任务载荷，只负责调度；执行出错由池捕获并记录为失败结果，
/// 永远不会导致工作者退出。
#[async_trait]
pub trait TaskExecutor: Send + Sync {
    /// 执行一个任务，返回结果数据
    async fn execute(&self, task: Task, worker_id: WorkerId) -> FleetResult<serde_json::Value>;
}

/// 单次执行的完整上下文
///
/// 由编排层组装：租到的账号、附加的指纹以及由指纹推导出的请求头和Cookie。
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    pub task: Task,
    pub worker_id: WorkerId,
    pub account: Account,
    pub fingerprint: Fingerprint,
    pub headers: HashMap<String, String>,
    pub cookies: HashMap<String, String>,
}

/// 投放动作接口
///
/// 由使用方实现，拿到完整上下文后执行真正的外部操作。
/// 本引擎不规定该操作是什么（见规格的非目标）。
#[async_trait]
pub trait DeliveryExecutor: Send + Sync {
    async fn deliver(&self, ctx: &ExecutionContext) -> FleetResult<serde_json::Value>;
}
