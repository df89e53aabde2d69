use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{Capability, Priority, TaskId, WorkerId};

/// 任务定义
///
/// 提交后不可变，入队后由队列持有，被工作者认领后归该工作者。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    /// 任务需要的能力类别，决定哪些工作者可以认领
    pub capability: Capability,
    pub priority: Priority,
    /// 任务载荷，引擎不解释其内容，原样传给执行器
    pub payload: serde_json::Value,
    pub submitted_at: DateTime<Utc>,
}

impl Task {
    pub fn new(
        capability: Capability,
        priority: Priority,
        payload: serde_json::Value,
        submitted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            capability,
            priority,
            payload,
            submitted_at,
        }
    }
}

/// 批量提交用的任务描述
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSpec {
    pub capability: Capability,
    #[serde(default)]
    pub priority: Priority,
    pub payload: serde_json::Value,
}

/// 任务执行结果
///
/// 无论成功或失败都会投递给提交方，提交方不会无限等待
/// （紧急停止是唯一的例外，此时结果不可用）。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskOutcome {
    pub task_id: TaskId,
    pub worker_id: WorkerId,
    pub success: bool,
    pub error: Option<String>,
    /// 执行耗时（秒）
    pub execution_secs: f64,
    pub finished_at: DateTime<Utc>,
    pub data: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_ids_are_unique() {
        let now = Utc::now();
        let a = Task::new(Capability::Any, Priority::Normal, serde_json::json!({}), now);
        let b = Task::new(Capability::Any, Priority::Normal, serde_json::json!({}), now);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_task_spec_default_priority() {
        let spec: TaskSpec =
            serde_json::from_str(r#"{"capability":"any","payload":{}}"#).unwrap();
        assert_eq!(spec.priority, Priority::Normal);
    }
}
