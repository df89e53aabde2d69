use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{TaskId, WorkerId, WorkerKind};

/// 工作者状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerStatus {
    Idle,
    Busy,
}

/// 工作者资源占用快照
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ResourceUsage {
    pub cpu: f64,
    pub memory_mb: f64,
    pub bandwidth_mbps: f64,
}

impl Default for ResourceUsage {
    fn default() -> Self {
        Self {
            cpu: 0.1,
            memory_mb: 100.0,
            bandwidth_mbps: 1.0,
        }
    }
}

/// 工作者信息
///
/// 由工作池创建，执行期间由工作者自身更新，缩容或强制重启时销毁。
/// `success_rate` 是指数移动平均，最近的结果权重最大；
/// `recent_outcomes` 是最近若干次任务的成败窗口，用于性能评分的失败惩罚项。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerInfo {
    pub id: WorkerId,
    pub kind: WorkerKind,
    pub status: WorkerStatus,
    pub created_at: DateTime<Utc>,
    pub last_active_at: DateTime<Utc>,
    pub completed: u64,
    pub failed: u64,
    /// 指数移动平均成功率，初始为1.0
    pub success_rate: f64,
    /// 性能评分，始终处于 [0.1, 1.0]
    pub performance_score: f64,
    pub recent_outcomes: VecDeque<bool>,
    pub current_task: Option<TaskId>,
    pub resource_usage: ResourceUsage,
}

impl WorkerInfo {
    pub fn new(id: WorkerId, kind: WorkerKind, now: DateTime<Utc>) -> Self {
        Self {
            id,
            kind,
            status: WorkerStatus::Idle,
            created_at: now,
            last_active_at: now,
            completed: 0,
            failed: 0,
            success_rate: 1.0,
            performance_score: 1.0,
            recent_outcomes: VecDeque::new(),
            current_task: None,
            resource_usage: ResourceUsage::default(),
        }
    }

    pub fn is_idle(&self) -> bool {
        self.status == WorkerStatus::Idle
    }

    /// 运行时长（小时）
    pub fn hours_up(&self, now: DateTime<Utc>) -> f64 {
        (now - self.created_at).num_seconds() as f64 / 3600.0
    }

    /// 距上次活跃的秒数
    pub fn inactive_secs(&self, now: DateTime<Utc>) -> i64 {
        (now - self.last_active_at).num_seconds()
    }
}
