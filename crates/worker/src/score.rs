//! 工作者性能评分

use chrono::{DateTime, Utc};

use fleet_core::WorkerInfo;

/// 失败惩罚项统计的结果窗口大小
pub(crate) const RECENT_WINDOW: usize = 20;

/// 记录一次任务结果并重算评分
///
/// 成功率是指数移动平均（0.9旧值 + 0.1新结果），最近结果权重最大。
pub(crate) fn record_outcome(info: &mut WorkerInfo, success: bool, now: DateTime<Utc>) {
    if success {
        info.completed += 1;
        info.success_rate = 0.9 * info.success_rate + 0.1;
    } else {
        info.failed += 1;
        info.success_rate *= 0.9;
    }
    info.recent_outcomes.push_back(success);
    while info.recent_outcomes.len() > RECENT_WINDOW {
        info.recent_outcomes.pop_front();
    }
    info.last_active_at = now;
    info.performance_score = compute_score(info, now);
}

/// 评分 = 成功率 + 完成量加成(≤0.2) + 运行时长加成(≤0.1) − 近期失败惩罚
///
/// 始终落在 [0.1, 1.0]，保证任何工作者都不会被完全饿死。
pub(crate) fn compute_score(info: &WorkerInfo, now: DateTime<Utc>) -> f64 {
    let recent_failures = info.recent_outcomes.iter().filter(|ok| !**ok).count();
    let score = info.success_rate
        + (info.completed as f64 / 100.0).min(0.2)
        + (info.hours_up(now) / 10.0).min(0.1)
        - 0.05 * recent_failures as f64;
    score.clamp(0.1, 1.0)
}
