//! 自动伸缩

use std::sync::atomic::Ordering;

use tracing::info;

use crate::pool::WorkerPool;

impl WorkerPool {
    /// 执行一轮伸缩评估
    ///
    /// 积压超过 工作者数×扩容系数 时扩容；队列深度低于工作者数时
    /// 缩容最多 `scale_down_batch` 个空闲的最低评分工作者。
    /// 忙碌中的工作者永远不会被移除。
    pub async fn run_scaling_cycle(&self) {
        let depth = self.inner.queue.len().await;
        let count = self.inner.workers.read().await.len();
        let config = &self.inner.config;

        if depth > count * config.scale_up_queue_factor && count < config.max_workers {
            let add = (depth / config.scale_up_divisor).clamp(1, config.max_workers - count);
            info!(queue_depth = depth, workers = count, add, "扩容");
            for _ in 0..add {
                let kind = self.next_kind();
                self.spawn_worker(kind).await;
            }
        } else if depth < count && count > config.min_workers {
            let budget = (count - config.min_workers).min(config.scale_down_batch);
            let retired = self.retire_idle_lowest(budget).await;
            if retired > 0 {
                info!(queue_depth = depth, workers = count, retired, "缩容");
            }
        }
    }

    /// 给最多 `budget` 个空闲的最低评分工作者打上退役标记
    async fn retire_idle_lowest(&self, budget: usize) -> usize {
        let workers = self.inner.workers.read().await;
        let mut idle = Vec::new();
        for (id, handle) in workers.iter() {
            let info = handle.info.read().await;
            if info.is_idle() && !handle.retire.load(Ordering::Relaxed) {
                idle.push((id.clone(), info.performance_score));
            }
        }
        idle.sort_by(|a, b| a.1.total_cmp(&b.1));

        let mut retired = 0;
        for (id, _) in idle.into_iter().take(budget) {
            if let Some(handle) = workers.get(&id) {
                handle.retire.store(true, Ordering::Relaxed);
                retired += 1;
            }
        }
        retired
    }
}
