//! 健康巡检

use std::sync::atomic::Ordering;

use tracing::warn;

use crate::pool::WorkerPool;

impl WorkerPool {
    /// 执行一轮健康巡检
    ///
    /// 超过不活跃阈值的工作者先补充同类型的替代者，再打退役标记；
    /// 执行中的任务会跑完，替换不中断在途工作。
    /// 资源占用过高只记录日志，不做处置。
    pub async fn run_health_cycle(&self) {
        let now = self.inner.clock.now();
        let threshold = self.inner.config.inactive_threshold_secs;

        let mut stale = Vec::new();
        {
            let workers = self.inner.workers.read().await;
            for (id, handle) in workers.iter() {
                if handle.retire.load(Ordering::Relaxed) {
                    continue;
                }
                let info = handle.info.read().await;
                if info.inactive_secs(now) > threshold {
                    stale.push((id.clone(), info.kind));
                }
                if info.resource_usage.cpu > 0.9 || info.resource_usage.memory_mb > 1024.0 {
                    warn!(
                        worker_id = %id,
                        cpu = info.resource_usage.cpu,
                        memory_mb = info.resource_usage.memory_mb,
                        "资源占用过高"
                    );
                }
            }
        }

        for (id, kind) in stale {
            warn!(
                worker_id = %id,
                %kind,
                inactive_threshold_secs = threshold,
                "工作者长时间不活跃，替换"
            );
            // 先补充再退役，容量不出现缺口
            self.spawn_worker(kind).await;
            let workers = self.inner.workers.read().await;
            if let Some(handle) = workers.get(&id) {
                handle.retire.store(true, Ordering::Relaxed);
            }
        }
    }
}
