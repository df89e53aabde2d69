use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, oneshot, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use fleet_core::{
    Capability, FleetError, FleetResult, Priority, SharedClock, Task, TaskExecutor, TaskId,
    TaskOutcome, TaskSpec, WorkerId, WorkerInfo, WorkerKind, WorkerStatus,
};

use crate::queue::{QueuedTask, TaskQueue};
use crate::score;

/// 工作池配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerPoolConfig {
    /// 工作者数量上限
    pub max_workers: usize,
    /// 工作者数量下限，启动时按此数量创建
    pub min_workers: usize,
    /// 伸缩周期（秒）
    pub scale_interval_secs: u64,
    /// 健康巡检周期（秒）
    pub health_interval_secs: u64,
    /// 超过该秒数未活跃的工作者被替换
    pub inactive_threshold_secs: i64,
    /// 队列深度超过 工作者数×该系数 时扩容
    pub scale_up_queue_factor: usize,
    /// 扩容数量 = 队列深度 / 该除数
    pub scale_up_divisor: usize,
    /// 单次缩容最多移除的工作者数
    pub scale_down_batch: usize,
    /// 认领高优先级任务要求的最低评分
    pub high_priority_min_score: f64,
    /// 无任务可认领时的退避下限（毫秒）
    pub claim_backoff_min_ms: u64,
    /// 退避上限（毫秒）
    pub claim_backoff_max_ms: u64,
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self {
            max_workers: 20,
            min_workers: 5,             // 启动时的初始规模
            scale_interval_secs: 5,     // 每5秒评估一次伸缩
            health_interval_secs: 60,   // 每60秒巡检一次
            inactive_threshold_secs: 300, // 5分钟不活跃视为异常
            scale_up_queue_factor: 5,
            scale_up_divisor: 10,
            scale_down_batch: 2,
            high_priority_min_score: 0.7,
            claim_backoff_min_ms: 50,
            claim_backoff_max_ms: 1000,
        }
    }
}

impl WorkerPoolConfig {
    pub fn validate(&self) -> FleetResult<()> {
        if self.min_workers == 0 {
            return Err(FleetError::config_error("min_workers 必须大于0"));
        }
        if self.min_workers > self.max_workers {
            return Err(FleetError::config_error(
                "min_workers 不能大于 max_workers",
            ));
        }
        if self.scale_up_queue_factor == 0 || self.scale_up_divisor == 0 {
            return Err(FleetError::config_error("伸缩系数必须大于0"));
        }
        if !(0.0..=1.0).contains(&self.high_priority_min_score) {
            return Err(FleetError::config_error(
                "high_priority_min_score 必须在 [0.0, 1.0] 内",
            ));
        }
        if self.claim_backoff_min_ms == 0 || self.claim_backoff_min_ms > self.claim_backoff_max_ms
        {
            return Err(FleetError::config_error("退避区间非法"));
        }
        Ok(())
    }
}

/// 工作池统计
#[derive(Debug, Clone, Serialize)]
pub struct PoolStats {
    pub total_workers: usize,
    pub idle_workers: usize,
    pub busy_workers: usize,
    pub queue_depth: usize,
    pub completed: u64,
    pub failed: u64,
    pub avg_performance_score: f64,
}

/// 已提交任务的结果句柄
#[derive(Debug)]
pub struct TaskHandle {
    task_id: TaskId,
    rx: oneshot::Receiver<TaskOutcome>,
}

impl TaskHandle {
    pub fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// 等待任务结果
    ///
    /// 无论成功或失败都会投递；仅在紧急停止丢弃排队任务后返回 `ResultDropped`。
    pub async fn outcome(self) -> FleetResult<TaskOutcome> {
        self.rx.await.map_err(|_| FleetError::ResultDropped)
    }
}

pub(crate) struct WorkerHandle {
    pub info: Arc<RwLock<WorkerInfo>>,
    /// 置位后工作者在下一次空闲时退出；执行中的任务不受影响
    pub retire: Arc<AtomicBool>,
    pub join: JoinHandle<()>,
}

pub(crate) struct PoolInner {
    pub config: WorkerPoolConfig,
    pub executor: Arc<dyn TaskExecutor>,
    pub clock: SharedClock,
    pub queue: TaskQueue,
    pub workers: RwLock<HashMap<WorkerId, WorkerHandle>>,
    pub running: AtomicBool,
    pub completed: AtomicU64,
    pub failed: AtomicU64,
    pub shutdown: broadcast::Sender<()>,
    pub kind_cursor: AtomicUsize,
}

/// 工作池
///
/// 任务分发、自动伸缩与健康巡检的编排者。克隆是廉价的句柄复制。
#[derive(Clone)]
pub struct WorkerPool {
    pub(crate) inner: Arc<PoolInner>,
}

impl WorkerPool {
    pub fn new(
        config: WorkerPoolConfig,
        executor: Arc<dyn TaskExecutor>,
        clock: SharedClock,
    ) -> FleetResult<Self> {
        config.validate()?;
        let (shutdown, _) = broadcast::channel(1);
        Ok(Self {
            inner: Arc::new(PoolInner {
                config,
                executor,
                clock,
                queue: TaskQueue::new(),
                workers: RwLock::new(HashMap::new()),
                running: AtomicBool::new(false),
                completed: AtomicU64::new(0),
                failed: AtomicU64::new(0),
                shutdown,
                kind_cursor: AtomicUsize::new(0),
            }),
        })
    }

    /// 启动工作池：创建初始工作者并开启伸缩与巡检循环
    pub async fn start(&self) -> FleetResult<()> {
        if self.inner.running.swap(true, Ordering::SeqCst) {
            return Err(FleetError::AlreadyRunning);
        }
        // 上一次停止会关闭队列，重启时恢复接收
        self.inner.queue.reopen().await;
        info!(
            min_workers = self.inner.config.min_workers,
            max_workers = self.inner.config.max_workers,
            "启动工作池"
        );
        for _ in 0..self.inner.config.min_workers {
            let kind = self.next_kind();
            self.spawn_worker(kind).await;
        }
        self.spawn_periodic_loops();
        Ok(())
    }

    /// 提交单个任务，非阻塞入队
    pub async fn submit(
        &self,
        capability: Capability,
        priority: Priority,
        payload: serde_json::Value,
    ) -> FleetResult<TaskHandle> {
        let task = Task::new(capability, priority, payload, self.inner.clock.now());
        let task_id = task.id;
        let (tx, rx) = oneshot::channel();
        self.inner
            .queue
            .push(QueuedTask {
                task,
                responder: tx,
            })
            .await?;
        debug!(%task_id, ?capability, ?priority, "任务入队");
        Ok(TaskHandle { task_id, rx })
    }

    /// 批量提交，提交顺序只是调度提示
    pub async fn submit_batch(&self, specs: Vec<TaskSpec>) -> FleetResult<Vec<TaskHandle>> {
        let mut handles = Vec::with_capacity(specs.len());
        for spec in specs {
            handles.push(
                self.submit(spec.capability, spec.priority, spec.payload)
                    .await?,
            );
        }
        Ok(handles)
    }

    pub async fn stats(&self) -> PoolStats {
        let workers = self.inner.workers.read().await;
        let mut idle = 0;
        let mut busy = 0;
        let mut score_sum = 0.0;
        for handle in workers.values() {
            let info = handle.info.read().await;
            match info.status {
                WorkerStatus::Idle => idle += 1,
                WorkerStatus::Busy => busy += 1,
            }
            score_sum += info.performance_score;
        }
        let total = workers.len();
        drop(workers);
        PoolStats {
            total_workers: total,
            idle_workers: idle,
            busy_workers: busy,
            queue_depth: self.inner.queue.len().await,
            completed: self.inner.completed.load(Ordering::Relaxed),
            failed: self.inner.failed.load(Ordering::Relaxed),
            avg_performance_score: if total > 0 {
                score_sum / total as f64
            } else {
                0.0
            },
        }
    }

    /// 优雅停止：关闭队列，等排队与在途任务全部完成后再收回工作者
    pub async fn stop(&self) {
        if !self.inner.running.swap(false, Ordering::SeqCst) {
            return;
        }
        info!("停止工作池，等待任务排空");
        self.inner.queue.close().await;

        loop {
            let depth = self.inner.queue.len().await;
            let busy = self.busy_count().await;
            if depth == 0 && busy == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }

        let _ = self.inner.shutdown.send(());
        while !self.inner.workers.read().await.is_empty() {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        info!(
            completed = self.inner.completed.load(Ordering::Relaxed),
            failed = self.inner.failed.load(Ordering::Relaxed),
            "工作池已停止"
        );
    }

    /// 紧急停止：丢弃排队任务并中止所有工作者，有界时间内返回
    ///
    /// 被丢弃任务的句柄会解析为 `ResultDropped`。
    pub async fn emergency_stop(&self) {
        self.inner.running.store(false, Ordering::SeqCst);
        warn!("紧急停止工作池");
        self.inner.queue.close().await;
        let dropped = self.inner.queue.drain().await;
        if !dropped.is_empty() {
            warn!(count = dropped.len(), "丢弃排队中的任务");
        }
        drop(dropped);

        let _ = self.inner.shutdown.send(());
        let mut workers = self.inner.workers.write().await;
        for (_, handle) in workers.drain() {
            handle.join.abort();
        }
    }

    pub async fn worker_count(&self) -> usize {
        self.inner.workers.read().await.len()
    }

    /// 当前全部工作者的状态快照
    pub async fn worker_infos(&self) -> Vec<WorkerInfo> {
        let workers = self.inner.workers.read().await;
        let mut infos = Vec::with_capacity(workers.len());
        for handle in workers.values() {
            infos.push(handle.info.read().await.clone());
        }
        infos
    }

    async fn busy_count(&self) -> usize {
        let workers = self.inner.workers.read().await;
        let mut busy = 0;
        for handle in workers.values() {
            if handle.info.read().await.status == WorkerStatus::Busy {
                busy += 1;
            }
        }
        busy
    }

    /// 工作者类型轮转分配
    pub(crate) fn next_kind(&self) -> WorkerKind {
        let cursor = self.inner.kind_cursor.fetch_add(1, Ordering::Relaxed);
        WorkerKind::ALL[cursor % WorkerKind::ALL.len()]
    }

    /// 创建并启动一个工作者
    pub(crate) async fn spawn_worker(&self, kind: WorkerKind) -> WorkerId {
        let id: WorkerId = format!("worker-{}", &Uuid::new_v4().simple().to_string()[..8]);
        let info = Arc::new(RwLock::new(WorkerInfo::new(
            id.clone(),
            kind,
            self.inner.clock.now(),
        )));
        let retire = Arc::new(AtomicBool::new(false));

        let join = tokio::spawn(worker_loop(
            self.inner.clone(),
            id.clone(),
            info.clone(),
            retire.clone(),
        ));
        self.inner
            .workers
            .write()
            .await
            .insert(id.clone(), WorkerHandle { info, retire, join });
        debug!(worker_id = %id, %kind, "创建工作者");
        id
    }

    fn spawn_periodic_loops(&self) {
        let pool = self.clone();
        let mut shutdown = self.inner.shutdown.subscribe();
        let interval = Duration::from_secs(self.inner.config.scale_interval_secs);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown.recv() => break,
                    _ = tokio::time::sleep(interval) => pool.run_scaling_cycle().await,
                }
            }
        });

        let pool = self.clone();
        let mut shutdown = self.inner.shutdown.subscribe();
        let interval = Duration::from_secs(self.inner.config.health_interval_secs);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown.recv() => break,
                    _ = tokio::time::sleep(interval) => pool.run_health_cycle().await,
                }
            }
        });
    }
}

/// 工作者主循环
///
/// 认领、执行、记录，认领不到就退避等待。执行错误被捕获为失败结果，
/// 不会让循环退出。退出时自行从注册表摘除。
async fn worker_loop(
    inner: Arc<PoolInner>,
    id: WorkerId,
    info: Arc<RwLock<WorkerInfo>>,
    retire: Arc<AtomicBool>,
) {
    let min_backoff = Duration::from_millis(inner.config.claim_backoff_min_ms);
    let max_backoff = Duration::from_millis(inner.config.claim_backoff_max_ms);
    let mut backoff = min_backoff;
    let mut shutdown = inner.shutdown.subscribe();

    loop {
        if retire.load(Ordering::Relaxed) {
            debug!(worker_id = %id, "工作者按计划退役");
            break;
        }
        let (kind, my_score) = {
            let info = info.read().await;
            (info.kind, info.performance_score)
        };
        match inner
            .queue
            .claim(kind, my_score, inner.config.high_priority_min_score)
            .await
        {
            Some(queued) => {
                backoff = min_backoff;
                execute_one(&inner, &info, queued).await;
            }
            None => {
                // 队列已关闭且排空后不会再有可认领的任务
                if inner.queue.is_closed().await && inner.queue.is_empty().await {
                    break;
                }
                tokio::select! {
                    _ = shutdown.recv() => break,
                    _ = tokio::time::sleep(backoff) => {}
                }
                backoff = (backoff * 2).min(max_backoff);
            }
        }
    }
    inner.workers.write().await.remove(&id);
}

async fn execute_one(
    inner: &Arc<PoolInner>,
    info: &Arc<RwLock<WorkerInfo>>,
    queued: QueuedTask,
) {
    let task = queued.task;
    let worker_id = {
        let mut info = info.write().await;
        info.status = WorkerStatus::Busy;
        info.current_task = Some(task.id);
        info.last_active_at = inner.clock.now();
        info.id.clone()
    };

    let started = std::time::Instant::now();
    let result = inner.executor.execute(task.clone(), worker_id.clone()).await;
    let execution_secs = started.elapsed().as_secs_f64();
    let now = inner.clock.now();

    let (success, error, data) = match result {
        Ok(data) => (true, None, data),
        Err(err) => {
            if err.is_fatal() {
                error!(task_id = %task.id, worker_id = %worker_id, %err, "任务执行失败");
            } else {
                warn!(task_id = %task.id, worker_id = %worker_id, %err, "任务执行失败");
            }
            (false, Some(err.to_string()), serde_json::Value::Null)
        }
    };

    {
        let mut info = info.write().await;
        score::record_outcome(&mut info, success, now);
        info.status = WorkerStatus::Idle;
        info.current_task = None;
    }
    if success {
        inner.completed.fetch_add(1, Ordering::Relaxed);
    } else {
        inner.failed.fetch_add(1, Ordering::Relaxed);
    }

    // 提交方可能已放弃等待，投递失败不是错误
    let _ = queued.responder.send(TaskOutcome {
        task_id: task.id,
        worker_id,
        success,
        error,
        execution_secs,
        finished_at: now,
        data,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default_is_valid() {
        let config = WorkerPoolConfig::default();
        assert_eq!(config.min_workers, 5);
        assert_eq!(config.high_priority_min_score, 0.7);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_rejects_inverted_bounds() {
        let config = WorkerPoolConfig {
            min_workers: 30,
            max_workers: 20,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_rejects_bad_backoff() {
        let config = WorkerPoolConfig {
            claim_backoff_min_ms: 2000,
            claim_backoff_max_ms: 1000,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
