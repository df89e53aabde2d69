use std::collections::VecDeque;

use tokio::sync::{oneshot, Mutex};

use fleet_core::{FleetError, FleetResult, Priority, Task, TaskOutcome, WorkerKind};

/// 入队的任务与它的结果回传通道
pub(crate) struct QueuedTask {
    pub task: Task,
    pub responder: oneshot::Sender<TaskOutcome>,
}

struct QueueInner {
    items: VecDeque<QueuedTask>,
    closed: bool,
}

/// 进程内优先级任务队列
///
/// 高优先级排在前面，同优先级保持提交顺序。认领从队首向后扫描，
/// 取第一个工作者能力匹配且评分达标的任务。
pub(crate) struct TaskQueue {
    inner: Mutex<QueueInner>,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(QueueInner {
                items: VecDeque::new(),
                closed: false,
            }),
        }
    }

    /// 入队，插入到第一个严格更低优先级的任务之前
    pub async fn push(&self, queued: QueuedTask) -> FleetResult<()> {
        let mut inner = self.inner.lock().await;
        if inner.closed {
            return Err(FleetError::QueueClosed);
        }
        let priority = queued.task.priority;
        let pos = inner
            .items
            .iter()
            .position(|q| q.task.priority < priority)
            .unwrap_or(inner.items.len());
        inner.items.insert(pos, queued);
        Ok(())
    }

    /// 认领一个任务
    ///
    /// 从队首扫描，返回第一个该类型工作者支持的任务；
    /// 高优先级及以上的任务要求评分不低于 `min_score_for_high`。
    pub async fn claim(
        &self,
        kind: WorkerKind,
        score: f64,
        min_score_for_high: f64,
    ) -> Option<QueuedTask> {
        let mut inner = self.inner.lock().await;
        let pos = inner.items.iter().position(|q| {
            kind.supports(q.task.capability)
                && (q.task.priority < Priority::High || score >= min_score_for_high)
        })?;
        inner.items.remove(pos)
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.items.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.items.is_empty()
    }

    pub async fn is_closed(&self) -> bool {
        self.inner.lock().await.closed
    }

    /// 关闭队列，之后的 `push` 返回 `QueueClosed`；已排队任务不受影响
    pub async fn close(&self) {
        self.inner.lock().await.closed = true;
    }

    /// 重新开放队列，配合停止后的工作池重启
    pub async fn reopen(&self) {
        self.inner.lock().await.closed = false;
    }

    /// 清空队列并返回被丢弃的任务
    ///
    /// 丢弃 `QueuedTask` 会断开其回传通道，等待方收到 `ResultDropped`。
    pub async fn drain(&self) -> Vec<QueuedTask> {
        let mut inner = self.inner.lock().await;
        inner.items.drain(..).collect()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use fleet_core::Capability;

    use super::*;

    fn queued(capability: Capability, priority: Priority) -> (QueuedTask, u8) {
        static SEQ: std::sync::atomic::AtomicU8 = std::sync::atomic::AtomicU8::new(0);
        let seq = SEQ.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        let (tx, _rx) = oneshot::channel();
        let task = Task::new(
            capability,
            priority,
            serde_json::json!({ "seq": seq }),
            Utc::now(),
        );
        (QueuedTask { task, responder: tx }, seq)
    }

    #[tokio::test]
    async fn test_priority_ordering_with_fifo_within_priority() {
        let queue = TaskQueue::new();
        let (low, _) = queued(Capability::Any, Priority::Low);
        let (normal_a, seq_a) = queued(Capability::Any, Priority::Normal);
        let (normal_b, seq_b) = queued(Capability::Any, Priority::Normal);
        let (critical, _) = queued(Capability::Any, Priority::Critical);
        queue.push(low).await.unwrap();
        queue.push(normal_a).await.unwrap();
        queue.push(normal_b).await.unwrap();
        queue.push(critical).await.unwrap();

        let first = queue.claim(WorkerKind::Api, 1.0, 0.7).await.unwrap();
        assert_eq!(first.task.priority, Priority::Critical);

        let second = queue.claim(WorkerKind::Api, 1.0, 0.7).await.unwrap();
        let third = queue.claim(WorkerKind::Api, 1.0, 0.7).await.unwrap();
        assert_eq!(second.task.payload["seq"], seq_a);
        assert_eq!(third.task.payload["seq"], seq_b);

        let last = queue.claim(WorkerKind::Api, 1.0, 0.7).await.unwrap();
        assert_eq!(last.task.priority, Priority::Low);
        assert!(queue.is_empty().await);
    }

    #[tokio::test]
    async fn test_claim_skips_unsupported_capability() {
        let queue = TaskQueue::new();
        let (browser_task, _) = queued(Capability::Organic, Priority::High);
        let (api_task, _) = queued(Capability::Fast, Priority::Normal);
        queue.push(browser_task).await.unwrap();
        queue.push(api_task).await.unwrap();

        // Api类型认领不了Organic，越过它取后面的Fast
        let claimed = queue.claim(WorkerKind::Api, 1.0, 0.7).await.unwrap();
        assert_eq!(claimed.task.capability, Capability::Fast);
        assert_eq!(queue.len().await, 1);
    }

    #[tokio::test]
    async fn test_high_priority_requires_min_score() {
        let queue = TaskQueue::new();
        let (high, _) = queued(Capability::Any, Priority::High);
        queue.push(high).await.unwrap();

        assert!(queue.claim(WorkerKind::Api, 0.5, 0.7).await.is_none());
        assert!(queue.claim(WorkerKind::Api, 0.8, 0.7).await.is_some());
    }

    #[tokio::test]
    async fn test_push_after_close_rejected() {
        let queue = TaskQueue::new();
        let (before, _) = queued(Capability::Any, Priority::Normal);
        queue.push(before).await.unwrap();
        queue.close().await;

        let (after, _) = queued(Capability::Any, Priority::Normal);
        let err = queue.push(after).await.unwrap_err();
        assert!(matches!(err, FleetError::QueueClosed));
        // 已排队的任务仍可认领
        assert!(queue.claim(WorkerKind::Api, 1.0, 0.7).await.is_some());
    }

    #[tokio::test]
    async fn test_drain_disconnects_responders() {
        let queue = TaskQueue::new();
        let (tx, rx) = oneshot::channel();
        let task = Task::new(
            Capability::Any,
            Priority::Normal,
            serde_json::json!({}),
            Utc::now(),
        );
        queue.push(QueuedTask { task, responder: tx }).await.unwrap();

        drop(queue.drain().await);
        assert!(rx.await.is_err());
    }
}
