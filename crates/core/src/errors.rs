use thiserror::Error;

/// 统一错误类型
///
/// 资源耗尽与任务执行失败属于常规结果，调用方应按普通返回值处理；
/// 非法状态转换属于调用方bug，应立即暴露。
#[derive(Debug, Error)]
pub enum FleetError {
    #[error("资源耗尽: {0}")]
    ResourceExhausted(String),
    #[error("任务执行失败: {0}")]
    TaskExecution(String),
    #[error("非法状态转换: {0}")]
    InvalidTransition(String),
    #[error("指纹已失效: {id}")]
    StaleFingerprint { id: String },
    #[error("工作池已在运行")]
    AlreadyRunning,
    #[error("任务队列已关闭")]
    QueueClosed,
    #[error("结果已被丢弃（紧急停止后结果不可用）")]
    ResultDropped,
    #[error("账号未找到: {id}")]
    AccountNotFound { id: String },
    #[error("指纹未找到: {id}")]
    FingerprintNotFound { id: String },
    #[error("配置错误: {0}")]
    Configuration(String),
    #[error("序列化错误: {0}")]
    Serialization(String),
    #[error("快照存储错误: {0}")]
    Snapshot(String),
}

pub type FleetResult<T> = Result<T, FleetError>;

impl FleetError {
    pub fn resource_exhausted<S: Into<String>>(msg: S) -> Self {
        Self::ResourceExhausted(msg.into())
    }

    pub fn task_execution<S: Into<String>>(msg: S) -> Self {
        Self::TaskExecution(msg.into())
    }

    pub fn invalid_transition<S: Into<String>>(msg: S) -> Self {
        Self::InvalidTransition(msg.into())
    }

    pub fn account_not_found<S: Into<String>>(id: S) -> Self {
        Self::AccountNotFound { id: id.into() }
    }

    pub fn fingerprint_not_found<S: Into<String>>(id: S) -> Self {
        Self::FingerprintNotFound { id: id.into() }
    }

    pub fn config_error<S: Into<String>>(msg: S) -> Self {
        Self::Configuration(msg.into())
    }

    /// 是否属于预期内的、可按普通结果处理的错误
    pub fn is_expected(&self) -> bool {
        matches!(
            self,
            FleetError::ResourceExhausted(_)
                | FleetError::TaskExecution(_)
                | FleetError::StaleFingerprint { .. }
        )
    }

    /// 是否为致命错误（调用方bug）
    pub fn is_fatal(&self) -> bool {
        matches!(self, FleetError::InvalidTransition(_))
    }
}

impl From<serde_json::Error> for FleetError {
    fn from(err: serde_json::Error) -> Self {
        FleetError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expected_errors() {
        assert!(FleetError::resource_exhausted("no account").is_expected());
        assert!(FleetError::task_execution("boom").is_expected());
        assert!(!FleetError::AlreadyRunning.is_expected());
    }

    #[test]
    fn test_fatal_errors() {
        assert!(FleetError::invalid_transition("release without lease").is_fatal());
        assert!(!FleetError::QueueClosed.is_fatal());
    }

    #[test]
    fn test_error_display() {
        let err = FleetError::account_not_found("acc-1");
        assert!(err.to_string().contains("acc-1"));
    }
}
