use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use tokio::sync::Mutex;

use fleet::{
    AccountState, Capability, Credentials, DeliveryExecutor, ExecutionContext, FleetConfig,
    FleetEngine, FleetResult, ManualClock, Priority, SharedClock,
};
use fleet_core::FleetError;

/// 记录每次投放上下文的桩实现
struct RecordingDelivery {
    fail: bool,
    seen: Mutex<Vec<ExecutionContext>>,
}

impl RecordingDelivery {
    fn ok() -> Arc<Self> {
        Arc::new(Self {
            fail: false,
            seen: Mutex::new(Vec::new()),
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            seen: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl DeliveryExecutor for RecordingDelivery {
    async fn deliver(&self, ctx: &ExecutionContext) -> FleetResult<serde_json::Value> {
        self.seen.lock().await.push(ctx.clone());
        if self.fail {
            return Err(FleetError::task_execution("投放被拒"));
        }
        Ok(serde_json::json!({ "delivered": true }))
    }
}

fn creds(username: &str) -> Credentials {
    Credentials {
        username: username.into(),
        email: None,
        password: None,
        session_id: None,
        device_id: None,
        proxy: None,
    }
}

fn small_config() -> FleetConfig {
    let mut config = FleetConfig::default();
    config.worker.min_workers = 2;
    config.worker.max_workers = 4;
    config.fingerprint.rng_seed = Some(7);
    config
}

async fn engine_with_accounts(
    config: FleetConfig,
    delivery: Arc<RecordingDelivery>,
    accounts: usize,
) -> FleetEngine {
    let clock: SharedClock = Arc::new(ManualClock::starting_now());
    let engine = FleetEngine::new(config, delivery, clock).unwrap();
    for i in 0..accounts {
        engine
            .accounts()
            .store()
            .add(creds(&format!("user{i}")), vec![])
            .await
            .unwrap();
    }
    engine
}

#[tokio::test]
async fn test_end_to_end_delivery_chain() {
    let delivery = RecordingDelivery::ok();
    let engine = engine_with_accounts(small_config(), delivery.clone(), 3).await;
    engine.start().await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..20 {
        handles.push(
            engine
                .submit(Capability::Any, Priority::Normal, serde_json::json!({}))
                .await
                .unwrap(),
        );
    }
    let outcomes = join_all(handles.into_iter().map(|h| h.outcome())).await;
    for outcome in outcomes {
        let outcome = outcome.unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.data["delivered"], true);
    }

    let stats = engine.stats().await;
    assert_eq!(stats.worker.completed, 20);
    assert_eq!(stats.worker.failed, 0);
    // 所有租约已归还
    assert_eq!(stats.account.active_leases, 0);
    assert!(stats.fingerprint.issued >= 1);

    // 每次执行都带着租到的账号和完整的身份材料
    let seen = delivery.seen.lock().await;
    assert_eq!(seen.len(), 20);
    for ctx in seen.iter() {
        assert_eq!(ctx.account.state, AccountState::Leased);
        assert!(ctx.headers.contains_key("User-Agent"));
        assert!(ctx.cookies.contains_key("web_id"));
        assert!(!ctx.fingerprint.invalidated);
    }

    // 同一账号的身份保持连续：账号与指纹绑定不变
    let mut binding: HashMap<String, uuid::Uuid> = HashMap::new();
    for ctx in seen.iter() {
        let prev = binding.insert(ctx.account.id.clone(), ctx.fingerprint.id);
        if let Some(prev) = prev {
            assert_eq!(prev, ctx.fingerprint.id);
        }
    }
    drop(seen);

    engine.stop().await;
}

#[tokio::test]
async fn test_no_accounts_yields_failed_outcomes() {
    let engine = engine_with_accounts(small_config(), RecordingDelivery::ok(), 0).await;
    engine.start().await.unwrap();

    let handle = engine
        .submit(Capability::Any, Priority::Normal, serde_json::json!({}))
        .await
        .unwrap();
    let outcome = handle.outcome().await.unwrap();
    assert!(!outcome.success);
    assert!(outcome.error.unwrap().contains("资源耗尽"));

    engine.stop().await;
}

#[tokio::test]
async fn test_failed_deliveries_auto_ban_account() {
    let mut config = small_config();
    config.worker.min_workers = 1;
    config.worker.max_workers = 1;
    config.account.auto_ban_after_failures = Some(3);
    let engine = engine_with_accounts(config, RecordingDelivery::failing(), 1).await;
    engine.start().await.unwrap();

    // 串行提交，保证失败次数连续累计
    for _ in 0..3 {
        let handle = engine
            .submit(Capability::Any, Priority::Normal, serde_json::json!({}))
            .await
            .unwrap();
        let outcome = handle.outcome().await.unwrap();
        assert!(!outcome.success);
    }

    let stats = engine.stats().await;
    assert_eq!(stats.account.store.banned, 1);

    // 唯一账号被封禁后，后续任务因资源耗尽失败
    let handle = engine
        .submit(Capability::Any, Priority::Normal, serde_json::json!({}))
        .await
        .unwrap();
    let outcome = handle.outcome().await.unwrap();
    assert!(!outcome.success);
    assert!(outcome.error.unwrap().contains("资源耗尽"));

    engine.stop().await;
}

#[tokio::test]
async fn test_invalid_config_rejected_at_assembly() {
    let mut config = FleetConfig::default();
    config.account.cooldown_every_uses = 0;
    let clock: SharedClock = Arc::new(ManualClock::starting_now());
    let err = FleetEngine::new(config, RecordingDelivery::ok(), clock).unwrap_err();
    assert!(matches!(err, FleetError::Configuration(_)));
}
