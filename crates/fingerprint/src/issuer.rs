use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::sync::{Mutex, RwLock};
use tracing::debug;
use uuid::Uuid;

use fleet_core::{
    Fingerprint, FingerprintId, FleetError, FleetResult, ProfileClass, SharedClock,
};

use crate::behavior::{self, ActionKind, ActionPlan};
use crate::profiles;

/// 指纹签发配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FingerprintConfig {
    /// 指纹有效期（小时）
    pub ttl_hours: i64,
    /// 固定随机种子，仅用于可复现测试；生产环境留空
    pub rng_seed: Option<u64>,
}

impl Default for FingerprintConfig {
    fn default() -> Self {
        Self {
            ttl_hours: 24, // 24小时后轮换
            rng_seed: None,
        }
    }
}

impl FingerprintConfig {
    pub fn validate(&self) -> FleetResult<()> {
        if self.ttl_hours <= 0 {
            return Err(FleetError::config_error("ttl_hours 必须大于0"));
        }
        Ok(())
    }
}

/// 签发统计
#[derive(Debug, Clone, Serialize)]
pub struct IssuerStats {
    pub issued: usize,
    pub valid: usize,
    pub invalidated: usize,
}

/// 指纹签发器
///
/// 持有全部已签发指纹的注册表。指纹一经签发不可变，
/// 推导出的请求头与Cookie对同一ID永远一致。
pub struct FingerprintIssuer {
    config: FingerprintConfig,
    store: RwLock<HashMap<FingerprintId, Fingerprint>>,
    rng: Mutex<StdRng>,
    clock: SharedClock,
}

impl FingerprintIssuer {
    pub fn new(config: FingerprintConfig, clock: SharedClock) -> Self {
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            config,
            store: RwLock::new(HashMap::new()),
            rng: Mutex::new(rng),
            clock,
        }
    }

    /// 签发新指纹：四个子档案独立采样
    pub async fn create(&self, class: ProfileClass) -> FleetResult<Fingerprint> {
        let (device, browser, network, behavior) = {
            let mut rng = self.rng.lock().await;
            let device = profiles::sample_device(&mut *rng, class);
            let browser = profiles::sample_browser(&mut *rng, &device);
            let network = profiles::sample_network(&mut *rng);
            let behavior = profiles::sample_behavior(&mut *rng);
            (device, browser, network, behavior)
        };

        let digest = {
            let canonical =
                serde_json::to_vec(&(&device, &browser, &network, &behavior))?;
            format!("{:x}", Sha256::digest(&canonical))
        };

        let fingerprint = Fingerprint {
            id: Uuid::new_v4(),
            class,
            device,
            browser,
            network,
            behavior,
            digest,
            created_at: self.clock.now(),
            invalidated: false,
        };
        debug!(fingerprint_id = %fingerprint.id, ?class, "签发新指纹");
        self.store
            .write()
            .await
            .insert(fingerprint.id, fingerprint.clone());
        Ok(fingerprint)
    }

    pub async fn get(&self, id: FingerprintId) -> Option<Fingerprint> {
        self.store.read().await.get(&id).cloned()
    }

    /// 指纹是否仍可用于新请求
    ///
    /// 未知、已显式作废或超过TTL的指纹都返回false；在途使用不受影响。
    pub async fn validate(&self, id: FingerprintId) -> bool {
        let store = self.store.read().await;
        let Some(fp) = store.get(&id) else {
            return false;
        };
        if fp.invalidated {
            return false;
        }
        fp.age_hours(self.clock.now()) <= self.config.ttl_hours as f64
    }

    /// 作废旧指纹并签发同档位的新指纹
    ///
    /// 旧ID未知时不报错：轮换的意义就是换一个干净身份。
    pub async fn rotate(&self, old_id: FingerprintId) -> FleetResult<Fingerprint> {
        let class = {
            let mut store = self.store.write().await;
            match store.get_mut(&old_id) {
                Some(old) => {
                    old.invalidated = true;
                    old.class
                }
                None => ProfileClass::Balanced,
            }
        };
        debug!(%old_id, "轮换指纹");
        self.create(class).await
    }

    /// 由存储的档案确定性推导HTTP请求头
    ///
    /// 已作废的指纹不再派生新材料；在途请求持有的已派生材料不受影响。
    pub async fn headers_for(&self, id: FingerprintId) -> FleetResult<HashMap<String, String>> {
        let store = self.store.read().await;
        let fp = store
            .get(&id)
            .ok_or_else(|| FleetError::fingerprint_not_found(id.to_string()))?;
        ensure_live(fp)?;

        let mut headers = HashMap::new();
        headers.insert("User-Agent".into(), fp.browser.user_agent.clone());
        headers.insert(
            "Accept".into(),
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8".into(),
        );
        headers.insert("Accept-Language".into(), fp.browser.language.clone());
        headers.insert("Accept-Encoding".into(), "gzip, deflate, br".into());
        headers.insert("Connection".into(), "keep-alive".into());
        headers.insert("Upgrade-Insecure-Requests".into(), "1".into());
        headers.insert("Sec-Fetch-Dest".into(), "document".into());
        headers.insert("Sec-Fetch-Mode".into(), "navigate".into());
        headers.insert("Sec-Fetch-Site".into(), "none".into());
        headers.insert("Sec-Fetch-User".into(), "?1".into());
        headers.insert("Cache-Control".into(), "max-age=0".into());
        headers.insert(
            "Sec-CH-UA-Platform".into(),
            format!("\"{}\"", fp.browser.platform),
        );

        if fp.device.is_mobile() {
            headers.insert("Sec-CH-UA-Mobile".into(), "?1".into());
            headers.insert("Viewport-Width".into(), fp.device.screen_width.to_string());
            headers.insert(
                "Device-Memory".into(),
                fp.browser.device_memory_gb.to_string(),
            );
            headers.insert("Downlink".into(), format!("{:.1}", fp.network.downlink_mbps));
            headers.insert("RTT".into(), fp.network.rtt_ms.to_string());
            headers.insert(
                "Save-Data".into(),
                if fp.network.save_data { "on" } else { "off" }.into(),
            );
        } else {
            headers.insert("Sec-CH-UA-Mobile".into(), "?0".into());
        }
        Ok(headers)
    }

    /// 由指纹ID与摘要确定性推导Cookie
    pub async fn cookies_for(&self, id: FingerprintId) -> FleetResult<HashMap<String, String>> {
        let store = self.store.read().await;
        let fp = store
            .get(&id)
            .ok_or_else(|| FleetError::fingerprint_not_found(id.to_string()))?;
        ensure_live(fp)?;

        let n = id.as_u128();
        let mut cookies = HashMap::new();
        cookies.insert("web_id".into(), format!("{:019}", n % 10u128.pow(19)));
        cookies.insert(
            "web_id_v2".into(),
            format!("{:019}", (n >> 64) % 10u128.pow(19)),
        );
        cookies.insert("csrf_token".into(), fp.digest[..32].to_string());
        cookies.insert("session_tag".into(), fp.digest[32..48].to_string());
        Ok(cookies)
    }

    /// 生成与行为档案一致的动作参数
    ///
    /// 参数化随机，不是学习模型；固定种子下完全可复现。
    pub async fn simulate(
        &self,
        id: FingerprintId,
        action: ActionKind,
    ) -> FleetResult<ActionPlan> {
        let behavior = {
            let store = self.store.read().await;
            let fp = store
                .get(&id)
                .ok_or_else(|| FleetError::fingerprint_not_found(id.to_string()))?;
            ensure_live(fp)?;
            fp.behavior.clone()
        };
        let mut rng = self.rng.lock().await;
        Ok(behavior::simulate(&behavior, action, &mut *rng))
    }

    pub async fn stats(&self) -> IssuerStats {
        let store = self.store.read().await;
        let now = self.clock.now();
        let ttl = self.config.ttl_hours as f64;
        let mut stats = IssuerStats {
            issued: store.len(),
            valid: 0,
            invalidated: 0,
        };
        for fp in store.values() {
            if fp.invalidated {
                stats.invalidated += 1;
            } else if fp.age_hours(now) <= ttl {
                stats.valid += 1;
            }
        }
        stats
    }
}

/// 作废的指纹不再派生任何新材料
fn ensure_live(fp: &Fingerprint) -> FleetResult<()> {
    if fp.invalidated {
        return Err(FleetError::StaleFingerprint {
            id: fp.id.to_string(),
        });
    }
    Ok(())
}
