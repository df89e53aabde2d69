use std::sync::Arc;

use chrono::Duration;
use fleet_core::{FleetError, ManualClock, ProfileClass, SharedClock};
use uuid::Uuid;

use fleet_fingerprint::{ActionKind, FingerprintConfig, FingerprintIssuer};

fn seeded_issuer(clock: SharedClock) -> FingerprintIssuer {
    let config = FingerprintConfig {
        rng_seed: Some(42),
        ..Default::default()
    };
    FingerprintIssuer::new(config, clock)
}

#[tokio::test]
async fn test_validate_lifecycle() {
    let clock = Arc::new(ManualClock::starting_now());
    let issuer = seeded_issuer(clock.clone());

    let fp = issuer.create(ProfileClass::Mobile).await.unwrap();
    assert!(issuer.validate(fp.id).await);
    assert!(!issuer.validate(Uuid::new_v4()).await);

    // 轮换后旧指纹作废，新指纹同档位可用
    let replacement = issuer.rotate(fp.id).await.unwrap();
    assert!(!issuer.validate(fp.id).await);
    assert!(issuer.validate(replacement.id).await);
    assert_eq!(replacement.class, ProfileClass::Mobile);
    assert_ne!(replacement.id, fp.id);
}

#[tokio::test]
async fn test_validate_expires_after_ttl() {
    let clock = Arc::new(ManualClock::starting_now());
    let issuer = seeded_issuer(clock.clone());

    let fp = issuer.create(ProfileClass::Desktop).await.unwrap();
    clock.advance(Duration::hours(23));
    assert!(issuer.validate(fp.id).await);

    clock.advance(Duration::hours(2));
    assert!(!issuer.validate(fp.id).await);
}

#[tokio::test]
async fn test_headers_deterministic_and_device_consistent() {
    let clock: SharedClock = Arc::new(ManualClock::starting_now());
    let issuer = seeded_issuer(clock);

    let fp = issuer.create(ProfileClass::Mobile).await.unwrap();
    let first = issuer.headers_for(fp.id).await.unwrap();
    let second = issuer.headers_for(fp.id).await.unwrap();
    assert_eq!(first, second);

    assert_eq!(first["User-Agent"], fp.browser.user_agent);
    assert_eq!(first["Accept-Language"], fp.browser.language);
    assert_eq!(first["Sec-CH-UA-Mobile"], "?1");
    assert!(first.contains_key("Viewport-Width"));
    assert!(first.contains_key("Downlink"));
}

#[tokio::test]
async fn test_desktop_headers_omit_mobile_hints() {
    let clock: SharedClock = Arc::new(ManualClock::starting_now());
    let issuer = seeded_issuer(clock);

    let fp = issuer.create(ProfileClass::Desktop).await.unwrap();
    let headers = issuer.headers_for(fp.id).await.unwrap();
    assert_eq!(headers["Sec-CH-UA-Mobile"], "?0");
    assert!(!headers.contains_key("Viewport-Width"));
    assert!(!headers.contains_key("Save-Data"));
}

#[tokio::test]
async fn test_cookies_deterministic_per_fingerprint() {
    let clock: SharedClock = Arc::new(ManualClock::starting_now());
    let issuer = seeded_issuer(clock);

    let a = issuer.create(ProfileClass::Balanced).await.unwrap();
    let b = issuer.create(ProfileClass::Balanced).await.unwrap();

    let a1 = issuer.cookies_for(a.id).await.unwrap();
    let a2 = issuer.cookies_for(a.id).await.unwrap();
    assert_eq!(a1, a2);
    assert_eq!(a1["web_id"].len(), 19);
    assert_eq!(a1["csrf_token"].len(), 32);

    // 不同指纹推导出不同身份
    let b1 = issuer.cookies_for(b.id).await.unwrap();
    assert_ne!(a1["csrf_token"], b1["csrf_token"]);
}

#[tokio::test]
async fn test_rotated_fingerprint_stops_deriving_materials() {
    let clock: SharedClock = Arc::new(ManualClock::starting_now());
    let issuer = seeded_issuer(clock);

    let fp = issuer.create(ProfileClass::Balanced).await.unwrap();
    issuer.headers_for(fp.id).await.unwrap();
    issuer.rotate(fp.id).await.unwrap();

    // 作废后不再派生新请求头/Cookie/动作
    let err = issuer.headers_for(fp.id).await.unwrap_err();
    assert!(matches!(err, FleetError::StaleFingerprint { .. }));
    let err = issuer.cookies_for(fp.id).await.unwrap_err();
    assert!(matches!(err, FleetError::StaleFingerprint { .. }));
    let err = issuer.simulate(fp.id, ActionKind::Scroll).await.unwrap_err();
    assert!(matches!(err, FleetError::StaleFingerprint { .. }));
}

#[tokio::test]
async fn test_unknown_fingerprint_headers_error() {
    let clock: SharedClock = Arc::new(ManualClock::starting_now());
    let issuer = seeded_issuer(clock);

    let err = issuer.headers_for(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, FleetError::FingerprintNotFound { .. }));
}

#[tokio::test]
async fn test_simulation_reproducible_with_fixed_seed() {
    let clock: SharedClock = Arc::new(ManualClock::starting_now());

    let mut runs = Vec::new();
    for _ in 0..2 {
        let issuer = seeded_issuer(clock.clone());
        let fp = issuer.create(ProfileClass::Mobile).await.unwrap();
        let plan = issuer.simulate(fp.id, ActionKind::Watch).await.unwrap();
        runs.push(serde_json::to_string(&plan).unwrap());
    }
    assert_eq!(runs[0], runs[1]);
}

#[tokio::test]
async fn test_stats_track_rotation() {
    let clock: SharedClock = Arc::new(ManualClock::starting_now());
    let issuer = seeded_issuer(clock);

    let fp = issuer.create(ProfileClass::Balanced).await.unwrap();
    issuer.create(ProfileClass::Mobile).await.unwrap();
    issuer.rotate(fp.id).await.unwrap();

    let stats = issuer.stats().await;
    assert_eq!(stats.issued, 3);
    assert_eq!(stats.valid, 2);
    assert_eq!(stats.invalidated, 1);
}
