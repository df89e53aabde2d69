//! 子档案的来源数据表与采样逻辑

use rand::Rng;

use fleet_core::{
    BehaviorProfile, BrowserProfile, ConnectionType, DeviceProfile, DeviceType, NetworkProfile,
    ProfileClass,
};

const APPLE_MODELS: [&str; 5] = ["iPhone 14", "iPhone 13", "iPhone 12", "iPhone 11", "iPhone SE"];
const SAMSUNG_MODELS: [&str; 5] = ["Galaxy S23", "Galaxy S22", "Galaxy S21", "Galaxy A54", "Galaxy A34"];
const GOOGLE_MODELS: [&str; 4] = ["Pixel 7", "Pixel 6", "Pixel 5", "Pixel 4a"];
const XIAOMI_MODELS: [&str; 4] = ["Redmi Note 12", "Redmi Note 11", "Xiaomi 13", "Xiaomi 12"];

const IOS_VERSIONS: [&str; 5] = ["16.6", "16.5", "16.4", "16.3", "16.2"];
const ANDROID_VERSIONS: [&str; 4] = ["13", "12", "11", "10"];

const APPLE_RESOLUTIONS: [(u32, u32); 4] =
    [(1170, 2532), (1284, 2778), (1080, 2340), (828, 1792)];
const ANDROID_RESOLUTIONS: [(u32, u32); 3] = [(1080, 2400), (1440, 3200), (720, 1600)];

const DESKTOP_OS: [(&str, &[&str]); 3] = [
    ("Windows", &["Windows 11", "Windows 10", "Windows 8.1"]),
    ("Mac", &["macOS Ventura", "macOS Monterey", "macOS Big Sur"]),
    ("Linux", &["Ubuntu 22.04", "Ubuntu 20.04", "Debian 11"]),
];
const DESKTOP_RESOLUTIONS: [(u32, u32); 5] = [
    (1920, 1080),
    (2560, 1440),
    (3840, 2160),
    (1366, 768),
    (1536, 864),
];

const CHROME_VERSIONS: [&str; 5] = ["120", "119", "118", "117", "116"];
const FIREFOX_VERSIONS: [&str; 5] = ["120", "119", "118", "117", "116"];
const SAFARI_VERSIONS: [&str; 4] = ["16.6", "16.5", "16.4", "16.3"];

const LANGUAGES: [&str; 5] = ["en-US", "en-GB", "es-ES", "fr-FR", "de-DE"];
const CONCURRENCY: [u8; 4] = [4, 6, 8, 12];
const MEMORY_GB: [u8; 3] = [4, 8, 16];


/// 等概率取一项；调用方保证切片非空
fn pick<'a, T>(rng: &mut impl Rng, items: &'a [T]) -> &'a T {
    &items[rng.random_range(0..items.len())]
}

/// 采样设备子档案
pub(crate) fn sample_device(rng: &mut impl Rng, class: ProfileClass) -> DeviceProfile {
    let mobile = match class {
        ProfileClass::Mobile => true,
        ProfileClass::Desktop => false,
        ProfileClass::Balanced => rng.random_bool(0.5),
    };
    if mobile {
        sample_mobile_device(rng)
    } else {
        sample_desktop_device(rng)
    }
}

fn sample_mobile_device(rng: &mut impl Rng) -> DeviceProfile {
    let (brand, model) = match rng.random_range(0..4) {
        0 => ("Apple", *pick(rng, &APPLE_MODELS)),
        1 => ("Samsung", *pick(rng, &SAMSUNG_MODELS)),
        2 => ("Google", *pick(rng, &GOOGLE_MODELS)),
        _ => ("Xiaomi", *pick(rng, &XIAOMI_MODELS)),
    };
    let (os_name, os_version, resolution) = if brand == "Apple" {
        (
            "iOS",
            *pick(rng, &IOS_VERSIONS),
            *pick(rng, &APPLE_RESOLUTIONS),
        )
    } else {
        (
            "Android",
            *pick(rng, &ANDROID_VERSIONS),
            *pick(rng, &ANDROID_RESOLUTIONS),
        )
    };
    DeviceProfile {
        device_type: DeviceType::Mobile,
        brand: brand.to_string(),
        model: model.to_string(),
        os_name: os_name.to_string(),
        os_version: os_version.to_string(),
        screen_width: resolution.0,
        screen_height: resolution.1,
        device_pixel_ratio: *pick(rng, &[2u8, 3]),
        touch_support: true,
    }
}

fn sample_desktop_device(rng: &mut impl Rng) -> DeviceProfile {
    let (os_name, versions) = *pick(rng, &DESKTOP_OS);
    let os_version = *pick(rng, versions);
    let resolution = *pick(rng, &DESKTOP_RESOLUTIONS);
    DeviceProfile {
        device_type: DeviceType::Desktop,
        brand: os_name.to_string(),
        model: "Desktop".to_string(),
        os_name: os_name.to_string(),
        os_version: os_version.to_string(),
        screen_width: resolution.0,
        screen_height: resolution.1,
        device_pixel_ratio: 1,
        touch_support: false,
    }
}

/// 采样浏览器子档案，与设备类型保持一致
pub(crate) fn sample_browser(rng: &mut impl Rng, device: &DeviceProfile) -> BrowserProfile {
    let name = if device.is_mobile() {
        if device.os_name == "iOS" {
            "Safari"
        } else {
            "Chrome"
        }
    } else {
        *pick(rng, &["Chrome", "Firefox", "Safari"])
    };

    let (version, user_agent, platform) = match name {
        "Chrome" => {
            let version = *pick(rng, &CHROME_VERSIONS);
            let (os_part, platform) = chrome_os_part(rng, device);
            (
                version,
                format!(
                    "Mozilla/5.0 ({os_part}) AppleWebKit/537.36 (KHTML, like Gecko) \
                     Chrome/{version}.0.0.0 Safari/537.36"
                ),
                platform,
            )
        }
        "Firefox" => {
            let version = *pick(rng, &FIREFOX_VERSIONS);
            (
                version,
                format!(
                    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:{version}.0) \
                     Gecko/20100101 Firefox/{version}.0"
                ),
                "Win32",
            )
        }
        _ => {
            let version = *pick(rng, &SAFARI_VERSIONS);
            if device.is_mobile() {
                (
                    version,
                    format!(
                        "Mozilla/5.0 (iPhone; CPU iPhone OS 16_6 like Mac OS X) \
                         AppleWebKit/605.1.15 (KHTML, like Gecko) Version/{version} \
                         Mobile/15E148 Safari/604.1"
                    ),
                    "iPhone",
                )
            } else {
                (
                    version,
                    format!(
                        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
                         AppleWebKit/605.1.15 (KHTML, like Gecko) Version/{version} \
                         Safari/605.1.15"
                    ),
                    "MacIntel",
                )
            }
        }
    };

    BrowserProfile {
        name: name.to_string(),
        version: version.to_string(),
        user_agent,
        language: pick(rng, &LANGUAGES).to_string(),
        platform: platform.to_string(),
        hardware_concurrency: *pick(rng, &CONCURRENCY),
        device_memory_gb: *pick(rng, &MEMORY_GB),
    }
}

fn chrome_os_part(rng: &mut impl Rng, device: &DeviceProfile) -> (String, &'static str) {
    if device.is_mobile() {
        (
            format!("Linux; Android {}; {}", device.os_version, device.model),
            "Linux armv8l",
        )
    } else {
        match rng.random_range(0..3) {
            0 => ("Windows NT 10.0; Win64; x64".to_string(), "Win32"),
            1 => ("Macintosh; Intel Mac OS X 10_15_7".to_string(), "MacIntel"),
            _ => ("X11; Linux x86_64".to_string(), "Linux x86_64"),
        }
    }
}

/// 采样网络子档案，基准带宽和延迟带±20%抖动
pub(crate) fn sample_network(rng: &mut impl Rng) -> NetworkProfile {
    let (connection, downlink, rtt) = match rng.random_range(0..4) {
        0 => (ConnectionType::Wifi, 50.0, 50u32),
        1 => (ConnectionType::Cellular4g, 20.0, 100),
        2 => (ConnectionType::Cellular3g, 5.0, 200),
        _ => (ConnectionType::Ethernet, 100.0, 30),
    };
    let jitter = rng.random_range(0.8..1.2);
    NetworkProfile {
        connection,
        downlink_mbps: downlink * jitter,
        rtt_ms: (rtt as f64 * rng.random_range(0.8..1.2)) as u32,
        save_data: rng.random_bool(0.5),
    }
}

/// 采样行为子档案
pub(crate) fn sample_behavior(rng: &mut impl Rng) -> BehaviorProfile {
    match rng.random_range(0..3) {
        0 => BehaviorProfile {
            name: "casual_scroller".to_string(),
            scroll_speed: rng.random_range(1.0..3.0),
            click_delay_secs: rng.random_range(0.5..2.0),
            watch_time_multiplier: rng.random_range(0.8..1.2),
            interaction_probability: 0.3,
        },
        1 => BehaviorProfile {
            name: "engaged_viewer".to_string(),
            scroll_speed: rng.random_range(0.5..1.5),
            click_delay_secs: rng.random_range(0.2..0.8),
            watch_time_multiplier: rng.random_range(1.5..2.5),
            interaction_probability: 0.7,
        },
        _ => BehaviorProfile {
            name: "fast_scroller".to_string(),
            scroll_speed: rng.random_range(3.0..5.0),
            click_delay_secs: rng.random_range(0.1..0.5),
            watch_time_multiplier: rng.random_range(0.5..1.0),
            interaction_probability: 0.1,
        },
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn test_mobile_class_always_yields_mobile_device() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let device = sample_device(&mut rng, ProfileClass::Mobile);
            assert!(device.is_mobile());
            assert!(device.touch_support);
        }
    }

    #[test]
    fn test_desktop_class_always_yields_desktop_device() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let device = sample_device(&mut rng, ProfileClass::Desktop);
            assert!(!device.is_mobile());
        }
    }

    #[test]
    fn test_browser_matches_device_os() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..50 {
            let device = sample_device(&mut rng, ProfileClass::Mobile);
            let browser = sample_browser(&mut rng, &device);
            if device.os_name == "iOS" {
                assert_eq!(browser.name, "Safari");
            } else {
                assert_eq!(browser.name, "Chrome");
            }
        }
    }

    #[test]
    fn test_sampling_is_reproducible_with_seed() {
        let mut a = StdRng::seed_from_u64(42);
        let mut b = StdRng::seed_from_u64(42);
        let da = sample_device(&mut a, ProfileClass::Balanced);
        let db = sample_device(&mut b, ProfileClass::Balanced);
        assert_eq!(da.model, db.model);
        assert_eq!(da.os_version, db.os_version);
    }
}
