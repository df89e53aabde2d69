//! 由行为档案生成动作参数

use rand::Rng;
use serde::{Deserialize, Serialize};

use fleet_core::BehaviorProfile;

/// 可模拟的动作类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Scroll,
    Click,
    Watch,
}

/// 一次动作的完整参数
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ActionPlan {
    Scroll {
        delay_secs: f64,
        distance_px: u32,
        smooth: bool,
    },
    Click {
        delay_secs: f64,
        x: u32,
        y: u32,
        double_click: bool,
    },
    Watch {
        duration_secs: f64,
        interactions: Vec<Interaction>,
    },
}

/// 观看期间穿插的互动
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interaction {
    pub kind: InteractionKind,
    /// 相对观看起点的触发时刻（秒）
    pub at_secs: f64,
    pub duration_secs: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionKind {
    Like,
    CommentView,
    ShareClick,
}

/// 指数分布延迟：均值为mean，长尾贴近真人停顿
fn exponential_delay(rng: &mut impl Rng, mean: f64) -> f64 {
    -mean * (1.0 - rng.random::<f64>()).ln()
}

pub(crate) fn simulate(
    profile: &BehaviorProfile,
    action: ActionKind,
    rng: &mut impl Rng,
) -> ActionPlan {
    match action {
        ActionKind::Scroll => ActionPlan::Scroll {
            delay_secs: exponential_delay(rng, profile.click_delay_secs),
            distance_px: (rng.random_range(200.0..600.0) * profile.scroll_speed) as u32,
            smooth: rng.random_bool(0.8),
        },
        ActionKind::Click => ActionPlan::Click {
            delay_secs: exponential_delay(rng, profile.click_delay_secs),
            x: rng.random_range(100..900),
            y: rng.random_range(200..1600),
            double_click: rng.random_bool(0.05),
        },
        ActionKind::Watch => {
            let base = rng.random_range(15.0..60.0);
            let duration_secs = base * profile.watch_time_multiplier;
            let interactions = sample_interactions(profile, duration_secs, rng);
            ActionPlan::Watch {
                duration_secs,
                interactions,
            }
        }
    }
}

fn sample_interactions(
    profile: &BehaviorProfile,
    duration_secs: f64,
    rng: &mut impl Rng,
) -> Vec<Interaction> {
    let mut interactions = Vec::new();
    if !rng.random_bool(profile.interaction_probability) {
        return interactions;
    }
    if rng.random_bool(0.3) {
        interactions.push(Interaction {
            kind: InteractionKind::Like,
            at_secs: rng.random_range(0.2..0.9) * duration_secs,
            duration_secs: 0.5,
        });
    }
    if rng.random_bool(0.2) {
        interactions.push(Interaction {
            kind: InteractionKind::CommentView,
            at_secs: rng.random_range(0.3..0.8) * duration_secs,
            duration_secs: rng.random_range(2.0..8.0),
        });
    }
    if rng.random_bool(0.1) {
        interactions.push(Interaction {
            kind: InteractionKind::ShareClick,
            at_secs: rng.random_range(0.5..0.95) * duration_secs,
            duration_secs: 1.0,
        });
    }
    interactions
}
