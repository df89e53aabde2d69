//! # fleet-fingerprint
//!
//! 合成客户端身份指纹的签发与行为模拟。
//!
//! 指纹由设备、浏览器、网络、行为四个独立采样的子档案组成，
//! 固定TTL（默认24小时）后失效，只能整体轮换、不能修改。
//! 同一指纹ID推导出的请求头和Cookie永远一致，以维持会话连续性。

pub mod behavior;
pub mod issuer;
mod profiles;

pub use behavior::{ActionKind, ActionPlan, Interaction, InteractionKind};
pub use issuer::{FingerprintConfig, FingerprintIssuer, IssuerStats};
