//! # fleet-core
//!
//! 投放引擎的共享基础模块
//!
//! 本模块提供：
//! - 统一错误类型定义
//! - 共享类型别名和能力匹配表
//! - 领域模型（任务、工作者、账号、指纹、租约）
//! - 可注入时钟抽象
//! - 执行器与快照存储trait定义

pub mod clock;
pub mod errors;
pub mod models;
pub mod traits;
pub mod types;

pub use clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use errors::{FleetError, FleetResult};
pub use models::*;
pub use traits::*;
pub use types::*;
