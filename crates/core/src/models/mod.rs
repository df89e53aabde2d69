pub mod account;
pub mod fingerprint;
pub mod task;
pub mod worker;

pub use account::{Account, AccountState, Credentials, Lease};
pub use fingerprint::{
    BehaviorProfile, BrowserProfile, ConnectionType, DeviceProfile, DeviceType, Fingerprint,
    NetworkProfile, ProfileClass,
};
pub use task::{Task, TaskOutcome, TaskSpec};
pub use worker::{ResourceUsage, WorkerInfo, WorkerStatus};
