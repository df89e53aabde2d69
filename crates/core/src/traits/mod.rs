pub mod executor;
pub mod snapshot;

pub use executor::{DeliveryExecutor, ExecutionContext, TaskExecutor};
pub use snapshot::AccountSnapshotStore;
