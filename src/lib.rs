// printqueue-rs: client-side model of a print queue of jobs and sets

pub mod api;
pub mod config;
pub mod queue;

pub use api::{ApiError, EntityKind, MemoryApi, QueueApi};
pub use config::{load_config, ConfigError, QueueConfig};
pub use queue::{
    active_profile, ActiveProfile, JobMetrics, JobModel, JobRecord, MaterialView, Percent,
    QueueError, SetHandle, SetModel, SetRecord,
};
