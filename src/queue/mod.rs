//! Job/set queue model: records, derived progress metrics and the
//! draft/commit lifecycle.

pub mod job;
pub mod material;
pub mod record;
pub mod set;

pub use job::{JobMetrics, JobModel, JobModelBuilder};
pub use material::MaterialView;
pub use record::{JobRecord, SetRecord, DEFAULT_QUEUE, UNSAVED_ID};
pub use set::{SetHandle, SetModel};

use crate::api::ApiError;
use std::fmt;
use thiserror::Error;
use tokio::sync::watch;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("an API collaborator must be provided when creating a job")]
    MissingApi,
    #[error("invalid set metadata: {0}")]
    Metadata(serde_json::Error),
    #[error("failed to serialize job: {0}")]
    Serialize(serde_json::Error),
    #[error("API error: {0}")]
    Api(#[from] ApiError),
}

/// Read side of the currently active printer profile.
pub type ActiveProfile = watch::Receiver<Option<String>>;

/// Create an active-profile channel. The sender switches profiles; every model
/// holding a receiver sees the change on its next read.
pub fn active_profile(initial: Option<String>) -> (watch::Sender<Option<String>>, ActiveProfile) {
    watch::channel(initial)
}

/// A rounded percentage, or `Indeterminate` when the denominator was zero or a
/// counter was unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Percent {
    Value(i64),
    Indeterminate,
}

impl Percent {
    /// Rounds half up, like a browser's `Math.round`.
    pub fn from_f64(value: f64) -> Self {
        if value.is_finite() {
            Percent::Value((value + 0.5).floor() as i64)
        } else {
            Percent::Indeterminate
        }
    }

    pub fn at_least_zero(self) -> Self {
        match self {
            Percent::Value(v) => Percent::Value(v.max(0)),
            Percent::Indeterminate => Percent::Indeterminate,
        }
    }

    pub fn value(self) -> Option<i64> {
        match self {
            Percent::Value(v) => Some(v),
            Percent::Indeterminate => None,
        }
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Percent::Value(v) => write!(f, "{}%", v),
            Percent::Indeterminate => f.write_str("—"),
        }
    }
}
