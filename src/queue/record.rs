//! Wire records exchanged with the queue API.
//!
//! Counters are lenient on input: integers, floats and numeric strings are all
//! accepted, anything else becomes `None` (an indeterminate counter).

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Id carried by jobs and sets that were never persisted.
pub const UNSAVED_ID: i64 = -1;

/// Queue a job lands in when the record doesn't name one.
pub const DEFAULT_QUEUE: &str = "default";

/// A job as sent to and returned from the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    #[serde(default = "default_id")]
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub draft: Option<bool>,
    #[serde(default = "default_job_counter", deserialize_with = "lenient_counter")]
    pub count: Option<i64>,
    #[serde(default = "default_job_counter", deserialize_with = "lenient_counter")]
    pub remaining: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue: Option<String>,
    #[serde(default)]
    pub sets: Vec<SetRecord>,
}

impl Default for JobRecord {
    fn default() -> Self {
        Self {
            id: default_id(),
            name: String::new(),
            draft: None,
            count: default_job_counter(),
            remaining: default_job_counter(),
            queue: None,
            sets: Vec::new(),
        }
    }
}

/// A set as sent to and returned from the API.
///
/// `remaining` and `completed` are optional on input: a missing `remaining`
/// defaults to `count`, a missing `completed` to zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetRecord {
    #[serde(default = "default_id")]
    pub id: i64,
    #[serde(default)]
    pub sd: bool,
    #[serde(default)]
    pub path: String,
    #[serde(default, deserialize_with = "lenient_counter")]
    pub count: Option<i64>,
    #[serde(default, deserialize_with = "lenient_counter")]
    pub remaining: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_counter")]
    pub completed: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub missing_file: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expanded: Option<bool>,
    #[serde(default, deserialize_with = "lenient_materials")]
    pub materials: Vec<String>,
    #[serde(default)]
    pub profiles: Vec<String>,
    /// JSON-encoded metadata string, kept verbatim.
    #[serde(default)]
    pub metadata: Option<String>,
}

impl Default for SetRecord {
    fn default() -> Self {
        Self {
            id: default_id(),
            sd: false,
            path: String::new(),
            count: None,
            remaining: None,
            completed: None,
            missing_file: None,
            expanded: None,
            materials: Vec::new(),
            profiles: Vec::new(),
            metadata: None,
        }
    }
}

impl SetRecord {
    pub fn new(path: impl Into<String>, count: i64) -> Self {
        Self {
            path: path.into(),
            count: Some(count),
            ..Default::default()
        }
    }
}

fn default_id() -> i64 { UNSAVED_ID }
fn default_job_counter() -> Option<i64> { Some(1) }

/// Parse a counter the way an edit field would: leading/trailing whitespace is
/// ignored and anything that isn't an integer is indeterminate.
pub fn parse_counter(input: &str) -> Option<i64> {
    let trimmed = input.trim();
    if let Ok(v) = trimmed.parse::<i64>() {
        return Some(v);
    }
    match trimmed.parse::<f64>() {
        Ok(f) if f.is_finite() => Some(f.trunc() as i64),
        _ => None,
    }
}

fn lenient_counter<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(s) => parse_counter(&s),
        _ => None,
    })
}

fn lenient_materials<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Vec<Option<String>>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(Option::unwrap_or_default)
        .collect())
}
