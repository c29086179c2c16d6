// A set: one file printed `count` times per job iteration.

use super::material::{self, MaterialView};
use super::record::{parse_counter, SetRecord};
use super::{ActiveProfile, Percent, QueueError};
use serde_json::Value;

/// Local identity of a set inside its job. Stable across replace-by-id and
/// valid for sets that have no server id yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SetHandle(pub(crate) u64);

#[derive(Debug, Clone)]
pub struct SetModel {
    handle: SetHandle,
    id: i64,
    sd: bool,
    path: String,
    count: Option<i64>,
    remaining: Option<i64>,
    completed: i64,
    missing_file: bool,
    expanded: bool,
    selected: bool,
    materials: Vec<String>,
    profiles: Vec<String>,
    metadata: Option<Value>,
    raw_metadata: Option<String>,
    count_at_focus: Option<Option<i64>>,
    profile: ActiveProfile,
}

impl SetModel {
    /// Build a set from a record. Metadata is parsed here, once; a record whose
    /// metadata isn't valid JSON is rejected.
    pub fn new(record: SetRecord, profile: ActiveProfile) -> Result<Self, QueueError> {
        let metadata = match record.metadata.as_deref() {
            Some(raw) if !raw.is_empty() => {
                Some(serde_json::from_str(raw).map_err(QueueError::Metadata)?)
            }
            _ => None,
        };
        Ok(Self {
            handle: SetHandle(0),
            id: record.id,
            sd: record.sd,
            path: record.path,
            count: record.count,
            remaining: record.remaining.or(record.count),
            completed: record.completed.unwrap_or(0),
            missing_file: record.missing_file.unwrap_or(false),
            expanded: record.expanded.unwrap_or(false),
            selected: false,
            materials: record.materials,
            profiles: record.profiles,
            metadata,
            raw_metadata: record.metadata,
            count_at_focus: None,
            profile,
        })
    }

    pub(crate) fn with_handle(mut self, handle: SetHandle) -> Self {
        self.handle = handle;
        self
    }

    pub fn handle(&self) -> SetHandle { self.handle }
    pub fn id(&self) -> i64 { self.id }
    pub fn sd(&self) -> bool { self.sd }
    pub fn path(&self) -> &str { &self.path }
    pub fn count(&self) -> Option<i64> { self.count }
    pub fn remaining(&self) -> Option<i64> { self.remaining }
    pub fn completed(&self) -> i64 { self.completed }
    pub fn missing_file(&self) -> bool { self.missing_file }
    pub fn expanded(&self) -> bool { self.expanded }
    pub fn selected(&self) -> bool { self.selected }
    pub fn materials(&self) -> &[String] { &self.materials }
    pub fn profiles(&self) -> &[String] { &self.profiles }
    pub fn metadata(&self) -> Option<&Value> { self.metadata.as_ref() }

    pub fn set_path(&mut self, path: impl Into<String>) {
        self.path = path.into();
    }

    pub fn set_sd(&mut self, sd: bool) {
        self.sd = sd;
    }

    pub fn set_count(&mut self, count: Option<i64>) {
        self.count = count;
    }

    /// Set the count from raw edit-field text; non-numeric text leaves the
    /// count indeterminate until it parses again.
    pub fn set_count_input(&mut self, input: &str) {
        self.count = parse_counter(input);
    }

    pub fn set_remaining(&mut self, remaining: Option<i64>) {
        self.remaining = remaining;
    }

    pub fn set_remaining_input(&mut self, input: &str) {
        self.remaining = parse_counter(input);
    }

    pub fn set_completed(&mut self, completed: i64) {
        self.completed = completed.max(0);
    }

    pub fn set_missing_file(&mut self, missing: bool) {
        self.missing_file = missing;
    }

    pub fn set_expanded(&mut self, expanded: bool) {
        self.expanded = expanded;
    }

    pub fn toggle_expanded(&mut self) {
        self.expanded = !self.expanded;
    }

    pub fn toggle_selected(&mut self) {
        self.selected = !self.selected;
    }

    /// File name without its directories; both `/` and `\` separate.
    pub fn short_name(&self) -> &str {
        self.path.rsplit(['/', '\\']).next().unwrap_or_default()
    }

    /// Whether this set may run on the active profile. No profiles means any.
    pub fn profile_matches(&self) -> bool {
        if self.profiles.is_empty() {
            return true;
        }
        match self.profile.borrow().as_deref() {
            Some(active) => self.profiles.iter().any(|p| p == active),
            None => false,
        }
    }

    /// Returns false if the profile was already listed.
    pub fn add_profile(&mut self, name: &str) -> bool {
        if self.profiles.iter().any(|p| p == name) {
            return false;
        }
        self.profiles.push(name.to_string());
        true
    }

    pub fn remove_profile(&mut self, name: &str) -> bool {
        let before = self.profiles.len();
        self.profiles.retain(|p| p != name);
        self.profiles.len() != before
    }

    /// Record as sent back to the API. Metadata is the string this set was
    /// built from, never re-encoded.
    pub fn serialize(&self) -> SetRecord {
        SetRecord {
            id: self.id,
            sd: self.sd,
            path: self.path.clone(),
            count: self.count,
            remaining: self.remaining,
            completed: None,
            missing_file: None,
            expanded: None,
            materials: self.materials.clone(),
            profiles: self.profiles.clone(),
            metadata: self.raw_metadata.clone(),
        }
    }

    /// Prints of this set left across the rest of the job. `None` while any
    /// counter is indeterminate or the product doesn't fit.
    pub fn length_remaining(&self, job_remaining: Option<i64>) -> Option<i64> {
        let count = self.count?;
        let remaining = self.remaining?;
        let later = job_remaining?.checked_sub(1)?.checked_mul(count)?;
        Some(later.checked_add(remaining)?.max(0))
    }

    pub fn on_count_focus(&mut self) {
        self.count_at_focus = Some(self.count);
    }

    /// A count change committed by leaving the field restarts this set's progress.
    pub fn on_count_blur(&mut self) {
        if let Some(before) = self.count_at_focus.take() {
            if before != self.count {
                tracing::debug!(set = self.id, count = ?self.count, "count changed, resetting remaining");
                self.remaining = self.count;
            }
        }
    }

    pub fn materials_view(&self) -> Vec<MaterialView> {
        self.materials.iter().map(|m| MaterialView::from_token(m)).collect()
    }

    /// Set the material for one tool slot. `"Any"` clears the slot. Returns
    /// false for slots past [`material::MAX_SLOTS`].
    pub fn set_material(&mut self, slot: usize, value: &str) -> bool {
        let ok = material::assign_slot(&mut self.materials, slot, value);
        if !ok {
            tracing::warn!(set = self.id, slot, "material slot out of range");
        }
        ok
    }

    pub fn completed_length(&self) -> i64 {
        self.completed
    }

    fn total(&self) -> Option<i64> {
        self.remaining.and_then(|r| self.completed.checked_add(r))
    }

    pub fn percent_complete(&self) -> Percent {
        match self.total() {
            Some(total) => {
                Percent::from_f64(100.0 * self.completed as f64 / total as f64).at_least_zero()
            }
            None => Percent::Indeterminate,
        }
    }

    /// Share of the bar taken by the print currently running: one print out
    /// of the total. A display approximation.
    pub fn percent_active(&self) -> Percent {
        match self.total() {
            Some(total) => Percent::from_f64(100.0 / total as f64).at_least_zero(),
            None => Percent::Indeterminate,
        }
    }

    pub fn progress_text(&self) -> String {
        match self.total() {
            Some(total) => format!("{}/{}", self.completed, total),
            None => format!("{}/{}", self.completed, Percent::Indeterminate),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::active_profile;

    fn set_from(json: &str) -> SetModel {
        let (_tx, rx) = active_profile(None);
        SetModel::new(serde_json::from_str(json).unwrap(), rx).unwrap()
    }

    #[test]
    fn test_defaults_from_record() {
        let set = set_from(r#"{"path": "a.gcode", "count": 3}"#);
        assert_eq!(set.id(), -1);
        assert_eq!(set.remaining(), Some(3));
        assert_eq!(set.completed(), 0);
        assert!(set.metadata().is_none());
    }

    #[test]
    fn test_short_name_splits_both_separators() {
        assert_eq!(set_from(r#"{"path": "dir/sub/a.gcode"}"#).short_name(), "a.gcode");
        assert_eq!(set_from(r#"{"path": "C:\\prints\\b.gcode"}"#).short_name(), "b.gcode");
        assert_eq!(set_from(r#"{"path": "mixed\\dir/c.gcode"}"#).short_name(), "c.gcode");
        assert_eq!(set_from(r#"{"path": "plain.gcode"}"#).short_name(), "plain.gcode");
    }

    #[test]
    fn test_percentages() {
        let set = set_from(r#"{"count": 4, "remaining": 1, "completed": 3}"#);
        assert_eq!(set.percent_complete().to_string(), "75%");
        assert_eq!(set.percent_active().to_string(), "25%");
        assert_eq!(set.progress_text(), "3/4");

        let empty = set_from(r#"{"count": 0, "remaining": 0, "completed": 0}"#);
        assert_eq!(empty.percent_complete(), Percent::Indeterminate);
        assert_eq!(empty.percent_active(), Percent::Indeterminate);
        assert_eq!(empty.progress_text(), "0/0");
    }

    #[test]
    fn test_length_remaining() {
        let set = set_from(r#"{"count": 4, "remaining": 2}"#);
        assert_eq!(set.length_remaining(Some(3)), Some(10));
        assert_eq!(set.length_remaining(Some(0)), Some(0));
        assert_eq!(set.length_remaining(None), None);
    }

    #[test]
    fn test_count_blur_resets_remaining_only_on_change() {
        let mut set = set_from(r#"{"count": 4, "remaining": 2}"#);
        set.on_count_focus();
        set.on_count_blur();
        assert_eq!(set.remaining(), Some(2));

        set.on_count_focus();
        set.set_count_input("");
        set.set_count_input("6");
        set.on_count_blur();
        assert_eq!(set.remaining(), Some(6));
    }

    #[test]
    fn test_counter_overflow_is_indeterminate() {
        let set = set_from(r#"{"count": 2, "remaining": 9223372036854775807, "completed": 1}"#);
        assert_eq!(set.percent_complete(), Percent::Indeterminate);
        assert_eq!(set.percent_active(), Percent::Indeterminate);
        assert_eq!(set.progress_text(), "1/—");

        let set = set_from(r#"{"count": 4294967296, "remaining": 1}"#);
        assert_eq!(set.length_remaining(Some(4294967297)), None);
        assert_eq!(set.length_remaining(Some(i64::MIN)), None);
        assert_eq!(set.length_remaining(Some(2)), Some(4294967297));
    }

    #[test]
    fn test_invalid_metadata_is_rejected() {
        let (_tx, rx) = active_profile(None);
        let record = SetRecord { metadata: Some("{not json".into()), ..SetRecord::new("a", 1) };
        assert!(matches!(SetModel::new(record, rx), Err(QueueError::Metadata(_))));
    }
}
