//! A job: an ordered list of sets, repeated `count` times as a whole.
//!
//! Aggregates are recomputed on read and also pushed to [`JobModel::subscribe`]
//! receivers after every mutation, so observers never see stale totals.

use super::record::{parse_counter, JobRecord, SetRecord, DEFAULT_QUEUE, UNSAVED_ID};
use super::set::{SetHandle, SetModel};
use super::{active_profile, ActiveProfile, Percent, QueueError};
use crate::api::{CommitRequest, EditRequest, EntityKind, QueueApi};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Weight a selected job contributes to its own selection fraction.
const JOB_SELECTION_WEIGHT: f64 = 0.1;

/// Aggregates published after every change to a job.
#[derive(Debug, Clone, PartialEq)]
pub struct JobMetrics {
    pub total_length: i64,
    pub total_completed: i64,
    pub selection_fraction: f64,
    pub percent_complete: Percent,
    pub draft: bool,
    pub sets: usize,
}

pub struct JobModel {
    id: i64,
    name: String,
    draft: bool,
    count: Option<i64>,
    remaining: Option<i64>,
    queue: String,
    selected: bool,
    sets: Vec<SetModel>,
    next_handle: u64,
    api: Arc<dyn QueueApi>,
    profile: ActiveProfile,
    metrics: watch::Sender<JobMetrics>,
}

impl std::fmt::Debug for JobModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobModel")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("draft", &self.draft)
            .field("count", &self.count)
            .field("remaining", &self.remaining)
            .field("queue", &self.queue)
            .field("sets", &self.sets)
            .finish_non_exhaustive()
    }
}

/// Builder for [`JobModel`]; fails at `build` if no API was supplied.
pub struct JobModelBuilder {
    record: JobRecord,
    api: Option<Arc<dyn QueueApi>>,
    profile: Option<ActiveProfile>,
}

impl JobModelBuilder {
    pub fn api(mut self, api: Arc<dyn QueueApi>) -> Self {
        self.api = Some(api);
        self
    }

    pub fn profile(mut self, profile: ActiveProfile) -> Self {
        self.profile = Some(profile);
        self
    }

    pub fn build(self) -> Result<JobModel, QueueError> {
        let api = self.api.ok_or(QueueError::MissingApi)?;
        let profile = self.profile.unwrap_or_else(|| active_profile(None).1);
        JobModel::new(self.record, api, profile)
    }
}

impl JobModel {
    pub fn builder(record: JobRecord) -> JobModelBuilder {
        JobModelBuilder { record, api: None, profile: None }
    }

    pub fn new(record: JobRecord, api: Arc<dyn QueueApi>, profile: ActiveProfile) -> Result<Self, QueueError> {
        let (sets, next_handle) = build_sets(record.sets, &profile, 0)?;
        let (metrics, _) = watch::channel(JobMetrics {
            total_length: 0,
            total_completed: 0,
            selection_fraction: 0.0,
            percent_complete: Percent::Indeterminate,
            draft: false,
            sets: 0,
        });
        let job = Self {
            id: record.id,
            name: record.name,
            draft: record.draft.unwrap_or(false),
            count: record.count,
            remaining: record.remaining,
            queue: record.queue.unwrap_or_else(|| DEFAULT_QUEUE.to_string()),
            selected: false,
            sets,
            next_handle,
            api,
            profile,
            metrics,
        };
        job.publish();
        Ok(job)
    }

    pub fn id(&self) -> i64 { self.id }
    pub fn name(&self) -> &str { &self.name }
    pub fn draft(&self) -> bool { self.draft }
    pub fn count(&self) -> Option<i64> { self.count }
    pub fn remaining(&self) -> Option<i64> { self.remaining }
    pub fn queue(&self) -> &str { &self.queue }
    pub fn selected(&self) -> bool { self.selected }
    pub fn sets(&self) -> &[SetModel] { &self.sets }
    pub fn is_persisted(&self) -> bool { self.id != UNSAVED_ID }

    pub fn set(&self, handle: SetHandle) -> Option<&SetModel> {
        self.sets.iter().find(|s| s.handle() == handle)
    }

    /// Sets runnable on the active profile, in execution order.
    pub fn visible_sets(&self) -> impl Iterator<Item = &SetModel> {
        self.sets.iter().filter(|s| s.profile_matches())
    }

    /// Receiver that always holds the latest aggregates.
    pub fn subscribe(&self) -> watch::Receiver<JobMetrics> {
        self.metrics.subscribe()
    }

    pub fn metrics(&self) -> JobMetrics {
        JobMetrics {
            total_length: self.total_length(),
            total_completed: self.total_completed(),
            selection_fraction: self.selection_fraction(),
            percent_complete: self.percent_complete(),
            draft: self.draft,
            sets: self.sets.len(),
        }
    }

    fn publish(&self) {
        self.metrics.send_replace(self.metrics());
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn set_queue(&mut self, queue: impl Into<String>) {
        self.queue = queue.into();
    }

    pub fn set_count(&mut self, count: Option<i64>) {
        self.count = count;
        self.publish();
    }

    pub fn set_count_input(&mut self, input: &str) {
        self.set_count(parse_counter(input));
    }

    pub fn set_remaining(&mut self, remaining: Option<i64>) {
        self.remaining = remaining;
        self.publish();
    }

    pub fn set_remaining_input(&mut self, input: &str) {
        self.set_remaining(parse_counter(input));
    }

    pub fn toggle_selected(&mut self) {
        self.selected = !self.selected;
        self.publish();
    }

    /// Record in the shape the API expects. Draft state is left out.
    pub fn serialize(&self) -> JobRecord {
        JobRecord {
            id: self.id,
            name: self.name.clone(),
            draft: None,
            count: self.count,
            remaining: self.remaining,
            queue: None,
            sets: self.sets.iter().map(SetModel::serialize).collect(),
        }
    }

    /// Open a draft session. The job only becomes a draft once the API agrees.
    pub async fn begin_edit(&mut self) -> Result<(), QueueError> {
        self.api
            .edit(EntityKind::Job, EditRequest { id: self.id })
            .await
            .inspect_err(|e| warn!(job = self.id, error = %e, "edit request failed"))?;
        self.draft = true;
        info!(job = self.id, "job opened for editing");
        self.publish();
        Ok(())
    }

    /// Replace the first set sharing the record's id in place, or append it.
    /// Unsaved records (id -1) match the first unsaved set; use
    /// [`update_set`](Self::update_set) to edit a specific one by handle.
    pub fn on_set_modified(&mut self, record: SetRecord) -> Result<SetHandle, QueueError> {
        let set = SetModel::new(record, self.profile.clone())?;
        let existing = self.sets.iter().position(|s| s.id() == set.id());
        let handle = match existing {
            Some(pos) => {
                let handle = self.sets[pos].handle();
                debug!(job = self.id, set = set.id(), pos, "replacing set");
                self.sets[pos] = set.with_handle(handle);
                handle
            }
            None => {
                let handle = SetHandle(self.next_handle);
                self.next_handle += 1;
                debug!(job = self.id, set = set.id(), "appending set");
                self.sets.push(set.with_handle(handle));
                handle
            }
        };
        self.publish();
        Ok(handle)
    }

    /// Apply `f` to one set and republish aggregates.
    pub fn update_set<R>(&mut self, handle: SetHandle, f: impl FnOnce(&mut SetModel) -> R) -> Option<R> {
        let set = self.sets.iter_mut().find(|s| s.handle() == handle)?;
        let out = f(set);
        self.publish();
        Some(out)
    }

    /// Drop a set locally. The server only forgets it on the next commit.
    pub fn remove_set(&mut self, handle: SetHandle) -> Option<SetModel> {
        let pos = self.sets.iter().position(|s| s.handle() == handle)?;
        let removed = self.sets.remove(pos);
        debug!(job = self.id, set = removed.id(), "set removed");
        self.publish();
        Some(removed)
    }

    /// Commit the job. On success the server response replaces count,
    /// remaining, id and every set; local-only sets not echoed back are gone.
    /// On failure nothing local changes.
    pub async fn end_edit(&mut self) -> Result<(), QueueError> {
        let mut payload = self.serialize();
        payload.draft = Some(false);
        let json = serde_json::to_string(&payload).map_err(QueueError::Serialize)?;
        let result = self
            .api
            .commit(EntityKind::Job, CommitRequest { json })
            .await
            .inspect_err(|e| warn!(job = self.id, error = %e, "commit failed"))?;

        let (sets, next_handle) = build_sets(result.sets, &self.profile, self.next_handle)?;
        let remaining = match (result.count, result.remaining) {
            (Some(count), Some(remaining)) if remaining > count || remaining < 0 => {
                warn!(job = result.id, count, remaining, "server remaining out of range, clamping");
                Some(remaining.clamp(0, count.max(0)))
            }
            (_, remaining) => remaining,
        };
        self.draft = false;
        self.count = result.count;
        self.remaining = remaining;
        self.id = result.id;
        self.sets = sets;
        self.next_handle = next_handle;
        info!(job = self.id, sets = self.sets.len(), "job committed");
        self.publish();
        Ok(())
    }

    /// Total prints across every iteration of the job. Saturates rather than
    /// overflowing on absurd counts.
    pub fn total_length(&self) -> i64 {
        let count = self.count.unwrap_or(0);
        self.sets
            .iter()
            .map(|s| s.count().unwrap_or(0).saturating_mul(count))
            .fold(0i64, i64::saturating_add)
    }

    pub fn total_completed(&self) -> i64 {
        self.sets
            .iter()
            .map(SetModel::completed_length)
            .fold(0i64, i64::saturating_add)
    }

    /// How selected the job looks: a selected job adds 0.1 on top of its
    /// selected sets, divided by the set count. Only meant to drive a
    /// tri-state checkbox, so it isn't a true fraction.
    pub fn selection_fraction(&self) -> f64 {
        let mut selected = if self.selected { JOB_SELECTION_WEIGHT } else { 0.0 };
        if self.sets.is_empty() {
            return selected;
        }
        selected += self.sets.iter().filter(|s| s.selected()).count() as f64;
        selected / self.sets.len() as f64
    }

    pub fn percent_complete(&self) -> Percent {
        match (self.count, self.remaining) {
            (Some(count), Some(remaining)) => match count.checked_sub(remaining) {
                Some(done) => Percent::from_f64(100.0 * done as f64 / count as f64),
                None => Percent::Indeterminate,
            },
            _ => Percent::Indeterminate,
        }
    }

    /// Prints of one set left across the rest of this job.
    pub fn set_length_remaining(&self, handle: SetHandle) -> Option<i64> {
        self.set(handle)?.length_remaining(self.remaining)
    }
}

fn build_sets(
    records: Vec<SetRecord>,
    profile: &ActiveProfile,
    first_handle: u64,
) -> Result<(Vec<SetModel>, u64), QueueError> {
    let mut next = first_handle;
    let mut sets = Vec::with_capacity(records.len());
    for record in records {
        sets.push(SetModel::new(record, profile.clone())?.with_handle(SetHandle(next)));
        next += 1;
    }
    Ok((sets, next))
}
