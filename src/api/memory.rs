// In-process queue server. Used by the CLI and the test suites in place of a
// real transport.

use super::{ApiError, CommitRequest, EditRequest, EntityKind, QueueApi};
use crate::queue::{JobRecord, SetRecord, UNSAVED_ID};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use tokio::sync::Mutex;

#[derive(Debug)]
struct MemoryState {
    jobs: BTreeMap<i64, JobRecord>,
    editing: HashSet<i64>,
    next_job_id: i64,
    next_set_id: i64,
    fail_next: Option<ApiError>,
    commits: usize,
}

/// Keeps committed jobs in memory and applies the server-side rules a client
/// must not assume: id assignment and `remaining` adjustment on count changes.
#[derive(Debug)]
pub struct MemoryApi {
    state: Mutex<MemoryState>,
}

impl MemoryApi {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MemoryState {
                jobs: BTreeMap::new(),
                editing: HashSet::new(),
                next_job_id: 1,
                next_set_id: 1,
                fail_next: None,
                commits: 0,
            }),
        }
    }

    /// Store a job as if it had been committed earlier, keeping its ids.
    pub async fn insert_job(&self, mut record: JobRecord) {
        let mut state = self.state.lock().await;
        record.draft = None;
        state.next_job_id = state.next_job_id.max(record.id.saturating_add(1));
        if let Some(max_set) = record.sets.iter().map(|s| s.id).max() {
            state.next_set_id = state.next_set_id.max(max_set.saturating_add(1));
        }
        state.jobs.insert(record.id, record);
    }

    /// Make the next `edit` or `commit` fail with `error`.
    pub async fn fail_next(&self, error: ApiError) {
        self.state.lock().await.fail_next = Some(error);
    }

    pub async fn job(&self, id: i64) -> Option<JobRecord> {
        self.state.lock().await.jobs.get(&id).cloned()
    }

    pub async fn is_editing(&self, id: i64) -> bool {
        self.state.lock().await.editing.contains(&id)
    }

    pub async fn commit_count(&self) -> usize {
        self.state.lock().await.commits
    }
}

impl Default for MemoryApi {
    fn default() -> Self {
        Self::new()
    }
}

/// Shift `remaining` by the change in `count`, keeping it within `0..=count`.
fn adjust_remaining(old_count: Option<i64>, new_count: Option<i64>, remaining: Option<i64>) -> Option<i64> {
    let count = new_count?;
    let remaining = match (old_count, remaining) {
        (Some(old), Some(r)) if old != count => r.saturating_add(count.saturating_sub(old)),
        (_, Some(r)) => r,
        (_, None) => count,
    };
    Some(remaining.clamp(0, count.max(0)))
}

impl MemoryState {
    fn store_set(&mut self, incoming: SetRecord, previous: Option<&JobRecord>) -> SetRecord {
        let old = previous.and_then(|job| job.sets.iter().find(|s| s.id == incoming.id && s.id != UNSAVED_ID));
        let id = if incoming.id == UNSAVED_ID {
            let id = self.next_set_id;
            self.next_set_id = self.next_set_id.saturating_add(1);
            id
        } else {
            incoming.id
        };
        SetRecord {
            id,
            remaining: adjust_remaining(old.and_then(|s| s.count).or(incoming.count), incoming.count, incoming.remaining),
            completed: Some(old.and_then(|s| s.completed).unwrap_or(0)),
            missing_file: Some(old.and_then(|s| s.missing_file).unwrap_or(false)),
            expanded: None,
            ..incoming
        }
    }
}

#[async_trait]
impl QueueApi for MemoryApi {
    async fn edit(&self, kind: EntityKind, request: EditRequest) -> Result<(), ApiError> {
        let mut state = self.state.lock().await;
        if let Some(err) = state.fail_next.take() {
            return Err(err);
        }
        if request.id != UNSAVED_ID && kind == EntityKind::Job && !state.jobs.contains_key(&request.id) {
            return Err(ApiError::NotFound { kind, id: request.id });
        }
        state.editing.insert(request.id);
        tracing::debug!(%kind, id = request.id, "edit session opened");
        Ok(())
    }

    async fn commit(&self, kind: EntityKind, request: CommitRequest) -> Result<JobRecord, ApiError> {
        let mut state = self.state.lock().await;
        if let Some(err) = state.fail_next.take() {
            return Err(err);
        }
        if kind != EntityKind::Job {
            return Err(ApiError::Rejected(format!("cannot commit a {} directly", kind)));
        }
        let incoming: JobRecord =
            serde_json::from_str(&request.json).map_err(|e| ApiError::Decode(e.to_string()))?;

        let previous = if incoming.id == UNSAVED_ID { None } else { state.jobs.get(&incoming.id).cloned() };
        if incoming.id != UNSAVED_ID && previous.is_none() {
            return Err(ApiError::NotFound { kind, id: incoming.id });
        }
        let id = match incoming.id {
            UNSAVED_ID => {
                let id = state.next_job_id;
                state.next_job_id = state.next_job_id.saturating_add(1);
                id
            }
            id => id,
        };

        let sets = incoming
            .sets
            .into_iter()
            .map(|s| state.store_set(s, previous.as_ref()))
            .collect();
        let old_count = previous.as_ref().and_then(|j| j.count).or(incoming.count);
        let stored = JobRecord {
            id,
            name: incoming.name,
            draft: None,
            count: incoming.count,
            remaining: adjust_remaining(old_count, incoming.count, incoming.remaining),
            queue: incoming.queue,
            sets,
        };
        state.editing.remove(&incoming.id);
        state.editing.remove(&id);
        state.jobs.insert(id, stored.clone());
        state.commits += 1;
        tracing::info!(id, sets = stored.sets.len(), "job committed");
        Ok(stored)
    }
}
