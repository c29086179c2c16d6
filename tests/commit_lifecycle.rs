use async_trait::async_trait;
use printqueue_rs::api::{CommitRequest, EditRequest};
use printqueue_rs::{
    ApiError, EntityKind, JobModel, JobRecord, MemoryApi, QueueApi, QueueError, SetRecord,
};
use std::sync::{Arc, Mutex};

fn new_job(api: Arc<dyn QueueApi>) -> JobModel {
    let record = JobRecord {
        name: "benchy run".to_string(),
        count: Some(2),
        remaining: Some(2),
        sets: vec![SetRecord::new("benchy.gcode", 3), SetRecord::new("plate.gcode", 1)],
        ..Default::default()
    };
    JobModel::builder(record).api(api).build().unwrap()
}

#[tokio::test]
async fn test_commit_replaces_state_from_server() {
    let api = Arc::new(MemoryApi::new());
    let mut job = new_job(api.clone());

    job.begin_edit().await.unwrap();
    assert!(job.draft());
    job.end_edit().await.unwrap();

    assert!(!job.draft());
    assert_eq!(job.id(), 1);
    assert!(job.sets().iter().all(|s| s.id() > 0));
    assert_eq!(job.total_length(), 8);
    assert_eq!(api.commit_count().await, 1);
    assert_eq!(api.job(1).await.unwrap().sets.len(), 2);
}

#[tokio::test]
async fn test_commit_drops_removed_sets_and_adjusts_remaining() {
    let api = Arc::new(MemoryApi::new());
    let mut job = new_job(api.clone());
    job.end_edit().await.unwrap();

    job.begin_edit().await.unwrap();
    let plate = job.sets()[1].handle();
    job.remove_set(plate);
    job.set_remaining(Some(1));
    job.set_count(Some(4));
    job.end_edit().await.unwrap();

    assert_eq!(job.sets().len(), 1);
    assert_eq!(job.sets()[0].path(), "benchy.gcode");
    assert_eq!(job.count(), Some(4));
    // count grew by two; the server shifts remaining with it
    assert_eq!(job.remaining(), Some(3));
    assert!(job.remaining() <= job.count());
}

#[tokio::test]
async fn test_edit_failure_leaves_draft_unset() {
    let api = Arc::new(MemoryApi::new());
    let mut job = new_job(api.clone());
    api.fail_next(ApiError::Transport("connection refused".into())).await;

    let err = job.begin_edit().await.unwrap_err();
    assert!(matches!(err, QueueError::Api(ApiError::Transport(_))));
    assert!(!job.draft());
}

#[tokio::test]
async fn test_commit_failure_changes_nothing() {
    let api = Arc::new(MemoryApi::new());
    let mut job = new_job(api.clone());
    job.begin_edit().await.unwrap();
    job.on_set_modified(SetRecord::new("extra.gcode", 2)).unwrap();
    let before = job.serialize();

    api.fail_next(ApiError::Rejected("queue locked".into())).await;
    assert!(job.end_edit().await.is_err());

    assert!(job.draft());
    assert_eq!(job.serialize(), before);
    assert_eq!(job.id(), -1);
    assert_eq!(api.commit_count().await, 0);
}

/// Server that answers commits with a fixed record and remembers the payload.
struct ScriptedApi {
    response: JobRecord,
    seen: Mutex<Vec<String>>,
}

#[async_trait]
impl QueueApi for ScriptedApi {
    async fn edit(&self, _kind: EntityKind, _request: EditRequest) -> Result<(), ApiError> {
        Ok(())
    }

    async fn commit(&self, kind: EntityKind, request: CommitRequest) -> Result<JobRecord, ApiError> {
        assert_eq!(kind, EntityKind::Job);
        self.seen.lock().unwrap().push(request.json);
        Ok(self.response.clone())
    }
}

#[tokio::test]
async fn test_commit_payload_and_out_of_range_remaining() {
    let api = Arc::new(ScriptedApi {
        response: JobRecord {
            id: 12,
            count: Some(2),
            remaining: Some(5),
            sets: vec![SetRecord { id: 30, ..SetRecord::new("server.gcode", 1) }],
            ..Default::default()
        },
        seen: Mutex::new(Vec::new()),
    });
    let mut job = new_job(api.clone());
    job.begin_edit().await.unwrap();
    job.end_edit().await.unwrap();

    let payload: serde_json::Value = serde_json::from_str(&api.seen.lock().unwrap()[0]).unwrap();
    assert_eq!(payload["draft"], false);
    assert_eq!(payload["name"], "benchy run");
    assert_eq!(payload["sets"].as_array().unwrap().len(), 2);

    assert_eq!(job.id(), 12);
    assert_eq!(job.remaining(), Some(2));
    assert_eq!(job.sets().len(), 1);
    assert_eq!(job.sets()[0].id(), 30);
    assert_eq!(job.sets()[0].path(), "server.gcode");
}

#[tokio::test]
async fn test_persisted_job_round_trip() {
    let api = Arc::new(MemoryApi::new());
    let mut existing = SetRecord { id: 9, ..SetRecord::new("a.gcode", 2) };
    existing.completed = Some(5);
    api.insert_job(JobRecord { id: 4, sets: vec![existing.clone()], ..Default::default() }).await;

    let mut job = JobModel::builder(JobRecord { id: 4, sets: vec![existing], ..Default::default() })
        .api(api.clone())
        .build()
        .unwrap();
    job.begin_edit().await.unwrap();
    assert!(api.is_editing(4).await);
    job.on_set_modified(SetRecord::new("b.gcode", 1)).unwrap();
    job.end_edit().await.unwrap();

    assert!(!api.is_editing(4).await);
    assert_eq!(job.id(), 4);
    let ids: Vec<i64> = job.sets().iter().map(|s| s.id()).collect();
    assert_eq!(ids, vec![9, 10]);
    assert_eq!(job.total_completed(), 5);
}
