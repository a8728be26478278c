//! Restart recovery integration tests.
//!
//! These tests save the queue through each store backend and load it into a
//! fresh queue, the way the server does on startup.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use mediacopier_core::{
    job::{CopyItem, Job, JobPayload, JobRules, JobStatus},
    persistence::{
        create_store, load_or_empty, JobStore, JsonFileStore, PersistenceBackend,
        PersistenceConfig, Snapshotter,
    },
    planner::OrganizationMode,
    queue::{JobQueue, QueueError},
    testing::fixtures,
};

fn manual_job(name: &str, destination: &std::path::Path, sources: &[PathBuf]) -> Job {
    let items = sources
        .iter()
        .map(|source| CopyItem {
            source: source.clone(),
            destination: PathBuf::from(source.file_name().unwrap()),
            size_bytes: std::fs::metadata(source).unwrap().len(),
        })
        .collect();
    Job::new(
        name,
        destination,
        JobPayload::Manual { items },
        OrganizationMode::SingleFolder,
        JobRules::default(),
    )
}

/// A queue holding one job in each of pending, running, paused and
/// completed.
fn populated_queue(dir: &TempDir) -> (JobQueue, [String; 4]) {
    let sources: Vec<PathBuf> = (0..2)
        .map(|i| fixtures::write_file(dir.path(), &format!("src/{}.mp3", i), 1000))
        .collect();
    let queue = JobQueue::new();

    let mut ids = Vec::new();
    for name in ["pending", "running", "paused", "completed"] {
        let destination = dir.path().join(name);
        std::fs::create_dir_all(&destination).unwrap();
        ids.push(queue.add(manual_job(name, &destination, &sources)).unwrap().id);
    }

    let (_, _) = queue.start(&ids[1]).unwrap();
    queue
        .record_item(&ids[1], 0, mediacopier_core::job::ItemOutcome::copied(1000))
        .unwrap();

    let (_, _) = queue.start(&ids[2]).unwrap();
    queue
        .record_item(&ids[2], 0, mediacopier_core::job::ItemOutcome::copied(1000))
        .unwrap();
    queue.settle(&ids[2], JobStatus::Paused, None).unwrap();

    let (_, _) = queue.start(&ids[3]).unwrap();
    queue.settle(&ids[3], JobStatus::Completed, None).unwrap();

    (queue, [ids[0].clone(), ids[1].clone(), ids[2].clone(), ids[3].clone()])
}

fn assert_restored(queue: &JobQueue, ids: &[String; 4]) {
    assert_eq!(queue.len(), 3);

    let pending = queue.view(&ids[0]).unwrap();
    assert_eq!(pending.status, JobStatus::Pending);

    // Running jobs come back pending with the checkpoint reset.
    let running = queue.view(&ids[1]).unwrap();
    assert_eq!(running.status, JobStatus::Pending);
    assert_eq!(running.next_item, 0);
    assert_eq!(running.progress, 0);

    let paused = queue.view(&ids[2]).unwrap();
    assert_eq!(paused.status, JobStatus::Paused);
    assert_eq!(paused.next_item, 1);
    assert_eq!(paused.progress, 50);

    assert!(queue.view(&ids[3]).is_none());
}

#[test]
fn test_json_store_round_trip_restores_restorable_jobs() {
    let dir = TempDir::new().unwrap();
    let (queue, ids) = populated_queue(&dir);

    let store = JsonFileStore::new(dir.path().join("state/jobs.json"));
    store.save(&queue.snapshot()).unwrap();

    let restored = JobQueue::new();
    assert_eq!(restored.restore(load_or_empty(&store)).unwrap(), 3);
    assert_restored(&restored, &ids);
}

#[test]
fn test_sqlite_store_round_trip_restores_restorable_jobs() {
    let dir = TempDir::new().unwrap();
    let (queue, ids) = populated_queue(&dir);

    let config = PersistenceConfig::default()
        .with_backend(PersistenceBackend::Sqlite)
        .with_data_dir(dir.path().join("data"));
    let store = create_store(&config).unwrap();
    store.save(&queue.snapshot()).unwrap();

    let restored = JobQueue::new();
    assert_eq!(restored.restore(load_or_empty(store.as_ref())).unwrap(), 3);
    assert_restored(&restored, &ids);
}

#[test]
fn test_corrupt_store_starts_empty() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("jobs.json");
    std::fs::write(&path, "{ not json").unwrap();

    let store = JsonFileStore::new(&path);
    let state = load_or_empty(&store);
    assert!(state.is_empty());
}

#[test]
fn test_restore_after_accepting_jobs_is_rejected() {
    let dir = TempDir::new().unwrap();
    let (queue, _) = populated_queue(&dir);
    let state = queue.snapshot();

    assert_eq!(queue.restore(state), Err(QueueError::AlreadyInitialized));
}

#[tokio::test]
async fn test_snapshotter_saves_on_shutdown() {
    let dir = TempDir::new().unwrap();
    let (queue, ids) = populated_queue(&dir);
    let queue = Arc::new(queue);
    let store: Arc<dyn JobStore> = Arc::new(JsonFileStore::new(dir.path().join("jobs.json")));

    let snapshotter = Snapshotter::new(
        Arc::clone(&queue),
        Arc::clone(&store),
        Duration::from_secs(3600),
    );
    snapshotter.start().await;
    assert!(snapshotter.is_running().await);
    snapshotter.shutdown().await.unwrap();

    let restored = JobQueue::new();
    restored.restore(store.load().unwrap()).unwrap();
    assert_restored(&restored, &ids);
}
