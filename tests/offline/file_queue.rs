use moodwell::core::offline::{
    CORRUPT_BACKUP_KEY, FileKeyValueStore, KeyValueStore, OfflineQueue, QUEUE_KEY, QueuedAction,
};
use serde_json::Value;
use std::sync::Arc;
use tempfile::TempDir;

fn open(path: &std::path::Path) -> (Arc<FileKeyValueStore>, OfflineQueue) {
    let store = Arc::new(FileKeyValueStore::new(path));
    let queue = OfflineQueue::new(store.clone());
    (store, queue)
}

#[test]
fn queue_is_stored_under_one_key_in_wire_shape() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("offline_storage.json");
    let (_, queue) = open(&path);

    queue.enqueue(QueuedAction::note("u1", "t", "c")).unwrap();

    let file: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    let raw = file[QUEUE_KEY].as_str().unwrap();
    let list: Value = serde_json::from_str(raw).unwrap();
    assert_eq!(list[0]["type"], "note");
    assert_eq!(list[0]["uid"], "u1");
    assert_eq!(list[0]["payload"]["title"], "t");
}

#[test]
fn drained_queue_stays_empty_after_restart() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("offline_storage.json");

    let (_, queue) = open(&path);
    queue.enqueue(QueuedAction::note("u1", "a", "1")).unwrap();
    queue.enqueue(QueuedAction::note("u1", "b", "2")).unwrap();
    assert_eq!(queue.drain_all().unwrap().len(), 2);
    drop(queue);

    let (_, reopened) = open(&path);
    assert!(!reopened.has_pending().unwrap());
}

#[test]
fn corrupt_value_is_backed_up_next_to_the_queue() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("offline_storage.json");
    let (store, queue) = open(&path);
    store.set("other_key", "kept").unwrap();
    store.set(QUEUE_KEY, "[{\"type\":").unwrap();

    assert!(queue.peek_all().unwrap().is_empty());

    let (store, reopened) = open(&path);
    assert_eq!(
        store.get(CORRUPT_BACKUP_KEY).unwrap().as_deref(),
        Some("[{\"type\":")
    );
    assert_eq!(store.get("other_key").unwrap().as_deref(), Some("kept"));
    reopened.enqueue(QueuedAction::note("u1", "after", "x")).unwrap();
    assert_eq!(reopened.len().unwrap(), 1);
}
