use orderload_engine::state::load_snapshot;
use orderload_engine::EntityStateStore;
use tempfile::TempDir;

#[tokio::test]
async fn test_state_survives_reopen() {
    let dir = TempDir::new().unwrap();

    let store = EntityStateStore::open(dir.path()).await;
    assert!(store.record_order_created(77, 5).await.unwrap());
    assert!(store.record_order_created(78, 9).await.unwrap());
    assert!(store.record_item_added(77, "P-1").await.unwrap());
    assert!(store.record_item_added(77, "P-2").await.unwrap());
    assert!(store.record_order_closed(78).await.unwrap());
    let saved = store.snapshot().await;
    drop(store);

    for file in ["orders.json", "order_items.json", "order_clients.json", "closed_orders.json"] {
        assert!(dir.path().join(file).exists(), "{} missing", file);
    }

    let reopened = EntityStateStore::open(dir.path()).await;
    let restored = reopened.snapshot().await;
    assert_eq!(restored.order_items, saved.order_items);
    assert_eq!(restored.order_clients, saved.order_clients);
    assert_eq!(restored, saved);

    assert_eq!(reopened.client_of(77).await, Some(5));
    assert_eq!(reopened.pick_random_open_order().await, Some((77, 5)));
}

#[tokio::test]
async fn test_missing_state_starts_empty() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("never-written");

    assert!(load_snapshot(&missing).await.unwrap().is_none());

    let store = EntityStateStore::open(&missing).await;
    assert!(store.is_empty().await);
    assert!(store.pick_random_order().await.is_none());
}

#[tokio::test]
async fn test_corrupt_state_loads_empty() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("orders.json"), "[1, 2,").unwrap();

    assert!(load_snapshot(dir.path()).await.is_err());

    let store = EntityStateStore::open(dir.path()).await;
    assert!(store.is_empty().await);

    // The next change overwrites the corrupt file with a valid snapshot
    store.record_order_created(5, 1).await.unwrap();
    let reopened = EntityStateStore::open(dir.path()).await;
    assert_eq!(reopened.len().await, 1);
}

#[tokio::test]
async fn test_reset_clears_disk() {
    let dir = TempDir::new().unwrap();
    let store = EntityStateStore::open(dir.path()).await;
    store.record_order_created(77, 5).await.unwrap();

    store.reset().await.unwrap();

    let reopened = EntityStateStore::open(dir.path()).await;
    assert!(reopened.is_empty().await);
}
