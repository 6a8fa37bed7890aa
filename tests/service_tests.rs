use cachearena::export::ExportMode;
use cachearena::{
    Background, CacheService, DirectoryDownloads, JsonFileStorage, MemoryStorage, Request,
    Response, ServiceHandle, Storage, UpdateMeta,
};
use serde_json::{json, Value};
use std::sync::Arc;

// ── Fixtures ────────────────────────────────────────────────────────────────

fn phone(slug: &str, brand: &str, model: &str) -> Value {
    json!({ "slug": slug, "brand": brand, "model": model })
}

fn meta() -> UpdateMeta {
    UpdateMeta::new("extract:phone-page", "phone")
}

async fn cache_entries(handle: &ServiceHandle) -> Vec<cachearena::Record> {
    match handle.request(Request::CacheRequest).await.unwrap() {
        Response::Cache(Some(cache)) => cache.entries,
        Response::Cache(None) => Vec::new(),
        other => panic!("unexpected {other:?}"),
    }
}

fn memory_service() -> CacheService {
    CacheService::spawn(Background::new(Arc::new(MemoryStorage::new()), None))
}

// ── Queue ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_merge_scenario_over_the_queue() {
    let service = memory_service();
    let handle = service.handle();

    let first = handle
        .request(Request::update(
            json!([phone("a", "Samsung", "Galaxy S25"), phone("b", "Apple", "iPhone 16")]),
            meta(),
        ))
        .await
        .unwrap();
    assert_eq!(serde_json::to_value(&first).unwrap(), json!({ "ok": true, "count": 2 }));

    let cache = match handle.request(Request::CacheRequest).await.unwrap() {
        Response::Cache(Some(cache)) => cache,
        other => panic!("unexpected {other:?}"),
    };
    assert_eq!(cache.entries.len(), 2);
    assert!(cache.last_sync > 0);
    assert_eq!(cache.source, "extract:phone-page");

    handle
        .request(Request::update(
            json!([phone("a", "Samsung", "Galaxy S25 FE")]),
            meta(),
        ))
        .await
        .unwrap();
    let entries = cache_entries(&handle).await;
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].model, "Galaxy S25 FE");

    drop(handle);
    service.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_updates_keep_every_batch() {
    let service = memory_service();

    let mut tasks = Vec::new();
    for batch in 0..16 {
        let handle = service.handle();
        tasks.push(tokio::spawn(async move {
            let records: Vec<Value> = (0..5)
                .map(|i| phone(&format!("b{batch}-r{i}"), "Brand", &format!("Model {batch}-{i}")))
                .collect();
            handle
                .request(Request::update(Value::Array(records), meta()))
                .await
                .unwrap()
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    let handle = service.handle();
    let entries = cache_entries(&handle).await;
    assert_eq!(entries.len(), 16 * 5);

    match handle.request(Request::CacheRequest).await.unwrap() {
        Response::Cache(Some(cache)) => assert_eq!(cache.index.len(), 16 * 5),
        other => panic!("unexpected {other:?}"),
    }

    drop(handle);
    service.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_disabled_source_leaves_cache_unchanged() {
    let service = memory_service();
    let handle = service.handle();

    handle
        .request(Request::update(json!([phone("a", "Nokia", "3310")]), meta()))
        .await
        .unwrap();
    let before = handle.request(Request::CacheRequest).await.unwrap();

    handle
        .request(
            serde_json::from_value(json!({
                "type": "settings-set",
                "settings": { "sources": { "phone": false } }
            }))
            .unwrap(),
        )
        .await
        .unwrap();

    let skipped = handle
        .request(Request::update(json!([phone("b", "Nokia", "6310")]), meta()))
        .await
        .unwrap();
    assert_eq!(
        serde_json::to_value(&skipped).unwrap(),
        json!({ "ok": false, "skipped": true })
    );
    assert_eq!(handle.request(Request::CacheRequest).await.unwrap(), before);

    drop(handle);
    service.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_state_survives_restart_on_disk() {
    let dir = tempfile::tempdir().unwrap();

    {
        let storage = Arc::new(JsonFileStorage::open(dir.path()).unwrap());
        let service = CacheService::spawn(Background::new(storage, None));
        let handle = service.handle();
        handle
            .request(Request::update(
                json!({ "x": phone("a", "Google", "Pixel 9"), "y": phone("b", "Google", "Pixel 9a") }),
                meta(),
            ))
            .await
            .unwrap();
        drop(handle);
        service.shutdown().await.unwrap();
    }

    let storage = Arc::new(JsonFileStorage::open(dir.path()).unwrap());
    let service = CacheService::spawn(Background::new(storage, None));
    let handle = service.handle();
    handle
        .request(Request::update(json!([phone("c", "Google", "Pixel 9 Pro")]), meta()))
        .await
        .unwrap();

    let entries = cache_entries(&handle).await;
    let slugs: Vec<&str> = entries.iter().map(|e| e.slug.as_str()).collect();
    assert_eq!(slugs, vec!["a", "b", "c"]);

    drop(handle);
    service.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_export_to_downloads_then_clear() {
    let dir = tempfile::tempdir().unwrap();
    let downloads = DirectoryDownloads::new(dir.path().join("downloads"));
    let storage: Arc<MemoryStorage> = Arc::new(MemoryStorage::new());
    let service = CacheService::spawn(Background::new(storage.clone(), Some(Box::new(downloads))));
    let handle = service.handle();

    handle
        .request(Request::update(json!([phone("a", "Sony", "Xperia 1 VI")]), meta()))
        .await
        .unwrap();

    let result = match handle.request(Request::CacheExport).await.unwrap() {
        Response::Export(result) => result,
        other => panic!("unexpected {other:?}"),
    };
    assert!(result.ok);
    assert_eq!(result.mode, Some(ExportMode::Downloads));
    assert_eq!(result.count, 1);
    let filename = result.filename.unwrap();
    let written = std::fs::read_to_string(dir.path().join("downloads").join(&filename)).unwrap();
    assert!(written.starts_with("mediaType,sourceId,slug,"));
    assert!(written.contains("Xperia 1 VI"));

    let cleared = handle.request(Request::CacheClear).await.unwrap();
    assert_eq!(serde_json::to_value(&cleared).unwrap(), json!({ "ok": true }));
    assert!(storage.get(cachearena::config::CACHE_KEY).unwrap().is_none());

    match handle.request(Request::CacheExport).await.unwrap() {
        Response::Export(result) => {
            assert!(!result.ok);
            assert_eq!(result.reason.as_deref(), Some("empty"));
        }
        other => panic!("unexpected {other:?}"),
    }

    drop(handle);
    service.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_shutdown_hands_back_the_dispatcher() {
    let service = memory_service();
    let handle = service.handle();
    handle
        .request(Request::update(json!([phone("a", "Motorola", "Edge 50")]), meta()))
        .await
        .unwrap();
    drop(handle);

    let mut background = service.shutdown().await.unwrap();
    let cache = background.cache_store().load_cache().unwrap().unwrap();
    assert_eq!(cache.entries.len(), 1);
    assert!(background.settings_store().is_enabled("phone").unwrap());
}

// ── Blocking storage ────────────────────────────────────────────────────────

/// Memory storage whose writes wait until the test lets them through
struct GatedStorage {
    inner: MemoryStorage,
    entered: std::sync::Mutex<Option<tokio::sync::oneshot::Sender<()>>>,
    gate: std::sync::Mutex<std::sync::mpsc::Receiver<()>>,
}

impl Storage for GatedStorage {
    fn get(&self, key: &str) -> cachearena::Result<Option<Value>> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: Value) -> cachearena::Result<()> {
        if let Some(entered) = self.entered.lock().unwrap().take() {
            let _ = entered.send(());
        }
        self.gate.lock().unwrap().recv().unwrap();
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> cachearena::Result<()> {
        self.inner.remove(key)
    }
}

#[tokio::test]
async fn test_blocked_write_does_not_stall_the_runtime() {
    let (entered_tx, entered_rx) = tokio::sync::oneshot::channel();
    let (release_tx, release_rx) = std::sync::mpsc::channel();
    let storage = Arc::new(GatedStorage {
        inner: MemoryStorage::new(),
        entered: std::sync::Mutex::new(Some(entered_tx)),
        gate: std::sync::Mutex::new(release_rx),
    });
    let service = CacheService::spawn(Background::new(storage, None));
    let handle = service.handle();

    let pending = tokio::spawn({
        let handle = handle.clone();
        async move {
            handle
                .request(Request::update(json!([phone("a", "OnePlus", "13")]), meta()))
                .await
        }
    });

    // single-threaded runtime: this only resumes if the write runs elsewhere
    entered_rx.await.unwrap();
    release_tx.send(()).unwrap();

    let result = pending.await.unwrap().unwrap();
    assert_eq!(serde_json::to_value(&result).unwrap(), json!({ "ok": true, "count": 1 }));
    assert_eq!(cache_entries(&handle).await.len(), 1);

    drop(handle);
    service.shutdown().await.unwrap();
}
