mod common;

use std::sync::Arc;

use common::{slot, StubRemote};
use safe_mirror::{
    safe_interceptors, ClassConfig, ClassDefinition, FetchOptions, FetchSource, InitArgs,
    KeyValueStore, MemoryStore, RecordSet, RemoteSource, SafeConfig, SafeOptions,
};
use serde_json::json;

fn setup() -> (Arc<MemoryStore>, safe_mirror::SafeInterceptors) {
    let store = Arc::new(MemoryStore::new());
    let kinds = safe_interceptors(store.clone());
    (store, kinds)
}

fn safe_set(config: ClassConfig) -> ClassDefinition<RecordSet> {
    ClassDefinition::new("SafeCollection").config(config)
}

fn detailed(key: &str, options: SafeOptions) -> SafeConfig {
    SafeConfig::Detailed {
        key: key.to_string(),
        options: Some(options),
    }
}

#[test]
fn test_collection_safe_is_collection() {
    let (store, kinds) = setup();
    let set = kinds
        .record_sets
        .extend(safe_set(ClassConfig::default().with_safe("safe-col-tester")))
        .create()
        .unwrap();

    let safe = set.safe().unwrap();
    assert!(safe.is_collection());
    assert_eq!(safe.uid(), "safe-col-tester");
    assert_eq!(store.get_item("safe-col-tester").unwrap().as_deref(), Some("[]"));
}

#[test]
fn test_mirrored_events_write_through() {
    let (store, kinds) = setup();
    let mut set = kinds
        .record_sets
        .extend(safe_set(ClassConfig::default().with_safe("todos")))
        .create()
        .unwrap();

    set.add(json!([{ "id": 1, "done": false }, { "id": 2, "done": false }]))
        .unwrap();
    assert_eq!(slot(&store, "todos"), Some(set.to_json()));

    set.update(&json!(2), json!({ "done": true })).unwrap();
    assert_eq!(slot(&store, "todos"), Some(set.to_json()));

    set.reset(json!([{ "id": 3 }])).unwrap();
    assert_eq!(slot(&store, "todos"), Some(json!([{ "id": 3 }])));
}

#[test]
fn test_remove_is_not_mirrored() {
    let (store, kinds) = setup();
    let mut set = kinds
        .record_sets
        .extend(safe_set(ClassConfig::default().with_safe("todos")))
        .create()
        .unwrap();
    set.add(json!([{ "id": 1 }, { "id": 2 }])).unwrap();

    set.remove(&[json!(1)]).unwrap();

    assert_eq!(set.to_json(), json!([{ "id": 2 }]));
    assert_eq!(slot(&store, "todos"), Some(json!([{ "id": 1 }, { "id": 2 }])));
}

#[test]
fn test_sort_writes_sorted_order() {
    let (store, kinds) = setup();
    let mut set = kinds
        .record_sets
        .extend(safe_set(
            ClassConfig::default().with_safe("ranked").with_comparator("rank"),
        ))
        .create()
        .unwrap();

    set.add(json!([{ "id": "b", "rank": 2 }, { "id": "a", "rank": 1 }]))
        .unwrap();

    assert_eq!(
        slot(&store, "ranked"),
        Some(json!([{ "id": "a", "rank": 1 }, { "id": "b", "rank": 2 }]))
    );
}

#[test]
fn test_new_instance_reloads_collection() {
    let (_store, kinds) = setup();
    let class = kinds
        .record_sets
        .extend(safe_set(ClassConfig::default().with_safe("shared")));

    let mut first = class.create().unwrap();
    first.add(json!([{ "id": 1 }, { "id": 2 }])).unwrap();

    let second = class.create().unwrap();
    assert_eq!(second.to_json(), json!([{ "id": 1 }, { "id": 2 }]));
    assert_eq!(
        second.to_json(),
        second.safe().unwrap().get_data().unwrap().unwrap()
    );
}

#[tokio::test]
async fn test_seeded_collection_restored_from_safe() {
    let (store, kinds) = setup();
    let remote = StubRemote::new(json!([]));
    let source: Arc<dyn RemoteSource> = remote.clone();
    let class = kinds.record_sets.extend(
        safe_set(ClassConfig::default().with_safe(detailed("k2", SafeOptions::default())))
            .remote(source),
    );
    let items = json!([{ "id": 1 }, { "id": 2 }]);

    let mut set = class.construct(InitArgs::with_seed(items.clone())).unwrap();
    assert_eq!(slot(&store, "k2"), Some(items.clone()));

    set.remove_all_silently();
    assert!(set.is_empty());

    set.fetch(FetchOptions::from_safe()).await.unwrap();

    assert_eq!(set.to_json(), items);
    assert_eq!(remote.calls(), 0);
}

#[tokio::test]
async fn test_configured_from_safe_serves_plain_fetch() {
    let (store, kinds) = setup();
    store.set_item("offline", r#"[{"id":"x"}]"#).unwrap();
    let remote = StubRemote::new(json!([{ "id": "server" }]));
    let source: Arc<dyn RemoteSource> = remote.clone();
    let options = SafeOptions {
        reload: false,
        from: Some(FetchSource::Safe),
    };
    let class = kinds.record_sets.extend(
        safe_set(
            ClassConfig::default()
                .with_safe(detailed("offline", options))
                .with_url("https://api.test/items"),
        )
        .remote(source),
    );

    let mut set = class.create().unwrap();
    assert!(set.is_empty());

    set.fetch(FetchOptions::default()).await.unwrap();

    assert_eq!(set.to_json(), json!([{ "id": "x" }]));
    assert_eq!(remote.calls(), 0);
}

#[tokio::test]
async fn test_call_asking_for_remote_overrides_configured_safe() {
    let (store, kinds) = setup();
    store.set_item("offline", r#"[{"id":"x"}]"#).unwrap();
    let remote = StubRemote::new(json!([{ "id": "server" }]));
    let source: Arc<dyn RemoteSource> = remote.clone();
    let options = SafeOptions {
        reload: true,
        from: Some(FetchSource::Safe),
    };
    let class = kinds.record_sets.extend(
        safe_set(
            ClassConfig::default()
                .with_safe(detailed("offline", options))
                .with_url("https://api.test/items"),
        )
        .remote(source),
    );
    let mut set = class.create().unwrap();

    set.fetch(FetchOptions {
        from: Some(FetchSource::Remote),
        reset: true,
        ..FetchOptions::default()
    })
    .await
    .unwrap();

    assert_eq!(remote.calls(), 1);
    assert_eq!(set.to_json(), json!([{ "id": "server" }]));
    assert_eq!(slot(&store, "offline"), Some(set.to_json()));
}

#[tokio::test]
async fn test_remote_fetch_merges_and_writes_through() {
    let (store, kinds) = setup();
    let remote = StubRemote::new(json!([{ "id": 1, "v": "new" }, { "id": 3 }]));
    let source: Arc<dyn RemoteSource> = remote.clone();
    let class = kinds.record_sets.extend(
        safe_set(
            ClassConfig::default()
                .with_safe("synced")
                .with_url("https://api.test/items"),
        )
        .remote(source),
    );

    let mut set = class
        .construct(InitArgs::with_seed(json!([{ "id": 1, "v": "old" }, { "id": 2 }])))
        .unwrap();
    set.fetch(FetchOptions::default()).await.unwrap();

    assert_eq!(remote.calls(), 1);
    assert_eq!(set.to_json(), json!([{ "id": 1, "v": "new" }, { "id": 3 }]));
    assert_eq!(slot(&store, "synced"), Some(set.to_json()));
}

#[tokio::test]
async fn test_remote_fetch_with_reset() {
    let (store, kinds) = setup();
    let remote = StubRemote::new(json!([{ "id": 9 }]));
    let source: Arc<dyn RemoteSource> = remote.clone();
    let class = kinds.record_sets.extend(
        safe_set(ClassConfig::default().with_safe("replaced"))
            .remote(source),
    );

    let mut set = class.create().unwrap();
    set.add(json!([{ "id": 1 }])).unwrap();
    let options = FetchOptions {
        url: Some("https://api.test/items".to_string()),
        reset: true,
        ..FetchOptions::default()
    };
    set.fetch(options).await.unwrap();

    assert_eq!(set.to_json(), json!([{ "id": 9 }]));
    assert_eq!(slot(&store, "replaced"), Some(json!([{ "id": 9 }])));
}

#[test]
fn test_destroy_removes_collection_slot() {
    let (store, kinds) = setup();
    let mut set = kinds
        .record_sets
        .extend(safe_set(ClassConfig::default().with_safe("gone")))
        .create()
        .unwrap();
    set.add(json!([{ "id": 1 }])).unwrap();

    set.destroy().unwrap();

    assert_eq!(store.get_item("gone").unwrap(), None);
    assert_eq!(set.safe().unwrap().get_data().unwrap(), None);
}
