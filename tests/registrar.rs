//! Tests for registering events: deduplication against the stored log,
//! idempotent re-registration and rejection without side effects.

use credibil_kel::{
    Error, Event, EventStore, FileStore, LocalMethod, MemoryStore, Registrar, Validator,
};
use test_utils::{FaultyStore, KelProvider, Seed};

// Registering a sequence then resolving its identifier returns the document
// obtained by validating the sequence directly.
#[tokio::test]
async fn update_then_resolve() {
    let provider = KelProvider::default();
    let method =
        LocalMethod::new("kel", MemoryStore::new(), provider.clone()).expect("should create method");

    let log = KelProvider::log("update_then_resolve", 3).expect("should build log");
    let (_, id) = KelProvider::inception("update_then_resolve").expect("should build inception");

    let registered = method.encounter(&log).await.expect("should register");
    let expected = provider.validate(&log).await.expect("should validate");
    assert_eq!(registered, expected);

    let resolved = method.resolve(&method.did(&id)).await.expect("should resolve");
    assert_eq!(resolved, expected);
    assert_eq!(resolved.version_id, 3);
}

// Registering the same sequence twice leaves the log unchanged after the
// first call and returns the same document both times.
#[tokio::test]
async fn update_idempotent() {
    let store = MemoryStore::new();
    let registrar = Registrar::new(store.clone(), KelProvider::default());

    let log = KelProvider::log("update_idempotent", 2).expect("should build log");
    let (_, id) = KelProvider::inception("update_idempotent").expect("should build inception");

    let first = registrar.update(&log).await.expect("should register");
    let stored = store.read(&id).await.expect("should read");
    let second = registrar.update(&log).await.expect("should register again");

    assert_eq!(first, second);
    assert_eq!(store.read(&id).await.expect("should read"), stored);
    assert_eq!(stored.len(), 3);
}

// Registering E1 then E1 ++ E2 stores E1 ++ E2, not E1 ++ E1 ++ E2.
#[tokio::test]
async fn update_dedups() {
    let store = MemoryStore::new();
    let registrar = Registrar::new(store.clone(), KelProvider::default());

    let full = KelProvider::log("update_dedups", 4).expect("should build log");
    let (_, id) = KelProvider::inception("update_dedups").expect("should build inception");

    registrar.update(&full[..2]).await.expect("should register first part");
    let doc = registrar.update(&full).await.expect("should register all");

    assert_eq!(doc.version_id, 4);
    assert_eq!(store.read(&id).await.expect("should read"), full);
}

// Only the events after the stored log need to be supplied.
#[tokio::test]
async fn update_with_tail() {
    let store = MemoryStore::new();
    let registrar = Registrar::new(store.clone(), KelProvider::default());

    let full = KelProvider::log("update_with_tail", 3).expect("should build log");
    let (_, id) = KelProvider::inception("update_with_tail").expect("should build inception");

    registrar.update(&full[..2]).await.expect("should register first part");
    let doc = registrar.update(&full[2..]).await.expect("should register tail");

    assert_eq!(doc.version_id, 3);
    assert_eq!(store.read(&id).await.expect("should read"), full);
}

// A rejected update leaves the stored log, and so resolution, unchanged.
#[tokio::test]
async fn rejected_update_not_persisted() {
    // rejections are logged at warn
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let store = MemoryStore::new();
    let method =
        LocalMethod::new("kel", store.clone(), KelProvider::default()).expect("should create method");

    let full = KelProvider::log("rejected_update", 2).expect("should build log");
    let (_, id) = KelProvider::inception("rejected_update").expect("should build inception");
    let did = method.did(&id);

    method.encounter(&full[..1]).await.expect("should register inception");
    let before = method.resolve(&did).await.expect("should resolve");

    // skips sequence number 1
    let gap = vec![full[0].clone(), full[2].clone()];
    let err = method.encounter(&gap).await.expect_err("should reject");
    assert!(matches!(err, Error::Validation(_)));
    assert_eq!(err.code(), "invalidEvent");

    assert_eq!(method.resolve(&did).await.expect("should resolve"), before);
    assert_eq!(store.read(&id).await.expect("should read"), full[..1]);
}

// Events for another identifier cannot be smuggled into a log.
#[tokio::test]
async fn foreign_event_rejected() {
    let store = MemoryStore::new();
    let registrar = Registrar::new(store.clone(), KelProvider::default());

    let ours = KelProvider::log("ours", 0).expect("should build log");
    let theirs = KelProvider::log("theirs", 1).expect("should build log");
    let (_, id) = KelProvider::inception("ours").expect("should build inception");

    let mixed = vec![ours[0].clone(), theirs[1].clone()];
    let err = registrar.update(&mixed).await.expect_err("should reject");
    assert!(matches!(err, Error::Validation(_)));
    assert!(store.read(&id).await.expect("should read").is_empty());
}

// No identifier can be derived from a malformed first event.
#[tokio::test]
async fn malformed_event() {
    let store = MemoryStore::new();
    let registrar = Registrar::new(store.clone(), KelProvider::default());

    let err = registrar.update(&[Event::from("not an event")]).await.expect_err("should reject");
    assert!(matches!(err, Error::Extraction(_)));
    assert!(store.is_empty());
}

// A failed append surfaces the store's error and resolution is unaffected.
#[tokio::test]
async fn append_failure() {
    let store = FaultyStore::new();
    let method =
        LocalMethod::new("kel", store.clone(), KelProvider::default()).expect("should create method");

    let full = KelProvider::log("append_failure", 1).expect("should build log");
    let (_, id) = KelProvider::inception("append_failure").expect("should build inception");
    method.encounter(&full[..1]).await.expect("should register inception");

    store.fail_appends(true);
    let err = method.encounter(&full).await.expect_err("should fail");
    let Error::Store(source) = &err else {
        panic!("expected store error, got {err:?}");
    };
    assert_eq!(source.to_string(), "disk full");

    store.fail_appends(false);
    let doc = method.resolve(&method.did(&id)).await.expect("should resolve");
    assert_eq!(doc.version_id, 0);
    assert_eq!(store.inner().read(&id).await.expect("should read").len(), 1);
}

// Deleting a log makes the identifier unknown again.
#[tokio::test]
async fn delete_then_resolve() {
    let method = LocalMethod::new("kel", MemoryStore::new(), KelProvider::default())
        .expect("should create method");

    let created = method.create(Seed("delete_then_resolve".into())).await.expect("should create");
    assert!(method.registrar().delete(&created.id).await.expect("should delete"));

    let err = method.resolve(&created.did).await.expect_err("should not resolve");
    assert!(err.is_not_found());

    // idempotent
    assert!(!method.registrar().delete(&created.id).await.expect("should delete"));
}

// Registrars over the same file store, whether sharing a handle or opening
// the directory themselves, never append an event twice.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn registrars_share_store() {
    let dir = tempfile::tempdir().expect("should create temp dir");
    let store = FileStore::new(dir.path());

    for round in 0..10 {
        let seed = format!("registrars_share_store_{round}");
        let full = KelProvider::log(&seed, 1).expect("should build log");
        let (_, id) = KelProvider::inception(&seed).expect("should build inception");
        Registrar::new(store.clone(), KelProvider::default())
            .update(&full[..1])
            .await
            .expect("should register inception");

        let mut tasks = Vec::new();
        for n in 0..8 {
            let store = if n % 2 == 0 { store.clone() } else { FileStore::new(dir.path()) };
            let registrar = Registrar::new(store, KelProvider::default());
            let events = full.clone();
            tasks.push(tokio::spawn(async move { registrar.update(&events).await }));
        }
        for task in tasks {
            let doc = task.await.expect("task should complete").expect("should register");
            assert_eq!(doc.version_id, 1);
        }

        assert_eq!(store.read(&id).await.expect("should read"), full);
    }
}
