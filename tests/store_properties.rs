//! Session store behavior under concurrency and expiry.

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use session_pager::{PagerError, Pruner, PrunerState, SessionStore, StoreConfig, Tags};
use tokio_test::{assert_err, assert_ok};

fn store(ttl: Duration, page_size: usize) -> Arc<SessionStore> {
    Arc::new(SessionStore::with_config(StoreConfig::new(ttl, page_size)))
}

#[test]
fn test_concurrent_creates_yield_distinct_ids() {
    let store = store(Duration::from_secs(60), 10);

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                (0..250)
                    .map(|_| store.create(Tags::empty()).unwrap().id())
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let ids: Vec<_> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();
    let unique: HashSet<_> = ids.iter().copied().collect();

    assert_eq!(ids.len(), 4000);
    assert_eq!(unique.len(), 4000);
    assert_eq!(store.len(), 4000);
}

#[test]
fn test_create_then_get_returns_same_session() {
    let store = store(Duration::from_secs(60), 10);
    let tags = Tags::try_from_pairs([("task", "cpu"), ("level", "debug")]).unwrap();

    let created = store.create(tags.clone()).unwrap();
    let fetched = assert_ok!(store.get(&created.id()));

    assert_eq!(fetched.id(), created.id());
    assert_eq!(fetched.tags(), &tags);
}

#[test]
fn test_page_boundary_with_ten_records() {
    let store = store(Duration::from_secs(60), 10);
    let session = store.create(Tags::empty()).unwrap();
    session.extend((0..10).map(|i| i.to_string())).unwrap();

    assert_eq!(session.get_page(0).unwrap().len(), 10);
    let err = assert_err!(session.get_page(1));
    assert!(matches!(err, PagerError::OutOfRange { page: 1, .. }));

    // An eleventh record starts page 1 but does not complete it.
    session.append("10").unwrap();
    let err = assert_err!(session.get_page(1));
    assert!(matches!(err, PagerError::OutOfRange { page: 1, available: 11 }));

    session.finish().unwrap();
    assert_eq!(session.get_page(1).unwrap().len(), 1);
    assert!(session.get_page(2).unwrap().is_empty());
    assert_err!(session.get_page(3));
}

#[tokio::test]
async fn test_session_expires_after_ttl_and_prune() {
    let store = store(Duration::from_secs(1), 10);
    let session = store.create(Tags::empty()).unwrap();
    let id = session.id();
    drop(session);

    assert_ok!(store.get(&id));

    tokio::time::sleep(Duration::from_millis(1100)).await;
    assert_eq!(store.prune().unwrap(), 1);

    let err = assert_err!(store.get(&id));
    assert!(matches!(err, PagerError::NotFound(_)));
}

#[test]
fn test_duplicate_tags_create_nothing() {
    let store = store(Duration::from_secs(60), 10);
    store.create(Tags::empty()).unwrap();

    let result = Tags::try_from_pairs([("node", "a"), ("node", "b")])
        .and_then(|tags| store.create(tags));

    assert!(matches!(result, Err(PagerError::InvalidRequest(_))));
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn test_pruner_stop_twice() {
    let pruner = Pruner::spawn(store(Duration::from_secs(1), 10), Duration::from_millis(5));
    tokio::time::sleep(Duration::from_millis(20)).await;

    pruner.stop();
    pruner.stop();
    pruner.shutdown().await;
    assert_eq!(pruner.state(), PrunerState::Stopped);
}

#[tokio::test]
async fn test_stop_after_task_exited() {
    let pruner = Pruner::spawn(store(Duration::from_secs(1), 10), Duration::from_millis(5));
    pruner.shutdown().await;

    // The loop is gone; stopping again must still return immediately.
    tokio::time::timeout(Duration::from_secs(1), async {
        pruner.stop();
        pruner.shutdown().await;
    })
    .await
    .unwrap();
}

#[test]
fn test_concurrent_create_get_prune() {
    // Live sessions outlast the test; short-lived ones expire almost at once.
    let live = store(Duration::from_secs(600), 10);
    let short = store(Duration::from_millis(1), 10);

    let mut handles = Vec::new();
    for _ in 0..8 {
        let live = Arc::clone(&live);
        let short = Arc::clone(&short);
        handles.push(thread::spawn(move || {
            for _ in 0..200 {
                let kept = live.create(Tags::empty()).unwrap();
                assert!(live.get(&kept.id()).is_ok());

                short.create(Tags::empty()).unwrap();
                live.prune().unwrap();
                short.prune().unwrap();

                assert!(live.get(&kept.id()).is_ok());
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(live.len(), 8 * 200);
    for id in live.ids().unwrap() {
        assert!(live.get(&id).is_ok());
    }

    thread::sleep(Duration::from_millis(5));
    short.prune().unwrap();
    assert!(short.is_empty());
}

#[test]
fn test_readers_never_see_partial_batches() {
    let store = store(Duration::from_secs(60), 4);
    let session = store.create(Tags::empty()).unwrap();

    let writer = {
        let session = Arc::clone(&session);
        thread::spawn(move || {
            for batch in 0..500 {
                let records: Vec<String> = (0..4).map(|i| format!("{}-{}", batch, i)).collect();
                session.extend(records).unwrap();
            }
            session.finish().unwrap();
        })
    };

    let reader = {
        let session = Arc::clone(&session);
        thread::spawn(move || {
            while !session.is_finished() {
                let next = session.page();
                if next == 0 {
                    continue;
                }
                let page = session.get_page(next as i64 - 1).unwrap();
                assert_eq!(page.len(), 4);
            }
        })
    };

    writer.join().unwrap();
    reader.join().unwrap();
    assert_eq!(session.len(), 2000);
}
