//! Completion barrier E2E tests.
//!
//! Full, resumed, and targeted runs can share one coordinator; its callback
//! fires once, after the last of them ends.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use pretty_assertions::assert_eq;

use e2e_tests::TestHarness;
use media_indexing::{
    BatchIndexer, CompletionCoordinator, IndexerConfig, MemoryIndexClient, ReconciliationDriver,
    TargetedIndexer, WorkQueue,
};

struct Indexers {
    batch: BatchIndexer,
    targeted: TargetedIndexer,
    driver: ReconciliationDriver,
}

fn indexers(harness: &TestHarness, client: &Arc<MemoryIndexClient>) -> Indexers {
    let store = harness.store();
    let queue = WorkQueue::spawn();
    let config = IndexerConfig::default().with_batch_size(3);
    let batch = BatchIndexer::new(store.clone(), client.clone(), queue.clone(), config.clone());
    let targeted = TargetedIndexer::new(store, client.clone(), queue.clone(), config);
    let driver = ReconciliationDriver::new(client.clone(), batch.clone(), queue);
    Indexers {
        batch,
        targeted,
        driver,
    }
}

#[tokio::test]
async fn test_fires_once_after_all_triggers() {
    let harness = TestHarness::new(10);
    let client = Arc::new(MemoryIndexClient::new());
    let indexers = indexers(&harness, &client);

    let coordinator = CompletionCoordinator::new();
    indexers.batch.run_from(0, Some(&coordinator));
    indexers.driver.reconcile(Some(&coordinator));
    indexers
        .targeted
        .run_for(["photo-01", "photo-08"], 0, Some(&coordinator));
    assert_eq!(coordinator.pending(), 3);

    let fired = Arc::new(AtomicUsize::new(0));
    let observed_docs = Arc::new(AtomicUsize::new(0));
    {
        let fired = fired.clone();
        let observed_docs = observed_docs.clone();
        let client = client.clone();
        coordinator.on_complete(move || {
            fired.fetch_add(1, Ordering::SeqCst);
            observed_docs.store(client.document_count(), Ordering::SeqCst);
        });
    }

    coordinator.wait().await;

    assert_eq!(fired.load(Ordering::SeqCst), 1);
    assert_eq!(observed_docs.load(Ordering::SeqCst), 10);
    assert_eq!(coordinator.pending(), 0);
}

#[tokio::test]
async fn test_zero_triggers_fire_on_registration() {
    let coordinator = CompletionCoordinator::new();
    let fired = Arc::new(AtomicUsize::new(0));
    let counter = fired.clone();
    coordinator.on_complete(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    assert_eq!(fired.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_failed_run_still_releases_barrier() {
    let harness = TestHarness::new(10);
    let client = Arc::new(MemoryIndexClient::new());
    client.fail_commits_after(2);
    let indexers = indexers(&harness, &client);

    let coordinator = CompletionCoordinator::new();
    indexers.batch.run_from(0, Some(&coordinator));
    indexers.targeted.run_for(["photo-09"], 0, Some(&coordinator));
    coordinator.wait().await;

    assert_eq!(client.committed_markers(), vec![3, 6]);
    assert!(client.document("photo-09").is_some());
}

#[tokio::test]
async fn test_queue_shutdown_releases_barrier() {
    let harness = TestHarness::new(10);
    let client = Arc::new(MemoryIndexClient::new());
    let queue = WorkQueue::spawn();
    queue.shutdown();

    let stalled = BatchIndexer::new(
        harness.store(),
        client.clone(),
        queue.clone(),
        IndexerConfig::default(),
    );
    while !queue.is_closed() {
        tokio::task::yield_now().await;
    }

    let coordinator = CompletionCoordinator::new();
    stalled.run_from(0, Some(&coordinator));
    coordinator.wait().await;

    assert!(client.committed_markers().is_empty());
}
