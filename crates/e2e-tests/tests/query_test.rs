//! Lookup and search E2E tests.

use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde_json::json;

use e2e_tests::{expected_thumbnail, memory_library, TestHarness};
use media_indexing::MemoryIndexClient;
use media_service::{MediaLibrary, QueryEvent};

fn gallery() -> Vec<serde_json::Value> {
    vec![
        json!({"identifier": "p3", "name": "Lighthouse", "description": "Coastal storm"}),
        json!({"identifier": "p1", "name": "Coast road", "rating": 5}),
        json!({"identifier": "p2", "name": "Coast road", "description": "Second take"}),
        json!({"identifier": "p4", "name": "Meadow", "description": "Wild flowers"}),
    ]
}

#[tokio::test]
async fn test_lookup_miss_is_none() {
    let harness = TestHarness::with_records(&gallery());
    let client = Arc::new(MemoryIndexClient::new());
    let library = memory_library(harness.store(), &client, 6, false);

    assert!(library.lookup("nonexistent").is_none());
    assert!(library.item_data("nonexistent").is_none());
    assert!(library.thumbnail_path("nonexistent").is_none());

    let item = library.lookup("p4").unwrap();
    assert_eq!(item.name, "Meadow");
    assert_eq!(library.item_data("p4").unwrap(), b"Wild flowers".to_vec());
    assert_eq!(
        library.thumbnail_path("p4").unwrap(),
        expected_thumbnail(&harness.thumbnail_dir, "p4")
    );
}

#[tokio::test]
async fn test_results_sorted_by_name_then_identifier() {
    let harness = TestHarness::with_records(&gallery());
    let library = MediaLibrary::open(&harness.settings(6)).unwrap();
    library.wait_for_startup().await;

    let items = library.search_session().search("coast").completed().await.unwrap();
    let ids: Vec<&str> = items.iter().map(|i| i.identifier.as_str()).collect();
    assert_eq!(ids, vec!["p1", "p2", "p3"]);
}

#[tokio::test]
async fn test_found_pages_precede_completion() {
    let harness = TestHarness::new(25);
    let client = Arc::new(MemoryIndexClient::new());
    let library = memory_library(harness.store(), &client, 6, true);
    library.wait_for_startup().await;

    let session = library.search_session();
    let mut query = session.search("frame");
    let mut events = Vec::new();
    while let Some(event) = query.next_event().await {
        events.push(event);
    }

    let pages: Vec<usize> = events
        .iter()
        .filter_map(|event| match event {
            QueryEvent::Found(items) => Some(items.len()),
            QueryEvent::Completed(_) => None,
        })
        .collect();
    assert_eq!(pages, vec![10, 10, 5]);
    match events.last() {
        Some(QueryEvent::Completed(items)) => assert_eq!(items.len(), 25),
        other => panic!("expected completion last, got {other:?}"),
    }
}

#[tokio::test]
async fn test_second_query_cancels_first() {
    let harness = TestHarness::new(25);
    let client = Arc::new(MemoryIndexClient::new());
    let library = memory_library(harness.store(), &client, 6, true);
    library.wait_for_startup().await;

    let session = library.search_session();
    let mut first = session.search("frame");
    let second = session.search("photo 07");

    assert!(first.is_cancelled());
    assert!(first.next_event().await.is_none());

    let items = second.completed().await.unwrap();
    let ids: Vec<&str> = items.iter().map(|i| i.identifier.as_str()).collect();
    assert_eq!(ids, vec!["photo-07"]);
}

#[tokio::test]
async fn test_query_before_indexing_finds_nothing() {
    let harness = TestHarness::new(5);
    let client = Arc::new(MemoryIndexClient::new());
    let library = memory_library(harness.store(), &client, 6, false);

    let items = library.search_session().search("frame").completed().await.unwrap();
    assert!(items.is_empty());
}
