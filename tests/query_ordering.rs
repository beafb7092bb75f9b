//! Last-writer-wins ordering when filter changes overlap.

mod common;

use std::time::Duration;

use common::{Route, StubServer};
use futures::StreamExt;
use futures::stream::FuturesUnordered;
use pathwise::loader::{Catalog, QuerySequencer};
use pathwise::models::{Config, ContentItem, ContentKind};
use serde_json::json;

/// "a" is slow, "ab" is fast, so "ab" settles first.
async fn search_server() -> StubServer {
    StubServer::start([
        (
            "GET /api/careers?search=a",
            Route::json(200, json!({ "careers": { "Actuary": {} } }))
                .delayed(Duration::from_millis(300)),
        ),
        (
            "GET /api/careers?search=ab",
            Route::json(200, json!({ "careers": { "Lab Technician": {} } })),
        ),
    ])
    .await
}

fn catalog(server: &StubServer) -> Catalog {
    let mut config = Config::default();
    config.api.base_url = server.url();
    config.api.static_base = tempfile::tempdir().unwrap().path().display().to_string();
    config.api.timeout_ms = 2000;
    Catalog::from_config(&config).unwrap()
}

fn names(items: &[ContentItem]) -> Vec<String> {
    items.iter().map(|i| i.display_name().to_string()).collect()
}

#[tokio::test]
async fn stale_result_is_discarded() {
    let server = search_server().await;
    let catalog = catalog(&server);
    let sequencer = QuerySequencer::new();

    let query_a = catalog.query(ContentKind::Careers).with_filter("search", "a");
    let query_ab = catalog.query(ContentKind::Careers).with_filter("search", "ab");
    let ticket_a = sequencer.issue();
    let ticket_ab = sequencer.issue();

    let mut pending = FuturesUnordered::new();
    for (ticket, query) in [(ticket_a, &query_a), (ticket_ab, &query_ab)] {
        let catalog = &catalog;
        pending.push(async move {
            let result = catalog.load(query).await;
            ticket.stamp(result)
        });
    }

    // Apply each result as it settles, the way a page would.
    let mut arrivals = Vec::new();
    let mut displayed = Vec::new();
    while let Some(result) = pending.next().await {
        arrivals.push(result.seq);
        if let Some(result) = sequencer.accept(result) {
            displayed = names(&result.items);
        }
    }

    assert!(arrivals[0] > arrivals[1], "the older search settles last");
    assert_eq!(displayed, ["Lab Technician"]);
}

#[tokio::test]
async fn superseded_load_is_abandoned() {
    let server = search_server().await;
    let catalog = catalog(&server);
    let sequencer = QuerySequencer::new();

    let query_a = catalog.query(ContentKind::Careers).with_filter("search", "a");
    let query_ab = catalog.query(ContentKind::Careers).with_filter("search", "ab");

    let ticket_a = sequencer.issue();
    let slow = {
        let catalog = catalog.clone();
        tokio::spawn(async move { catalog.load_latest(ticket_a, &query_a).await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    let ticket_ab = sequencer.issue();
    let fresh = catalog.load_latest(ticket_ab, &query_ab).await.unwrap();
    let stale = tokio::time::timeout(Duration::from_millis(200), slow)
        .await
        .unwrap()
        .unwrap();

    assert!(stale.is_none());
    assert!(sequencer.is_latest(fresh.seq));
    assert_eq!(names(&fresh.value.items), ["Lab Technician"]);
}
